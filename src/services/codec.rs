// src/services/codec.rs
// DOCUMENTATION: Binary encoding of search configs
// PURPOSE: Store arbitrary query configs without a schema migration per field

use crate::errors::JobError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Encode a search config as FlexBuffers
/// DOCUMENTATION: FlexBuffers is self-describing, so nested maps, sequences
/// and scalars survive without a fixed schema on either side. Map keys are
/// stored NUL-terminated, so keys containing `\0` are rejected up front.
pub fn encode_search_config<T: Serialize + ?Sized>(config: &T) -> Result<Vec<u8>, JobError> {
    let shape = serde_json::to_value(config).map_err(|e| JobError::Encoding(e.to_string()))?;
    if let Some(key) = find_nul_key(&shape) {
        return Err(JobError::Encoding(format!(
            "map key {:?} contains a NUL character",
            key
        )));
    }

    flexbuffers::to_vec(config).map_err(|e| JobError::Encoding(e.to_string()))
}

fn find_nul_key(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => map.iter().find_map(|(key, nested)| {
            if key.contains('\0') {
                Some(key.as_str())
            } else {
                find_nul_key(nested)
            }
        }),
        Value::Array(items) => items.iter().find_map(find_nul_key),
        _ => None,
    }
}

/// Decode a stored search config
pub fn decode_search_config<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, JobError> {
    flexbuffers::from_slice(bytes).map_err(|e| JobError::Decoding(e.to_string()))
}

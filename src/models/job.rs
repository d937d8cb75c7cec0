// src/models/job.rs
// DOCUMENTATION: Core data structures for search jobs
// PURPOSE: Status codes, stored job rows and API DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use std::fmt;

use crate::errors::JobError;
use crate::services::codec::decode_search_config;

/// Lifecycle status of a search job as stored in the jobs table
/// DOCUMENTATION: Codes are shared with the external search workers and must
/// not be renumbered. Only `Cancelling` is ever written by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelling,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Pending,
        JobStatus::Running,
        JobStatus::Succeeded,
        JobStatus::Failed,
        JobStatus::Cancelling,
        JobStatus::Cancelled,
    ];

    /// Raw code persisted in the `status` column
    pub fn code(self) -> i16 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Running => 1,
            JobStatus::Succeeded => 2,
            JobStatus::Failed => 3,
            JobStatus::Cancelling => 4,
            JobStatus::Cancelled => 5,
        }
    }

    /// Decode a raw status code, `None` for codes this build does not know
    pub fn from_code(code: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Whether the job has not reached a final outcome yet
    pub fn is_waiting(self) -> bool {
        matches!(
            self,
            JobStatus::Pending | JobStatus::Running | JobStatus::Cancelling
        )
    }

    pub fn is_terminal(self) -> bool {
        !self.is_waiting()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
            JobStatus::Cancelling => "CANCELLING",
            JobStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of statuses the coordinator keeps polling on
/// DOCUMENTATION: Defaults to every status whose `is_waiting()` is true.
/// Deployments whose workers introduce extra intermediate states can widen it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingStates {
    codes: Vec<i16>,
}

impl WaitingStates {
    pub fn new(statuses: impl IntoIterator<Item = JobStatus>) -> Self {
        Self::from_codes(statuses.into_iter().map(JobStatus::code))
    }

    /// Build from raw codes, for worker states this enumeration does not name
    pub fn from_codes(codes: impl IntoIterator<Item = i16>) -> Self {
        let mut codes: Vec<i16> = codes.into_iter().collect();
        codes.sort_unstable();
        codes.dedup();
        Self { codes }
    }

    pub fn contains(&self, code: i16) -> bool {
        self.codes.binary_search(&code).is_ok()
    }

    pub fn codes(&self) -> &[i16] {
        &self.codes
    }
}

impl Default for WaitingStates {
    fn default() -> Self {
        Self::new(JobStatus::ALL.into_iter().filter(|s| s.is_waiting()))
    }
}

/// Represents a search job row from the database
/// DOCUMENTATION: `search_config` holds the FlexBuffers-encoded query config
#[derive(Debug, Clone, FromRow)]
pub struct SearchJob {
    /// Store-assigned identifier
    pub id: i64,

    /// Raw status code, see `JobStatus`
    pub status: i16,

    /// Encoded search config, written once at submission
    pub search_config: Vec<u8>,

    /// When the job was submitted
    pub creation_time: DateTime<Utc>,
}

impl SearchJob {
    #[allow(dead_code)]
    pub fn job_status(&self) -> Option<JobStatus> {
        JobStatus::from_code(self.status)
    }

    /// Convert database row into API response DTO
    pub fn to_response(&self) -> Result<SearchJobResponse, JobError> {
        Ok(SearchJobResponse {
            job_id: self.id,
            status: status_label(self.status),
            code: self.status,
            search_config: decode_search_config(&self.search_config)?,
            creation_time: self.creation_time,
        })
    }
}

/// Display name for a raw status code
pub fn status_label(code: i16) -> String {
    JobStatus::from_code(code)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|| format!("UNKNOWN({})", code))
}

/// Response for POST /jobs
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    pub job_id: i64,
}

/// Response for GET /jobs/{id}/status and the wait endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: i64,
    pub status: String,
    pub code: i16,
}

/// Response for GET /jobs/{id}
#[derive(Debug, Serialize)]
pub struct SearchJobResponse {
    pub job_id: i64,
    pub status: String,
    pub code: i16,
    pub search_config: Value,
    pub creation_time: DateTime<Utc>,
}

/// Query parameters for POST /jobs/{id}/cancel
#[derive(Debug, Default, Deserialize)]
pub struct CancelJobQuery {
    /// Only cancel if the job has not been picked up by a worker yet
    #[serde(default)]
    pub only_pending: bool,
}

/// Response for POST /jobs/{id}/cancel
#[derive(Debug, Serialize, Deserialize)]
pub struct CancelJobResponse {
    pub job_id: i64,
    /// Whether the cancellation request was recorded
    pub requested: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for status in JobStatus::ALL {
            assert_eq!(JobStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(JobStatus::from_code(42), None);
        assert_eq!(JobStatus::from_code(-1), None);
    }

    #[test]
    fn test_status_codes_are_unique() {
        let mut codes: Vec<i16> = JobStatus::ALL.iter().map(|s| s.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), JobStatus::ALL.len());
    }

    #[test]
    fn test_waiting_and_terminal_partition() {
        let waiting: Vec<JobStatus> = JobStatus::ALL
            .into_iter()
            .filter(|s| s.is_waiting())
            .collect();
        assert_eq!(
            waiting,
            vec![JobStatus::Pending, JobStatus::Running, JobStatus::Cancelling]
        );
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_default_waiting_states() {
        let states = WaitingStates::default();
        assert!(states.contains(JobStatus::Pending.code()));
        assert!(states.contains(JobStatus::Running.code()));
        assert!(states.contains(JobStatus::Cancelling.code()));
        assert!(!states.contains(JobStatus::Succeeded.code()));
        assert!(!states.contains(JobStatus::Cancelled.code()));
        assert!(!states.contains(99));
    }

    #[test]
    fn test_waiting_states_from_raw_codes() {
        let states = WaitingStates::from_codes([4, 0, 1, 0, 9]);
        assert_eq!(states.codes(), &[0, 1, 4, 9]);
        assert!(states.contains(9));
    }

    #[test]
    fn test_status_label_for_unknown_code() {
        assert_eq!(status_label(2), "SUCCEEDED");
        assert_eq!(status_label(17), "UNKNOWN(17)");
    }
}

// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod codec;
pub mod coordinator;
pub mod pool_manager;

pub use coordinator::*;
pub use pool_manager::*;

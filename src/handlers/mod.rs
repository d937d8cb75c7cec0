// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components

pub mod health;
pub mod jobs;

pub use health::config as health_config;
pub use jobs::config as jobs_config;

// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export database components

pub mod job_repository;
#[cfg(test)]
pub mod memory_repository;

pub use job_repository::*;
#[cfg(test)]
pub use memory_repository::*;

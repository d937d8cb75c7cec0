// src/config/mod.rs
// DOCUMENTATION: Configuration module organization
// PURPOSE: Re-export configuration components

pub mod db;
pub mod env;

#[cfg(test)]
pub(crate) use db::test_db_config;
pub use db::{init_db_pool, DbConfig, TableNames};
pub use env::Config;

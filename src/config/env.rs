// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate configuration from .env files

use crate::config::db::{DbConfig, TableNames};
use crate::models::{JobStatus, WaitingStates};
use crate::services::CoordinatorSettings;
use dotenv::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at application startup
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL host
    pub db_host: String,

    /// PostgreSQL port (default 5432)
    pub db_port: u16,

    /// Database holding the jobs table
    pub db_name: String,

    pub db_user: String,

    pub db_password: String,

    /// Maximum connections in database pool (default 2)
    pub db_max_connections: u32,

    /// Idle connection timeout in seconds
    pub db_idle_timeout: u64,

    /// Connection timeout in seconds
    pub db_connection_timeout: u64,

    /// Name of the search jobs table
    pub search_jobs_table: String,

    /// Delay between status polls in milliseconds
    pub job_poll_interval_ms: u64,

    /// Comma-separated raw status codes treated as waiting, on top of the defaults
    pub extra_waiting_status_codes: String,

    /// Create the jobs table at start-up if it is missing
    pub create_tables: bool,

    /// Server bind address (e.g., "127.0.0.1")
    pub server_address: String,

    /// Server listen port (default 8003)
    pub server_port: u16,

    /// Environment: development, staging, production
    pub environment: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment
    /// Called once at application startup
    pub fn from_env() -> Self {
        // Load .env file if it exists
        dotenv().ok();

        Config {
            db_host: env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),

            db_port: parse_var("DB_PORT", 5432),

            db_name: env::var("DB_NAME").unwrap_or_else(|_| "search".to_string()),

            db_user: env::var("DB_USER").unwrap_or_else(|_| "search".to_string()),

            db_password: env::var("DB_PASSWORD").unwrap_or_default(),

            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 2),

            db_idle_timeout: parse_var("DB_IDLE_TIMEOUT", 60),

            db_connection_timeout: parse_var("DB_CONNECTION_TIMEOUT", 30),

            search_jobs_table: env::var("SEARCH_JOBS_TABLE")
                .unwrap_or_else(|_| "search_jobs".to_string()),

            job_poll_interval_ms: parse_var("JOB_POLL_INTERVAL_MS", 500),

            extra_waiting_status_codes: env::var("EXTRA_WAITING_STATUS_CODES")
                .unwrap_or_default(),

            create_tables: parse_var("CREATE_TABLES", false),

            server_address: env::var("SERVER_ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_string()),

            server_port: parse_var("SERVER_PORT", 8003),

            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Validate critical configuration
    /// DOCUMENTATION: Ensures application can start safely
    pub fn validate(&self) -> Result<(), String> {
        if self.db_host.is_empty() {
            return Err("DB_HOST is required".to_string());
        }

        if self.job_poll_interval_ms == 0 {
            return Err("JOB_POLL_INTERVAL_MS must be greater than 0".to_string());
        }

        self.table_names().validate()?;
        self.extra_waiting_codes()?;

        if self.db_password.is_empty() {
            log::warn!("DB_PASSWORD not configured - relying on trust authentication");
        }

        Ok(())
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            database: self.db_name.clone(),
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            max_connections: self.db_max_connections,
            idle_timeout: Duration::from_secs(self.db_idle_timeout),
            connection_timeout: Duration::from_secs(self.db_connection_timeout),
        }
    }

    pub fn table_names(&self) -> TableNames {
        TableNames {
            search_jobs: self.search_jobs_table.clone(),
        }
    }

    /// Extra waiting codes; terminal statuses can never be waited on
    pub fn extra_waiting_codes(&self) -> Result<Vec<i16>, String> {
        let codes = parse_codes(&self.extra_waiting_status_codes)?;
        if let Some(code) = codes
            .iter()
            .copied()
            .find(|&code| JobStatus::from_code(code).is_some_and(JobStatus::is_terminal))
        {
            return Err(format!(
                "EXTRA_WAITING_STATUS_CODES contains terminal status code {}",
                code
            ));
        }
        Ok(codes)
    }

    pub fn coordinator_settings(&self) -> Result<CoordinatorSettings, String> {
        let defaults = WaitingStates::default();
        let waiting_states = WaitingStates::from_codes(
            defaults
                .codes()
                .iter()
                .copied()
                .chain(self.extra_waiting_codes()?),
        );

        Ok(CoordinatorSettings {
            poll_interval: Duration::from_millis(self.job_poll_interval_ms),
            waiting_states,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_codes(raw: &str) -> Result<Vec<i16>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            code.parse()
                .map_err(|_| format!("`{}` is not a valid status code", code))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_name: "search".to_string(),
            db_user: "search".to_string(),
            db_password: "pw".to_string(),
            db_max_connections: 2,
            db_idle_timeout: 60,
            db_connection_timeout: 30,
            search_jobs_table: "search_jobs".to_string(),
            job_poll_interval_ms: 500,
            extra_waiting_status_codes: String::new(),
            create_tables: false,
            server_address: "127.0.0.1".to_string(),
            server_port: 8003,
            environment: "test".to_string(),
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_validate_rejects_bad_table_name() {
        let mut config = config();
        assert!(config.validate().is_ok());

        config.search_jobs_table = "jobs where 1=1".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let mut config = config();
        config.job_poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derived_db_config() {
        let db = config().db_config();
        assert_eq!(db.max_connections, 2);
        assert_eq!(db.idle_timeout, Duration::from_secs(60));
        assert_eq!(db.connection_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_extra_waiting_codes_extend_defaults() {
        let mut config = config();
        config.extra_waiting_status_codes = "7, 8,".to_string();
        assert!(config.validate().is_ok());

        let settings = config.coordinator_settings().unwrap();
        assert_eq!(settings.poll_interval, Duration::from_millis(500));
        assert_eq!(settings.waiting_states.codes(), &[0, 1, 4, 7, 8]);
    }

    #[test]
    fn test_no_extra_waiting_codes_keeps_defaults() {
        let settings = config().coordinator_settings().unwrap();
        assert_eq!(settings.waiting_states, WaitingStates::default());
    }

    #[test]
    fn test_terminal_codes_cannot_be_waited_on() {
        for terminal in [JobStatus::Succeeded, JobStatus::Failed, JobStatus::Cancelled] {
            let mut config = config();
            config.extra_waiting_status_codes = format!("7,{}", terminal.code());
            assert!(config.validate().is_err(), "{} accepted", terminal);
            assert!(config.coordinator_settings().is_err());
        }
    }

    #[test]
    fn test_malformed_waiting_code_is_rejected() {
        let mut config = config();
        config.extra_waiting_status_codes = "7, x, 8".to_string();
        assert!(config.validate().is_err());
        assert!(config.coordinator_settings().is_err());
    }
}

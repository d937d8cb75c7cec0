// src/config/db.rs
// DOCUMENTATION: Database connection pool initialization
// PURPOSE: Describe the PostgreSQL target and build the shared connection pool

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::fmt;
use std::time::Duration;
use validator::Validate;

/// Connection settings for the relational store
/// DOCUMENTATION: Built from `Config` at start-up; validated before any
/// connection attempt is made
#[derive(Clone, Validate)]
pub struct DbConfig {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,

    #[validate(length(min = 1))]
    pub database: String,

    #[validate(length(min = 1))]
    pub user: String,

    pub password: String,

    /// Connection ceiling, also used as the idle-connection ceiling
    #[validate(range(min = 1, max = 64))]
    pub max_connections: u32,

    /// How long an idle connection is kept before being closed
    pub idle_timeout: Duration,

    /// Timeout waiting for a connection from the pool
    pub connection_timeout: Duration,
}

impl DbConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

// Keep the password out of logs
impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("max_connections", &self.max_connections)
            .field("idle_timeout", &self.idle_timeout)
            .field("connection_timeout", &self.connection_timeout)
            .finish()
    }
}

/// Names of the tables store-backed components work on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub search_jobs: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            search_jobs: "search_jobs".to_string(),
        }
    }
}

impl TableNames {
    /// Table names are spliced into SQL, so only plain identifiers are accepted
    pub fn validate(&self) -> Result<(), String> {
        if !is_sql_identifier(&self.search_jobs) {
            return Err(format!(
                "search jobs table name `{}` is not a valid SQL identifier",
                self.search_jobs
            ));
        }
        Ok(())
    }
}

fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Initialize PostgreSQL connection pool
/// DOCUMENTATION: Small fixed ceiling, idle connections retained up to the same
/// ceiling until `idle_timeout`, connections health-checked before being handed
/// out. Verifies the pool with `SELECT 1` and closes it again on failure so no
/// half-built pool escapes.
pub async fn init_db_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    log::info!(
        "Initializing database pool: {}@{}:{}/{}",
        config.user,
        config.host,
        config.port,
        config.database
    );

    let pool = pool_options(config)
        .connect_with(config.connect_options())
        .await?;

    // Verify connection works
    if let Err(e) = sqlx::query("SELECT 1").execute(&pool).await {
        pool.close().await;
        return Err(e);
    }

    log::info!("Database pool initialized successfully");
    Ok(pool)
}

pub(crate) fn pool_options(config: &DbConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        // Maximum concurrent connections, idle ones included
        .max_connections(config.max_connections)
        .acquire_timeout(config.connection_timeout)
        .idle_timeout(config.idle_timeout)
        // Keep-alive: ping a connection before handing it out
        .test_before_acquire(true)
}

#[cfg(test)]
pub(crate) fn test_db_config() -> DbConfig {
    DbConfig {
        host: "127.0.0.1".to_string(),
        port: 5432,
        database: "search".to_string(),
        user: "search".to_string(),
        password: "secret".to_string(),
        max_connections: 2,
        idle_timeout: Duration::from_secs(60),
        connection_timeout: Duration::from_secs(1),
    }
}

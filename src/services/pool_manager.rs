// src/services/pool_manager.rs
// DOCUMENTATION: Process-wide connection pool lifecycle
// PURPOSE: Own the single shared pool, hand it to dependents, tear everything down once

use crate::config::{init_db_pool, DbConfig, TableNames};
use crate::db::JobRepository;
use crate::errors::PoolError;
use crate::services::{CoordinatorSettings, JobCoordinator};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Mutex;
use validator::Validate;

enum PoolState {
    Uninitialized,
    Ready {
        pool: PgPool,
        coordinator: Arc<JobCoordinator>,
    },
    ShutDown,
}

/// PoolManager: single-assignment holder for the shared pool
/// DOCUMENTATION: Created once in main and passed by reference to whatever
/// needs the pool. The pool may be assigned exactly once; dependents are
/// built after it and released before it is closed.
pub struct PoolManager {
    state: Mutex<PoolState>,
    settings: CoordinatorSettings,
    create_tables: bool,
}

impl PoolManager {
    pub fn new(settings: CoordinatorSettings) -> Self {
        Self {
            state: Mutex::new(PoolState::Uninitialized),
            settings,
            create_tables: false,
        }
    }

    /// Create the jobs table on initialization if it is missing
    pub fn create_tables(mut self, create_tables: bool) -> Self {
        self.create_tables = create_tables;
        self
    }

    /// Connect the pool and initialize the job coordinator on top of it
    /// DOCUMENTATION: Fails with `DoubleInitialization` once a pool has been
    /// assigned (even after shutdown). On connection failure nothing is kept,
    /// so a later call may try again.
    pub async fn initialize(
        &self,
        db_config: &DbConfig,
        table_names: &TableNames,
    ) -> Result<Arc<JobCoordinator>, PoolError> {
        let mut state = self.state.lock().await;
        if !matches!(*state, PoolState::Uninitialized) {
            return Err(PoolError::DoubleInitialization);
        }

        db_config
            .validate()
            .map_err(|e| PoolError::InvalidConfig(e.to_string()))?;
        table_names.validate().map_err(PoolError::InvalidConfig)?;

        let pool = init_db_pool(db_config)
            .await
            .map_err(PoolError::Initialization)?;

        if self.create_tables {
            let repository = JobRepository::new(pool.clone(), &table_names.search_jobs);
            if let Err(e) = repository.ensure_table().await {
                pool.close().await;
                return Err(PoolError::Initialization(e));
            }
        }

        Ok(self.attach(&mut state, pool, table_names))
    }

    /// Adopt an already-built pool instead of connecting one
    /// DOCUMENTATION: Same single-assignment rules as `initialize`
    #[allow(dead_code)]
    pub async fn install(
        &self,
        pool: PgPool,
        table_names: &TableNames,
    ) -> Result<Arc<JobCoordinator>, PoolError> {
        let mut state = self.state.lock().await;
        if !matches!(*state, PoolState::Uninitialized) {
            return Err(PoolError::DoubleInitialization);
        }
        table_names.validate().map_err(PoolError::InvalidConfig)?;

        Ok(self.attach(&mut state, pool, table_names))
    }

    fn attach(
        &self,
        state: &mut PoolState,
        pool: PgPool,
        table_names: &TableNames,
    ) -> Arc<JobCoordinator> {
        let repository = JobRepository::new(pool.clone(), &table_names.search_jobs);
        let coordinator = Arc::new(JobCoordinator::with_settings(
            repository,
            self.settings.clone(),
        ));
        log::info!(
            "Job coordinator ready on table `{}` (poll interval {:?})",
            table_names.search_jobs,
            coordinator.poll_interval()
        );

        *state = PoolState::Ready {
            pool,
            coordinator: coordinator.clone(),
        };
        coordinator
    }

    #[allow(dead_code)]
    pub async fn pool(&self) -> Option<PgPool> {
        match &*self.state.lock().await {
            PoolState::Ready { pool, .. } => Some(pool.clone()),
            _ => None,
        }
    }

    #[allow(dead_code)]
    pub async fn coordinator(&self) -> Option<Arc<JobCoordinator>> {
        match &*self.state.lock().await {
            PoolState::Ready { coordinator, .. } => Some(coordinator.clone()),
            _ => None,
        }
    }

    /// Release dependents, then close the pool
    /// DOCUMENTATION: `PgPool::close` waits for checked-out connections to be
    /// returned before closing them. Safe to call more than once.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, PoolState::ShutDown) {
            PoolState::Ready { pool, coordinator } => {
                coordinator.shutdown();
                drop(coordinator);

                log::info!("Closing database pool");
                pool.close().await;
                log::info!("Database pool closed");
            }
            PoolState::Uninitialized => {
                *state = PoolState::Uninitialized;
            }
            PoolState::ShutDown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_db_config;
    use crate::errors::JobError;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .max_connections(2)
            .connect_lazy_with(test_db_config().connect_options())
    }

    #[tokio::test]
    async fn test_second_initialization_is_rejected() {
        let manager = PoolManager::new(CoordinatorSettings::default());
        let tables = TableNames::default();

        let first = manager.install(lazy_pool(), &tables).await.unwrap();

        let second = manager.install(lazy_pool(), &tables).await;
        assert!(matches!(second, Err(PoolError::DoubleInitialization)));

        let again = manager.initialize(&test_db_config(), &tables).await;
        assert!(matches!(again, Err(PoolError::DoubleInitialization)));

        // the original pool and coordinator are untouched
        let pool = manager.pool().await.unwrap();
        assert!(!pool.is_closed());
        assert!(!first.is_shut_down());
        let current = manager.coordinator().await.unwrap();
        assert!(Arc::ptr_eq(&first, &current));
    }

    #[tokio::test]
    async fn test_failed_connection_leaves_manager_uninitialized() {
        let manager = PoolManager::new(CoordinatorSettings::default());
        let mut config = test_db_config();
        // nothing listens on port 1
        config.port = 1;

        let result = manager.initialize(&config, &TableNames::default()).await;
        assert!(matches!(result, Err(PoolError::Initialization(_))));
        assert!(manager.pool().await.is_none());
        assert!(manager.coordinator().await.is_none());

        // a later attempt is still allowed
        assert!(manager.install(lazy_pool(), &TableNames::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_before_connecting() {
        let manager = PoolManager::new(CoordinatorSettings::default());
        let tables = TableNames {
            search_jobs: "jobs; --".to_string(),
        };

        let result = manager.initialize(&test_db_config(), &tables).await;
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
        assert!(manager.pool().await.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_releases_coordinator_then_closes_pool() {
        let manager = PoolManager::new(CoordinatorSettings::default());
        let coordinator = manager
            .install(lazy_pool(), &TableNames::default())
            .await
            .unwrap();
        let pool = manager.pool().await.unwrap();

        manager.shutdown().await;

        assert!(coordinator.is_shut_down());
        assert!(pool.is_closed());
        assert!(manager.pool().await.is_none());
        assert!(matches!(
            coordinator.submit_query(&serde_json::json!({})).await,
            Err(JobError::ShutDown)
        ));

        // idempotent, and the pool cannot be brought back
        manager.shutdown().await;
        let result = manager.install(lazy_pool(), &TableNames::default()).await;
        assert!(matches!(result, Err(PoolError::DoubleInitialization)));
    }

    #[tokio::test]
    async fn test_shutdown_without_initialization_is_noop() {
        let manager = PoolManager::new(CoordinatorSettings::default());
        manager.shutdown().await;
        assert!(manager
            .install(lazy_pool(), &TableNames::default())
            .await
            .is_ok());
    }
}

// src/services/coordinator.rs
// DOCUMENTATION: Job lifecycle coordination
// PURPOSE: Turn submit/cancel/await requests into store operations and
// interpret stored status codes as caller-facing outcomes

use crate::db::{JobRepository, JobStore};
use crate::errors::JobError;
use crate::models::{status_label, JobStatus, SearchJob, WaitingStates};
use crate::services::codec::encode_search_config;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Tunables handed to the coordinator when the pool manager builds it
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Delay between two status reads while a job is waiting
    pub poll_interval: Duration,
    /// Statuses that keep the wait loop going
    pub waiting_states: WaitingStates,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            waiting_states: WaitingStates::default(),
        }
    }
}

/// Outcome of interpreting one status read
#[derive(Debug, PartialEq, Eq)]
enum Progress {
    Waiting,
    Succeeded,
}

/// JobCoordinator: submit, cancel and await search jobs
/// DOCUMENTATION: Holds no authoritative job state. Everything it reports is
/// read back from the store, so any number of callers may use one instance
/// concurrently for the same or different jobs.
#[derive(Debug)]
pub struct JobCoordinator<S = JobRepository> {
    store: S,
    poll_interval: Duration,
    waiting_states: WaitingStates,
    shutdown: CancellationToken,
}

impl<S: JobStore> JobCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self::with_settings(store, CoordinatorSettings::default())
    }

    pub fn with_settings(store: S, settings: CoordinatorSettings) -> Self {
        Self {
            store,
            poll_interval: settings.poll_interval,
            waiting_states: settings.waiting_states,
            shutdown: CancellationToken::new(),
        }
    }

    #[allow(dead_code)]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Submit a new search job
    /// DOCUMENTATION: Encodes the config and inserts one row. The initial status
    /// is the column default (PENDING). Store errors are returned as-is.
    pub async fn submit_query<T: Serialize + ?Sized>(
        &self,
        search_config: &T,
    ) -> Result<i64, JobError> {
        self.ensure_running()?;
        let payload = encode_search_config(search_config)?;
        let job_id = self.store.insert_job(&payload).await?;
        log::info!("Submitted search job {} ({} byte config)", job_id, payload.len());
        Ok(job_id)
    }

    /// Request cancellation of a job
    /// DOCUMENTATION: Unconditionally writes CANCELLING. The worker executing the
    /// job is responsible for stopping it and writing CANCELLED. A job id that
    /// matches no row is not reported.
    pub async fn submit_query_cancellation(&self, job_id: i64) -> Result<(), JobError> {
        self.ensure_running()?;
        self.store.set_status(job_id, JobStatus::Cancelling).await?;
        log::info!("Requested cancellation of search job {}", job_id);
        Ok(())
    }

    /// Request cancellation only if no worker has picked the job up yet
    /// Returns whether the job was moved to CANCELLING
    pub async fn cancel_if_pending(&self, job_id: i64) -> Result<bool, JobError> {
        self.ensure_running()?;
        let changed = self
            .store
            .set_status_if(job_id, JobStatus::Pending, JobStatus::Cancelling)
            .await?;
        if changed {
            log::info!("Requested cancellation of pending search job {}", job_id);
        } else {
            log::info!(
                "Search job {} is no longer pending, cancellation not requested",
                job_id
            );
        }
        Ok(changed)
    }

    /// Current raw status code, `None` when the job does not exist
    pub async fn job_status(&self, job_id: i64) -> Result<Option<i16>, JobError> {
        self.ensure_running()?;
        Ok(self.store.fetch_status(job_id).await?)
    }

    pub async fn fetch_job(&self, job_id: i64) -> Result<Option<SearchJob>, JobError> {
        self.ensure_running()?;
        Ok(self.store.fetch_job(job_id).await?)
    }

    /// Block until the job reaches a terminal status
    /// DOCUMENTATION: Polls every `poll_interval` with no overall deadline.
    /// Callers wanting one use `await_job_completion_with_cancel` or drop the
    /// future; neither writes to the store.
    pub async fn await_job_completion(&self, job_id: i64) -> Result<(), JobError> {
        self.await_job_completion_with_cancel(job_id, &CancellationToken::new())
            .await
    }

    /// Same as `await_job_completion`, giving up with `WaitAbandoned` once
    /// `cancel` fires. The job itself keeps running.
    pub async fn await_job_completion_with_cancel(
        &self,
        job_id: i64,
        cancel: &CancellationToken,
    ) -> Result<(), JobError> {
        let mut last_seen: Option<i16> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(JobError::WaitAbandoned(job_id));
            }
            self.ensure_running()?;

            let code = self
                .store
                .fetch_status(job_id)
                .await
                .map_err(|source| JobError::StatusQuery { job_id, source })?;

            let Some(code) = code else {
                log::warn!("Search job {} disappeared while waiting", job_id);
                return Err(JobError::JobNotFound(job_id));
            };

            if last_seen != Some(code) {
                log::debug!("Search job {} is {}", job_id, status_label(code));
                last_seen = Some(code);
            }

            if self.interpret(job_id, code)? == Progress::Succeeded {
                return Ok(());
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => return Err(JobError::WaitAbandoned(job_id)),
                _ = self.shutdown.cancelled() => return Err(JobError::ShutDown),
            }
        }
    }

    /// Stop accepting work and wake every waiter with `ShutDown`
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            log::info!("Job coordinator shutting down");
            self.shutdown.cancel();
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn ensure_running(&self) -> Result<(), JobError> {
        if self.shutdown.is_cancelled() {
            return Err(JobError::ShutDown);
        }
        Ok(())
    }

    fn interpret(&self, job_id: i64, code: i16) -> Result<Progress, JobError> {
        if self.waiting_states.contains(code) {
            return Ok(Progress::Waiting);
        }

        match JobStatus::from_code(code) {
            Some(JobStatus::Succeeded) => Ok(Progress::Succeeded),
            Some(JobStatus::Cancelled) => {
                log::info!("Search job {} was cancelled", job_id);
                Err(JobError::JobCancelled(job_id))
            }
            _ => {
                log::error!(
                    "Search job {} ended with status {}",
                    job_id,
                    status_label(code)
                );
                Err(JobError::UnexpectedJobStatus { job_id, code })
            }
        }
    }
}

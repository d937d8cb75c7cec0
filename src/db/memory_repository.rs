// src/db/memory_repository.rs
// DOCUMENTATION: In-process job storage
// PURPOSE: Stand-in for the jobs table when exercising the coordinator without PostgreSQL

use crate::db::JobStore;
use crate::models::{JobStatus, SearchJob};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// MemoryJobRepository: jobs kept in a map, ids handed out like BIGSERIAL
/// DOCUMENTATION: `close()` mimics a closed pool, every later call fails with
/// `sqlx::Error::PoolClosed`
#[derive(Debug, Default)]
pub struct MemoryJobRepository {
    jobs: RwLock<BTreeMap<i64, SearchJob>>,
    last_id: AtomicI64,
    closed: AtomicBool,
    status_reads: AtomicUsize,
}

impl MemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Number of `fetch_status` calls served so far
    pub fn status_reads(&self) -> usize {
        self.status_reads.load(Ordering::SeqCst)
    }

    /// Remove a job row, as external retention cleanup would
    pub async fn delete_job(&self, job_id: i64) {
        self.jobs.write().await.remove(&job_id);
    }

    /// Write a raw status code, including codes `JobStatus` does not know
    pub async fn set_status_code(&self, job_id: i64, code: i16) {
        if let Some(job) = self.jobs.write().await.get_mut(&job_id) {
            job.status = code;
        }
    }

    fn check_open(&self) -> Result<(), sqlx::Error> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolClosed);
        }
        Ok(())
    }
}

impl JobStore for MemoryJobRepository {
    async fn insert_job(&self, search_config: &[u8]) -> Result<i64, sqlx::Error> {
        self.check_open()?;
        let mut jobs = self.jobs.write().await;
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        jobs.insert(
            id,
            SearchJob {
                id,
                status: JobStatus::Pending.code(),
                search_config: search_config.to_vec(),
                creation_time: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn set_status(&self, job_id: i64, status: JobStatus) -> Result<(), sqlx::Error> {
        self.check_open()?;
        if let Some(job) = self.jobs.write().await.get_mut(&job_id) {
            job.status = status.code();
        }
        Ok(())
    }

    async fn set_status_if(
        &self,
        job_id: i64,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<bool, sqlx::Error> {
        self.check_open()?;
        match self.jobs.write().await.get_mut(&job_id) {
            Some(job) if job.status == from.code() => {
                job.status = to.code();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn fetch_status(&self, job_id: i64) -> Result<Option<i16>, sqlx::Error> {
        self.check_open()?;
        self.status_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.jobs.read().await.get(&job_id).map(|job| job.status))
    }

    async fn fetch_job(&self, job_id: i64) -> Result<Option<SearchJob>, sqlx::Error> {
        self.check_open()?;
        Ok(self.jobs.read().await.get(&job_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_strictly_increasing() {
        let repo = MemoryJobRepository::new();
        let mut last = 0;
        for _ in 0..5 {
            let id = repo.insert_job(b"cfg").await.unwrap();
            assert!(id > last);
            last = id;
        }
    }

    #[tokio::test]
    async fn test_conditional_update_only_matches_expected_status() {
        let repo = MemoryJobRepository::new();
        let id = repo.insert_job(b"cfg").await.unwrap();

        let changed = repo
            .set_status_if(id, JobStatus::Running, JobStatus::Cancelling)
            .await
            .unwrap();
        assert!(!changed);

        let changed = repo
            .set_status_if(id, JobStatus::Pending, JobStatus::Cancelling)
            .await
            .unwrap();
        assert!(changed);
        assert_eq!(
            repo.fetch_status(id).await.unwrap(),
            Some(JobStatus::Cancelling.code())
        );
    }

    #[tokio::test]
    async fn test_closed_repository_fails_fast() {
        let repo = MemoryJobRepository::new();
        repo.close();
        assert!(matches!(
            repo.insert_job(b"cfg").await,
            Err(sqlx::Error::PoolClosed)
        ));
        assert!(matches!(
            repo.fetch_status(1).await,
            Err(sqlx::Error::PoolClosed)
        ));
    }
}

//! Ports for background jobs.
//!
//! Jobs are fire-and-forget: producers do not wait for the result and a
//! failing job is logged, never retried.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by the queue adapter.
    pub enum JobDispatchError {
        /// Queue infrastructure is unavailable.
        Unavailable { message: String } => "job queue is unavailable: {message}",
        /// The job could not be accepted.
        Rejected { message: String } => "job was rejected: {message}",
    }
}

/// Refresh the provider data cached on a user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheProviderDataJob {
    pub user_id: UserId,
}

/// Producer side of the queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: CacheProviderDataJob) -> Result<(), JobDispatchError>;
}

/// Consumer side: executes one job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: CacheProviderDataJob);
}

/// Queue discarding every job; for tests that do not care about jobs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureJobQueue;

#[async_trait]
impl JobQueue for FixtureJobQueue {
    async fn enqueue(&self, job: CacheProviderDataJob) -> Result<(), JobDispatchError> {
        tracing::debug!(user_id = %job.user_id, "fixture queue discarded job");
        Ok(())
    }
}

//! In-process job queue backed by a bounded Tokio channel.
//!
//! [`TokioJobQueue`] is the producer half handed to the domain; the consumer
//! half is driven by [`JobWorker::run`], spawned once at startup. Jobs are
//! lost on shutdown and never retried.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::ports::{CacheProviderDataJob, JobDispatchError, JobHandler, JobQueue};

/// Producer side of the queue.
#[derive(Debug, Clone)]
pub struct TokioJobQueue {
    sender: mpsc::Sender<CacheProviderDataJob>,
}

/// Consumer side of the queue.
pub struct JobWorker {
    receiver: mpsc::Receiver<CacheProviderDataJob>,
}

impl TokioJobQueue {
    /// Create a queue holding at most `capacity` pending jobs.
    pub fn channel(capacity: usize) -> (Self, JobWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, JobWorker { receiver })
    }
}

#[async_trait]
impl JobQueue for TokioJobQueue {
    async fn enqueue(&self, job: CacheProviderDataJob) -> Result<(), JobDispatchError> {
        self.sender.try_send(job).map_err(|err| match err {
            mpsc::error::TrySendError::Full(job) => {
                JobDispatchError::rejected(format!("queue full, dropped job for {}", job.user_id))
            }
            mpsc::error::TrySendError::Closed(_) => {
                JobDispatchError::unavailable("job worker has stopped")
            }
        })
    }
}

impl JobWorker {
    /// Process jobs until every producer has been dropped.
    pub async fn run(mut self, handler: Arc<dyn JobHandler>) {
        info!("job worker started");
        while let Some(job) = self.receiver.recv().await {
            debug!(user_id = %job.user_id, "processing cache provider data job");
            handler.handle(job).await;
        }
        warn!("job worker stopped: queue closed");
    }
}

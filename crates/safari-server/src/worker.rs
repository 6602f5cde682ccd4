//! Generation worker.
//!
//! Single consumer that drains the job queue and drives the processor.
//! Generation failures are written onto the request record by the processor
//! and acked here; an `Err` from `process` means infrastructure trouble
//! (store or queue unreachable), so the job is redelivered a bounded number
//! of times.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use safari_core::{ItineraryProcessor, JobQueue, Result};

/// Handler attempts before a job is dropped.
const MAX_ATTEMPTS: i32 = 3;

/// Polling interval when the queue is empty.
const POLL_INTERVAL_MS: u64 = 500;

/// Backoff interval after an infrastructure error.
const ERROR_BACKOFF_MS: u64 = 1000;

pub struct GenerationWorker {
    queue: Arc<dyn JobQueue>,
    processor: Arc<ItineraryProcessor>,
}

impl GenerationWorker {
    pub fn new(queue: Arc<dyn JobQueue>, processor: Arc<ItineraryProcessor>) -> Self {
        Self { queue, processor }
    }

    /// Poll until the shutdown signal flips (blocks until then).
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("generation worker started");

        loop {
            if *shutdown.borrow() {
                info!("generation worker shutting down");
                break;
            }

            match self.process_one().await {
                Ok(true) => {
                    // Handled a job, immediately check for more.
                    continue;
                }
                Ok(false) => {
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)) => {}
                        _ = shutdown.changed() => {
                            if *shutdown.borrow() {
                                info!("generation worker shutting down");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "worker iteration failed");
                    tokio::time::sleep(Duration::from_millis(ERROR_BACKOFF_MS)).await;
                }
            }
        }
    }

    /// Claim and handle one job.
    /// Returns `Ok(true)` if a job was handled, `Ok(false)` on an empty queue.
    pub async fn process_one(&self) -> Result<bool> {
        let Some(job) = self.queue.claim().await? else {
            return Ok(false);
        };

        match self.processor.process(job.request_id).await {
            Ok(outcome) => {
                debug!(request_id = %job.request_id, ?outcome, "job handled");
                self.queue.ack(job.job_id).await?;
            }
            Err(e) => {
                if job.attempts + 1 >= MAX_ATTEMPTS {
                    warn!(
                        request_id = %job.request_id,
                        attempts = job.attempts + 1,
                        error = %e,
                        "dropping job after repeated failures"
                    );
                    self.queue.ack(job.job_id).await?;
                } else {
                    warn!(request_id = %job.request_id, error = %e, "requeueing job");
                    self.queue.requeue(job.job_id, &e.to_string()).await?;
                }
            }
        }

        Ok(true)
    }
}

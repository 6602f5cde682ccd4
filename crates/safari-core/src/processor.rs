//! Itinerary processor: drives one request from RECEIVED to a terminal
//! generation outcome.
//!
//! Correctness rests on two conditional writes: claiming
//! `RECEIVED -> PROCESSING` and committing the terminal state. A racer that
//! loses either write exits as a silent no-op, so at most one generation
//! attempt ever commits per request id.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use safari_types::{Itinerary, RequestStatus};

use crate::error::{PlannerError, Result};
use crate::notify;
use crate::ports::{ItineraryGenerator, Mailer, RequestStore};
use crate::record::{NextState, RequestRecord};

/// Upper bound on one completion call.
const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// What a single `process` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Generation succeeded; the record is COMPLETED.
    Completed,
    /// Generation failed or timed out; the record is FAILED.
    Failed,
    /// Nothing to do: unknown id, already past RECEIVED, or lost a race.
    Skipped,
}

pub struct ItineraryProcessor {
    store: Arc<dyn RequestStore>,
    generator: Arc<dyn ItineraryGenerator>,
    mailer: Arc<dyn Mailer>,
    timeout: Duration,
}

impl ItineraryProcessor {
    pub fn new(
        store: Arc<dyn RequestStore>,
        generator: Arc<dyn ItineraryGenerator>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            store,
            generator,
            mailer,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Advance one request. Duplicate triggers and lost races are silent
    /// no-ops; generation failures land in the record, not in the caller.
    pub async fn process(&self, request_id: Uuid) -> Result<ProcessOutcome> {
        let Some(record) = self.store.load(request_id).await? else {
            debug!(%request_id, "trigger for unknown request, skipping");
            return Ok(ProcessOutcome::Skipped);
        };
        if record.status != RequestStatus::Received {
            debug!(%request_id, status = %record.status, "already past RECEIVED, skipping");
            return Ok(ProcessOutcome::Skipped);
        }

        let Some(record) = self
            .store
            .transition(request_id, RequestStatus::Received, NextState::processing())
            .await?
        else {
            debug!(%request_id, "lost the RECEIVED -> PROCESSING claim, skipping");
            return Ok(ProcessOutcome::Skipped);
        };
        info!(%request_id, "generation started");

        match tokio::time::timeout(self.timeout, self.generator.generate(&record.payload)).await {
            Ok(Ok(itinerary)) => self.complete(&record, itinerary).await,
            Ok(Err(err)) => self.fail(&record, err).await,
            Err(_) => {
                self.fail(&record, PlannerError::UpstreamTimeout(self.timeout.as_secs()))
                    .await
            }
        }
    }

    async fn complete(&self, record: &RequestRecord, itinerary: Itinerary) -> Result<ProcessOutcome> {
        let updated = self
            .store
            .transition(
                record.request_id,
                RequestStatus::Processing,
                NextState::completed(itinerary),
            )
            .await?;
        let Some(updated) = updated else {
            // An administrative cancellation won while generation ran; the
            // recorded state stands and the document is discarded.
            info!(
                request_id = %record.request_id,
                "terminal write lost to a concurrent transition, discarding result"
            );
            return Ok(ProcessOutcome::Skipped);
        };

        let message = notify::completion_email(&updated);
        if let Err(err) = self.mailer.send(&message).await {
            warn!(
                request_id = %updated.request_id,
                error = %err,
                "completion notification failed"
            );
        }
        info!(request_id = %updated.request_id, "itinerary completed");
        Ok(ProcessOutcome::Completed)
    }

    async fn fail(&self, record: &RequestRecord, err: PlannerError) -> Result<ProcessOutcome> {
        warn!(request_id = %record.request_id, error = %err, "generation failed");
        let updated = self
            .store
            .transition(
                record.request_id,
                RequestStatus::Processing,
                NextState::failed(err.to_string()),
            )
            .await?;
        if updated.is_none() {
            info!(
                request_id = %record.request_id,
                "terminal write lost to a concurrent transition"
            );
            return Ok(ProcessOutcome::Skipped);
        }
        Ok(ProcessOutcome::Failed)
    }
}

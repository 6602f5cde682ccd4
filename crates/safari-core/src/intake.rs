//! Request intake: validate, persist, hand off to the processor.

use std::sync::Arc;

use tracing::info;

use safari_types::SafariRequest;

use crate::error::{PlannerError, Result};
use crate::ports::{JobQueue, RequestStore};
use crate::record::RequestRecord;
use crate::validate::validate_payload;

pub struct IntakeService {
    store: Arc<dyn RequestStore>,
    queue: Arc<dyn JobQueue>,
}

impl IntakeService {
    pub fn new(store: Arc<dyn RequestStore>, queue: Arc<dyn JobQueue>) -> Self {
        Self { store, queue }
    }

    /// Accept a new request.
    ///
    /// Returns the stored record with `status = RECEIVED`; the caller never
    /// waits on generation. Nothing is written when validation fails. The
    /// queue hand-off is at-least-once - the processor absorbs duplicates.
    pub async fn submit(&self, payload: SafariRequest) -> Result<RequestRecord> {
        let violations = validate_payload(&payload);
        if !violations.is_empty() {
            return Err(PlannerError::Validation(violations));
        }

        let record = RequestRecord::new(payload);
        self.store.insert(&record).await?;
        self.queue.enqueue(record.request_id).await?;
        info!(
            request_id = %record.request_id,
            email = %record.email,
            "request accepted"
        );
        Ok(record)
    }
}

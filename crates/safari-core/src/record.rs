//! Request records and lifecycle transition targets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use safari_types::{Itinerary, RequestStatus, RequestSummary, SafariRequest, StatusView};

use crate::validate::normalize_email;

/// A stored travel-planning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    pub request_id: Uuid,
    /// Normalized submitter identity; `(email, created_at)` is the search index.
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: RequestStatus,
    pub payload: SafariRequest,
    /// Present if and only if `status == COMPLETED`.
    pub itinerary: Option<Itinerary>,
    /// Present if and only if `status == FAILED`.
    pub error_detail: Option<String>,
}

impl RequestRecord {
    /// Create a freshly received record from a validated payload.
    pub fn new(payload: SafariRequest) -> Self {
        let now = Utc::now();
        Self {
            request_id: Uuid::new_v4(),
            email: normalize_email(&payload.email),
            created_at: now,
            updated_at: now,
            status: RequestStatus::Received,
            payload,
            itinerary: None,
            error_detail: None,
        }
    }

    /// Apply a transition target. Stores call this after the expected-status
    /// precondition has held under their own lock or conditional write.
    pub fn apply(&mut self, next: &NextState) {
        self.status = next.status();
        self.itinerary = next.itinerary().cloned();
        self.error_detail = next.error_detail().map(str::to_string);
        self.updated_at = Utc::now();
    }

    pub fn status_view(&self) -> StatusView {
        StatusView {
            request_id: self.request_id,
            status: self.status,
            email: self.email.clone(),
            start_date: self.payload.travel_dates.start_date,
            end_date: self.payload.travel_dates.end_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
            itinerary: self.itinerary.clone(),
            error_detail: self.error_detail.clone(),
        }
    }

    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            request_id: self.request_id,
            status: self.status,
            start_date: self.payload.travel_dates.start_date,
            end_date: self.payload.travel_dates.end_date,
            created_at: self.created_at,
        }
    }
}

/// Target of a status transition.
///
/// The constructors are the only way to build one, so a record can never end
/// up holding an itinerary outside `COMPLETED` or an error outside `FAILED`.
#[derive(Debug, Clone)]
pub struct NextState {
    status: RequestStatus,
    itinerary: Option<Itinerary>,
    error_detail: Option<String>,
}

impl NextState {
    /// The processor has claimed the record for generation.
    pub fn processing() -> Self {
        Self {
            status: RequestStatus::Processing,
            itinerary: None,
            error_detail: None,
        }
    }

    /// Generation succeeded.
    pub fn completed(itinerary: Itinerary) -> Self {
        Self {
            status: RequestStatus::Completed,
            itinerary: Some(itinerary),
            error_detail: None,
        }
    }

    /// Generation failed or timed out.
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            status: RequestStatus::Failed,
            itinerary: None,
            error_detail: Some(detail.into()),
        }
    }

    /// Administrative cancellation. Clears any generated itinerary: the
    /// document is tied to `COMPLETED` exactly.
    pub fn cancelled() -> Self {
        Self {
            status: RequestStatus::Cancelled,
            itinerary: None,
            error_detail: None,
        }
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn itinerary(&self) -> Option<&Itinerary> {
        self.itinerary.as_ref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }
}

//! Collaborator port traits.
//!
//! Services depend only on these traits. In-memory implementations live in
//! [`crate::memory`]; the Postgres adapters live in the safari-postgres
//! crate. Every store mutation is a single-record conditional write so
//! concurrent invocations linearize without any global lock.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use safari_types::{Itinerary, RequestStatus, SafariRequest};

use crate::challenge::VerificationChallenge;
use crate::error::Result;
use crate::record::{NextState, RequestRecord};

// ── Request store ─────────────────────────────────────────────

/// Durable keyed storage for request records, with a range-queryable
/// secondary index over `(email, created_at)`.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Insert a fresh record. Fails if the id already exists.
    async fn insert(&self, record: &RequestRecord) -> Result<()>;

    async fn load(&self, request_id: Uuid) -> Result<Option<RequestRecord>>;

    /// Conditionally apply `next` iff the stored status still equals
    /// `expected` at write time. Returns the updated record, or `None` when
    /// the precondition no longer holds (row gone or status moved on).
    /// Callers treat `None` as losing a race, never as an error.
    async fn transition(
        &self,
        request_id: Uuid,
        expected: RequestStatus,
        next: NextState,
    ) -> Result<Option<RequestRecord>>;

    /// Fetch up to `query.limit` records for one email, ascending by
    /// `(created_at, request_id)`, strictly after the cursor if given.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<RequestRecord>>;
}

/// Parameters for the `(email, created_at)` index scan.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Normalized submitter identity; results are scoped strictly to it.
    pub email: String,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_to: Option<DateTime<Utc>>,
    pub cursor: Option<SearchCursor>,
    pub limit: usize,
}

/// Keyset cursor over `(created_at, request_id)`. Travels as an opaque
/// base64url token so clients cannot depend on its contents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCursor {
    pub created_at: DateTime<Utc>,
    pub request_id: Uuid,
}

impl SearchCursor {
    pub fn after(record: &RequestRecord) -> Self {
        Self {
            created_at: record.created_at,
            request_id: record.request_id,
        }
    }

    pub fn encode(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn decode(token: &str) -> anyhow::Result<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(token.trim())?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

// ── Challenge store ───────────────────────────────────────────

/// Durable keyed storage for verification challenges, keyed by email.
/// Each mutating method is conditional on the row still being in the state
/// the protocol expects, which is what makes codes and proofs single-use
/// under concurrency.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Insert or replace the challenge row for its email.
    async fn put(&self, challenge: &VerificationChallenge) -> Result<()>;

    async fn load(&self, email: &str) -> Result<Option<VerificationChallenge>>;

    /// Decrement `attempts_remaining` iff the challenge is unconsumed and
    /// still has attempts left. Returns the new value, `None` otherwise.
    async fn record_failed_attempt(&self, email: &str) -> Result<Option<u32>>;

    /// Mark consumed and attach the proof iff the stored code matches and
    /// the challenge is unconsumed and unexpired. Returns whether this
    /// caller won the write.
    async fn consume(
        &self,
        email: &str,
        code: &str,
        proof_token: &str,
        proof_expires_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Mark the proof redeemed iff `token` matches the consumed challenge's
    /// unredeemed, unexpired proof. Returns whether this caller won.
    async fn redeem_proof(&self, email: &str, token: &str) -> Result<bool>;

    /// Drop any challenge row for this email.
    async fn delete(&self, email: &str) -> Result<()>;
}

// ── Job queue ─────────────────────────────────────────────────

/// A claimed job handed to the worker loop.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub job_id: i64,
    pub request_id: Uuid,
    /// Completed handler attempts so far (0 on first delivery).
    pub attempts: i32,
}

/// At-least-once hand-off channel from intake to the processor.
///
/// `claim` marks the oldest ready job in flight; `ack` removes it; `requeue`
/// puts it back with the attempt counted. Delivery can repeat after a crash
/// between claim and ack - the processor's idempotence absorbs that.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, request_id: Uuid) -> Result<()>;

    async fn claim(&self) -> Result<Option<QueuedJob>>;

    async fn ack(&self, job_id: i64) -> Result<()>;

    async fn requeue(&self, job_id: i64, error: &str) -> Result<()>;
}

// ── External collaborators ────────────────────────────────────

/// Generative completion collaborator producing the itinerary document.
#[async_trait]
pub trait ItineraryGenerator: Send + Sync {
    async fn generate(&self, request: &SafariRequest) -> Result<Itinerary>;
}

/// An outbound transactional email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Email-sending collaborator. Sends are best-effort throughout the system:
/// callers log failures and keep their result unchanged.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

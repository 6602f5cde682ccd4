//! In-memory port implementations for tests and keyless local runs.
//!
//! Conditional writes take effect under one async mutex per store, giving
//! the same single-record linearization the Postgres adapters get from
//! conditional UPDATEs.

use std::collections::{HashMap, VecDeque};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use safari_types::RequestStatus;

use crate::challenge::VerificationChallenge;
use crate::error::{PlannerError, Result};
use crate::ports::{ChallengeStore, JobQueue, QueuedJob, RequestStore, SearchQuery};
use crate::record::{NextState, RequestRecord};

// ── MemoryRequestStore ────────────────────────────────────────

#[derive(Default)]
pub struct MemoryRequestStore {
    records: Mutex<HashMap<Uuid, RequestRecord>>,
}

impl MemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RequestStore for MemoryRequestStore {
    async fn insert(&self, record: &RequestRecord) -> Result<()> {
        let mut records = self.records.lock().await;
        if records.contains_key(&record.request_id) {
            return Err(PlannerError::Internal(anyhow!(
                "duplicate request id {}",
                record.request_id
            )));
        }
        records.insert(record.request_id, record.clone());
        Ok(())
    }

    async fn load(&self, request_id: Uuid) -> Result<Option<RequestRecord>> {
        Ok(self.records.lock().await.get(&request_id).cloned())
    }

    async fn transition(
        &self,
        request_id: Uuid,
        expected: RequestStatus,
        next: NextState,
    ) -> Result<Option<RequestRecord>> {
        let mut records = self.records.lock().await;
        match records.get_mut(&request_id) {
            Some(record) if record.status == expected => {
                record.apply(&next);
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RequestRecord>> {
        let records = self.records.lock().await;
        let mut hits: Vec<RequestRecord> = records
            .values()
            .filter(|r| r.email == query.email)
            .filter(|r| query.created_from.is_none_or(|from| r.created_at >= from))
            .filter(|r| query.created_to.is_none_or(|to| r.created_at < to))
            .filter(|r| {
                query
                    .cursor
                    .is_none_or(|c| (r.created_at, r.request_id) > (c.created_at, c.request_id))
            })
            .cloned()
            .collect();
        hits.sort_by_key(|r| (r.created_at, r.request_id));
        hits.truncate(query.limit);
        Ok(hits)
    }
}

// ── MemoryChallengeStore ──────────────────────────────────────

#[derive(Default)]
pub struct MemoryChallengeStore {
    challenges: Mutex<HashMap<String, VerificationChallenge>>,
}

impl MemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn put(&self, challenge: &VerificationChallenge) -> Result<()> {
        self.challenges
            .lock()
            .await
            .insert(challenge.email.clone(), challenge.clone());
        Ok(())
    }

    async fn load(&self, email: &str) -> Result<Option<VerificationChallenge>> {
        Ok(self.challenges.lock().await.get(email).cloned())
    }

    async fn record_failed_attempt(&self, email: &str) -> Result<Option<u32>> {
        let mut challenges = self.challenges.lock().await;
        match challenges.get_mut(email) {
            Some(c) if !c.consumed && c.attempts_remaining > 0 => {
                c.attempts_remaining -= 1;
                Ok(Some(c.attempts_remaining))
            }
            _ => Ok(None),
        }
    }

    async fn consume(
        &self,
        email: &str,
        code: &str,
        proof_token: &str,
        proof_expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut challenges = self.challenges.lock().await;
        match challenges.get_mut(email) {
            Some(c) if !c.consumed && c.code == code && !c.is_expired(Utc::now()) => {
                c.consumed = true;
                c.proof_token = Some(proof_token.to_string());
                c.proof_expires_at = Some(proof_expires_at);
                c.proof_redeemed = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn redeem_proof(&self, email: &str, token: &str) -> Result<bool> {
        let mut challenges = self.challenges.lock().await;
        match challenges.get_mut(email) {
            Some(c)
                if c.consumed
                    && !c.proof_redeemed
                    && c.proof_token.as_deref() == Some(token)
                    && c.proof_expires_at.is_some_and(|t| Utc::now() < t) =>
            {
                c.proof_redeemed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, email: &str) -> Result<()> {
        self.challenges.lock().await.remove(email);
        Ok(())
    }
}

// ── MemoryJobQueue ────────────────────────────────────────────

#[derive(Default)]
struct QueueInner {
    next_id: i64,
    ready: VecDeque<QueuedJob>,
    claimed: HashMap<i64, QueuedJob>,
}

#[derive(Default)]
pub struct MemoryJobQueue {
    inner: Mutex<QueueInner>,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs waiting for a claim. Test hook.
    pub async fn ready_len(&self) -> usize {
        self.inner.lock().await.ready.len()
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn enqueue(&self, request_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let job = QueuedJob {
            job_id: inner.next_id,
            request_id,
            attempts: 0,
        };
        inner.ready.push_back(job);
        Ok(())
    }

    async fn claim(&self) -> Result<Option<QueuedJob>> {
        let mut inner = self.inner.lock().await;
        let Some(job) = inner.ready.pop_front() else {
            return Ok(None);
        };
        inner.claimed.insert(job.job_id, job.clone());
        Ok(Some(job))
    }

    async fn ack(&self, job_id: i64) -> Result<()> {
        self.inner.lock().await.claimed.remove(&job_id);
        Ok(())
    }

    async fn requeue(&self, job_id: i64, _error: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if let Some(mut job) = inner.claimed.remove(&job_id) {
            job.attempts += 1;
            inner.ready.push_back(job);
        }
        Ok(())
    }
}

//! One-time email verification challenges and redemption proofs.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An outstanding one-time-code challenge for a single email identity.
///
/// At most one live challenge exists per identity - issuing a new one
/// replaces the old row wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationChallenge {
    pub email: String,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub attempts_remaining: u32,
    /// Set on the first successful validation; the code is then spent.
    pub consumed: bool,
    /// Minted at consumption time, redeemable exactly once.
    pub proof_token: Option<String>,
    pub proof_expires_at: Option<DateTime<Utc>>,
    pub proof_redeemed: bool,
}

impl VerificationChallenge {
    /// Issue a fresh challenge for an already-normalized email.
    pub fn issue(email: &str, code: String, ttl: Duration, max_attempts: u32) -> Self {
        let now = Utc::now();
        Self {
            email: email.to_string(),
            code,
            issued_at: now,
            expires_at: now + ttl,
            attempts_remaining: max_attempts,
            consumed: false,
            proof_token: None,
            proof_expires_at: None,
            proof_redeemed: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Single-use authorization minted by a successful code validation,
/// required by gated administrative mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Generate a 6-digit one-time code.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    rng.gen_range(100_000..=999_999u32).to_string()
}

/// Generate an unguessable proof token.
pub fn generate_proof_token() -> String {
    Uuid::new_v4().to_string()
}

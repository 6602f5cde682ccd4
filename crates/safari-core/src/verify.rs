//! Email one-time-code verification and single-use proof tokens.
//!
//! A challenge is issued per email address; validating the correct code
//! consumes the challenge and mints a short-lived proof token that
//! privileged operations redeem exactly once.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::challenge::{Proof, VerificationChallenge};
use crate::error::{FieldViolation, PlannerError, Result};
use crate::notify::verification_email;
use crate::ports::{ChallengeStore, Mailer};
use crate::validate::{email_is_valid, normalize_email};

#[derive(Debug, Clone, Copy)]
pub struct VerifyConfig {
    pub code_ttl: Duration,
    pub proof_ttl: Duration,
    pub max_attempts: u32,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            code_ttl: Duration::hours(8),
            proof_ttl: Duration::minutes(10),
            max_attempts: 5,
        }
    }
}

pub struct VerificationService {
    store: Arc<dyn ChallengeStore>,
    mailer: Arc<dyn Mailer>,
    config: VerifyConfig,
}

impl VerificationService {
    pub fn new(store: Arc<dyn ChallengeStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self::with_config(store, mailer, VerifyConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn ChallengeStore>,
        mailer: Arc<dyn Mailer>,
        config: VerifyConfig,
    ) -> Self {
        Self { store, mailer, config }
    }

    /// Issue a fresh challenge for `email`, replacing any live one.
    ///
    /// The response is deliberately neutral: it never discloses whether the
    /// address has any requests on file.
    pub async fn request_challenge(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        if !email_is_valid(&email) {
            return Err(PlannerError::Validation(vec![FieldViolation::new(
                "email",
                "must be a valid email address",
            )]));
        }

        let challenge = VerificationChallenge::issue(
            &email,
            crate::challenge::generate_code(),
            self.config.code_ttl,
            self.config.max_attempts,
        );
        self.store.put(&challenge).await?;
        info!(email = %email, "verification challenge issued");

        // Delivery is best-effort. A relay outage must not reveal anything to
        // the caller, and the challenge stays valid for a retry.
        if let Err(e) = self.mailer.send(&verification_email(&challenge)).await {
            warn!(email = %email, error = %e, "verification email failed to send");
        }
        Ok(())
    }

    /// Validate a submitted code against the live challenge for `email`.
    ///
    /// Outcomes, checked in order: no live challenge, expired, already
    /// consumed, wrong code (burning one attempt), correct code. Only the
    /// last mints a proof.
    pub async fn validate_challenge(&self, email: &str, code: &str) -> Result<Proof> {
        let email = normalize_email(email);
        let Some(challenge) = self.store.load(&email).await? else {
            return Err(PlannerError::NotFound(format!(
                "no verification challenge for {email}"
            )));
        };

        let now = Utc::now();
        if challenge.is_expired(now) {
            return Err(PlannerError::ChallengeExpired);
        }
        if challenge.consumed {
            return Err(PlannerError::ChallengeConsumed);
        }

        if challenge.code != code.trim() {
            let remaining = self.store.record_failed_attempt(&email).await?;
            return match remaining {
                Some(0) => {
                    // The last allowed attempt just failed. Drop the
                    // challenge outright; a new code must be requested.
                    self.store.delete(&email).await?;
                    warn!(email = %email, "verification challenge exhausted");
                    Err(PlannerError::ChallengeExhausted)
                }
                Some(remaining) => Err(PlannerError::CodeMismatch {
                    attempts_remaining: remaining,
                }),
                None => {
                    // The decrement found no unconsumed row with attempts
                    // left: a racing validation got there first. Reload to
                    // tell consumption from exhaustion apart - a consumed
                    // row carries the winner's live proof and must survive.
                    match self.store.load(&email).await? {
                        Some(current) if current.consumed => {
                            Err(PlannerError::ChallengeConsumed)
                        }
                        Some(_) => {
                            self.store.delete(&email).await?;
                            warn!(email = %email, "verification challenge exhausted");
                            Err(PlannerError::ChallengeExhausted)
                        }
                        None => Err(PlannerError::ChallengeExhausted),
                    }
                }
            };
        }

        let token = crate::challenge::generate_proof_token();
        let expires_at = now + self.config.proof_ttl;
        // Conditional write: a concurrent validation of the same code wins or
        // loses atomically, so the challenge is consumed at most once.
        let consumed = self
            .store
            .consume(&email, code.trim(), &token, expires_at)
            .await?;
        if !consumed {
            return Err(PlannerError::ChallengeConsumed);
        }

        info!(email = %email, "verification challenge consumed, proof issued");
        Ok(Proof {
            email,
            token,
            expires_at,
        })
    }

    /// Redeem a proof token, invalidating it.
    ///
    /// Any failure (absent, foreign, expired, or already-redeemed token)
    /// collapses to `VerificationRequired`.
    pub async fn redeem_proof(&self, email: &str, token: Option<&str>) -> Result<()> {
        let email = normalize_email(email);
        let token = token.map(str::trim).unwrap_or_default();
        if token.is_empty() {
            return Err(PlannerError::VerificationRequired);
        }
        if self.store.redeem_proof(&email, token).await? {
            Ok(())
        } else {
            Err(PlannerError::VerificationRequired)
        }
    }
}

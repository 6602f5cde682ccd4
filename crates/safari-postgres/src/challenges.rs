//! Verification challenge storage over `safari.challenges`.
//!
//! One row per email. The conditional UPDATEs mirror the protocol exactly:
//! a code or proof can only be spent while the row is still in the state the
//! caller observed.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use safari_core::{ChallengeStore, Result, VerificationChallenge};

/// Postgres-backed challenge store.
pub struct PgChallengeStore {
    pool: PgPool,
}

impl PgChallengeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ChallengeRow {
    email: String,
    code: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    attempts_remaining: i32,
    consumed: bool,
    proof_token: Option<String>,
    proof_expires_at: Option<DateTime<Utc>>,
    proof_redeemed: bool,
}

impl From<ChallengeRow> for VerificationChallenge {
    fn from(row: ChallengeRow) -> Self {
        Self {
            email: row.email,
            code: row.code,
            issued_at: row.issued_at,
            expires_at: row.expires_at,
            attempts_remaining: row.attempts_remaining.max(0) as u32,
            consumed: row.consumed,
            proof_token: row.proof_token,
            proof_expires_at: row.proof_expires_at,
            proof_redeemed: row.proof_redeemed,
        }
    }
}

#[async_trait]
impl ChallengeStore for PgChallengeStore {
    async fn put(&self, challenge: &VerificationChallenge) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO safari.challenges
                (email, code, issued_at, expires_at, attempts_remaining,
                 consumed, proof_token, proof_expires_at, proof_redeemed)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (email) DO UPDATE SET
                code = EXCLUDED.code,
                issued_at = EXCLUDED.issued_at,
                expires_at = EXCLUDED.expires_at,
                attempts_remaining = EXCLUDED.attempts_remaining,
                consumed = EXCLUDED.consumed,
                proof_token = EXCLUDED.proof_token,
                proof_expires_at = EXCLUDED.proof_expires_at,
                proof_redeemed = EXCLUDED.proof_redeemed
            "#,
        )
        .bind(&challenge.email)
        .bind(&challenge.code)
        .bind(challenge.issued_at)
        .bind(challenge.expires_at)
        .bind(challenge.attempts_remaining as i32)
        .bind(challenge.consumed)
        .bind(&challenge.proof_token)
        .bind(challenge.proof_expires_at)
        .bind(challenge.proof_redeemed)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn load(&self, email: &str) -> Result<Option<VerificationChallenge>> {
        let row = sqlx::query_as::<_, ChallengeRow>(
            r#"
            SELECT email, code, issued_at, expires_at, attempts_remaining,
                   consumed, proof_token, proof_expires_at, proof_redeemed
            FROM safari.challenges
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(row.map(VerificationChallenge::from))
    }

    async fn record_failed_attempt(&self, email: &str) -> Result<Option<u32>> {
        let remaining = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE safari.challenges
            SET attempts_remaining = attempts_remaining - 1
            WHERE email = $1 AND consumed = FALSE AND attempts_remaining > 0
            RETURNING attempts_remaining
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(remaining.map(|n| n.max(0) as u32))
    }

    async fn consume(
        &self,
        email: &str,
        code: &str,
        proof_token: &str,
        proof_expires_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE safari.challenges
            SET consumed = TRUE, proof_token = $3, proof_expires_at = $4,
                proof_redeemed = FALSE
            WHERE email = $1 AND code = $2 AND consumed = FALSE
              AND expires_at > now()
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(proof_token)
        .bind(proof_expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn redeem_proof(&self, email: &str, token: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE safari.challenges
            SET proof_redeemed = TRUE
            WHERE email = $1 AND consumed = TRUE AND proof_redeemed = FALSE
              AND proof_token = $2 AND proof_expires_at > now()
            "#,
        )
        .bind(email)
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, email: &str) -> Result<()> {
        sqlx::query("DELETE FROM safari.challenges WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(())
    }
}

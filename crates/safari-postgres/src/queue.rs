//! Generation job queue over `safari.jobs`.
//!
//! Claiming uses FOR UPDATE SKIP LOCKED so any number of workers can poll
//! the same table without serializing on one row.

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use safari_core::{JobQueue, QueuedJob, Result};

/// Postgres-backed job queue.
pub struct PgJobQueue {
    pool: PgPool,
}

impl PgJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn enqueue(&self, request_id: Uuid) -> Result<()> {
        sqlx::query("INSERT INTO safari.jobs (request_id) VALUES ($1)")
            .bind(request_id)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn claim(&self) -> Result<Option<QueuedJob>> {
        // Atomic pop with CTE form (planner-independent, safe under
        // concurrent workers).
        let row = sqlx::query(
            r#"
            WITH next AS (
                SELECT job_id
                FROM safari.jobs
                WHERE claimed_at IS NULL
                ORDER BY job_id
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            UPDATE safari.jobs j
            SET claimed_at = now()
            FROM next
            WHERE j.job_id = next.job_id
            RETURNING j.job_id, j.request_id, j.attempts
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(QueuedJob {
            job_id: row.get("job_id"),
            request_id: row.get("request_id"),
            attempts: row.get("attempts"),
        }))
    }

    async fn ack(&self, job_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM safari.jobs WHERE job_id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn requeue(&self, job_id: i64, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE safari.jobs
            SET claimed_at = NULL, attempts = attempts + 1, last_error = $2
            WHERE job_id = $1
            "#,
        )
        .bind(job_id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(())
    }
}

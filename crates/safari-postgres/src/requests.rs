//! Request record storage over `safari.requests`.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use safari_core::{NextState, PlannerError, RequestRecord, RequestStore, Result, SearchQuery};
use safari_types::RequestStatus;

/// Postgres-backed request store.
pub struct PgRequestStore {
    pool: PgPool,
}

impl PgRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RequestRow {
    request_id: Uuid,
    email: String,
    status: String,
    payload: serde_json::Value,
    itinerary: Option<serde_json::Value>,
    error_detail: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for RequestRecord {
    type Error = PlannerError;

    fn try_from(row: RequestRow) -> Result<Self> {
        Ok(Self {
            request_id: row.request_id,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
            status: row.status.parse().map_err(|e| anyhow!("{e}"))?,
            payload: serde_json::from_value(row.payload).map_err(|e| anyhow!(e))?,
            itinerary: row
                .itinerary
                .map(serde_json::from_value)
                .transpose()
                .map_err(|e| anyhow!(e))?,
            error_detail: row.error_detail,
        })
    }
}

#[async_trait]
impl RequestStore for PgRequestStore {
    async fn insert(&self, record: &RequestRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO safari.requests
                (request_id, email, status, payload, itinerary, error_detail, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.request_id)
        .bind(&record.email)
        .bind(record.status.as_str())
        .bind(serde_json::to_value(&record.payload).map_err(|e| anyhow!(e))?)
        .bind(
            record
                .itinerary
                .as_ref()
                .map(serde_json::to_value)
                .transpose()
                .map_err(|e| anyhow!(e))?,
        )
        .bind(&record.error_detail)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(())
    }

    async fn load(&self, request_id: Uuid) -> Result<Option<RequestRecord>> {
        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            SELECT request_id, email, status, payload, itinerary, error_detail,
                   created_at, updated_at
            FROM safari.requests
            WHERE request_id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        row.map(RequestRecord::try_from).transpose()
    }

    async fn transition(
        &self,
        request_id: Uuid,
        expected: RequestStatus,
        next: NextState,
    ) -> Result<Option<RequestRecord>> {
        let itinerary = next
            .itinerary()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| anyhow!(e))?;
        // The status check in the WHERE clause is the whole concurrency
        // story: the row moves only if it is still where the caller saw it.
        let row = sqlx::query_as::<_, RequestRow>(
            r#"
            UPDATE safari.requests
            SET status = $3, itinerary = $4, error_detail = $5, updated_at = now()
            WHERE request_id = $1 AND status = $2
            RETURNING request_id, email, status, payload, itinerary, error_detail,
                      created_at, updated_at
            "#,
        )
        .bind(request_id)
        .bind(expected.as_str())
        .bind(next.status().as_str())
        .bind(itinerary)
        .bind(next.error_detail())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        row.map(RequestRecord::try_from).transpose()
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<RequestRecord>> {
        let (cursor_at, cursor_id) = match query.cursor {
            Some(c) => (Some(c.created_at), Some(c.request_id)),
            None => (None, None),
        };
        let rows = sqlx::query_as::<_, RequestRow>(
            r#"
            SELECT request_id, email, status, payload, itinerary, error_detail,
                   created_at, updated_at
            FROM safari.requests
            WHERE email = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at < $3)
              AND ($4::timestamptz IS NULL OR (created_at, request_id) > ($4, $5))
            ORDER BY created_at, request_id
            LIMIT $6
            "#,
        )
        .bind(&query.email)
        .bind(query.created_from)
        .bind(query.created_to)
        .bind(cursor_at)
        .bind(cursor_id)
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        rows.into_iter().map(RequestRecord::try_from).collect()
    }
}

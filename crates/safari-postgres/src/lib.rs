//! Postgres implementations of the safari-core port traits.
//!
//! Each adapter is a newtype wrapping PgPool. All SQL is runtime-checked
//! (sqlx::query, not sqlx::query!) so builds never need a live database.
//! Every mutation is a single conditional statement; the WHERE clause is the
//! same precondition the in-memory stores check under their lock, which is
//! what keeps transitions, codes and proofs single-winner under concurrency.

use std::time::Duration;

use anyhow::anyhow;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use safari_core::Result;

pub mod challenges;
pub mod queue;
pub mod requests;

pub use challenges::PgChallengeStore;
pub use queue::PgJobQueue;
pub use requests::PgRequestStore;

/// Connect with pool bounds sized for a small service.
pub async fn connect(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .map_err(|e| anyhow!(e))?;
    info!("database connection pool created");
    Ok(pool)
}

/// Apply the embedded schema script. Every statement is `IF NOT EXISTS`, so
/// this runs unconditionally at startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(include_str!("../schema.sql"))
        .execute(pool)
        .await
        .map_err(|e| anyhow!(e))?;
    info!("database schema ensured");
    Ok(())
}

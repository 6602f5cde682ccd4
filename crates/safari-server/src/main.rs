//! Safari planner server binary.
//!
//! Reads config from env vars (a `.env` file is honored):
//!   DATABASE_URL       - Postgres connection string; in-memory stores if unset
//!   ANTHROPIC_API_KEY  - completion provider key; canned itineraries if unset
//!   MAILERSEND_API_KEY - transactional email key; emails are logged if unset
//!   BIND_ADDR          - listen address (default: 0.0.0.0:3000)

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use safari_agent::{CannedGenerator, ItineraryAgent};
use safari_core::{
    ChallengeStore, IntakeService, ItineraryGenerator, ItineraryProcessor, JobQueue, Mailer,
    MemoryChallengeStore, MemoryJobQueue, MemoryRequestStore, RequestStore, StatusTracker,
    StatusUpdater, VerificationService,
};
use safari_mailer::{MailerSendClient, NullMailer};
use safari_postgres::{PgChallengeStore, PgJobQueue, PgRequestStore};
use safari_server::routes::build_router;
use safari_server::state::AppState;
use safari_server::worker::GenerationWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "safari_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting safari planner server");

    // Durable stores when a database is configured, in-memory otherwise.
    let request_store: Arc<dyn RequestStore>;
    let challenge_store: Arc<dyn ChallengeStore>;
    let job_queue: Arc<dyn JobQueue>;
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = safari_postgres::connect(&url).await?;
            safari_postgres::ensure_schema(&pool).await?;
            tracing::info!("database connection established");
            request_store = Arc::new(PgRequestStore::new(pool.clone()));
            challenge_store = Arc::new(PgChallengeStore::new(pool.clone()));
            job_queue = Arc::new(PgJobQueue::new(pool));
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using in-memory stores; state is lost on restart");
            request_store = Arc::new(MemoryRequestStore::new());
            challenge_store = Arc::new(MemoryChallengeStore::new());
            job_queue = Arc::new(MemoryJobQueue::new());
        }
    }

    let generator: Arc<dyn ItineraryGenerator> = match ItineraryAgent::from_env() {
        Ok(agent) => Arc::new(agent),
        Err(e) => {
            tracing::warn!(error = %e, "completion provider not configured, serving canned itineraries");
            Arc::new(CannedGenerator)
        }
    };

    let mailer: Arc<dyn Mailer> = match MailerSendClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::warn!(error = %e, "email delivery not configured, logging messages instead");
            Arc::new(NullMailer)
        }
    };

    let verification = Arc::new(VerificationService::new(
        challenge_store,
        Arc::clone(&mailer),
    ));
    let state = AppState {
        intake: Arc::new(IntakeService::new(
            Arc::clone(&request_store),
            Arc::clone(&job_queue),
        )),
        tracker: Arc::new(StatusTracker::new(Arc::clone(&request_store))),
        updater: Arc::new(StatusUpdater::new(
            Arc::clone(&request_store),
            Arc::clone(&verification),
            Arc::clone(&mailer),
        )),
        verification,
    };

    // One background worker drains the queue; processor idempotence makes a
    // second instance safe if this binary is ever scaled out.
    let processor = Arc::new(ItineraryProcessor::new(request_store, generator, mailer));
    let worker = GenerationWorker::new(job_queue, processor);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = tokio::spawn(async move { worker.run(shutdown_rx).await });

    let app = build_router(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("safari planner listening on {bind_addr}");
    tracing::info!("  POST /api/requests              - submit a planning request");
    tracing::info!("  GET  /api/requests/:id          - check request status");
    tracing::info!("  GET  /api/requests?email=       - search request history");
    tracing::info!("  PUT  /api/requests/:id/status   - administrative status change");
    tracing::info!("  POST /api/verification/request  - request an email challenge");
    tracing::info!("  POST /api/verification/validate - trade a code for a proof");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = worker_handle.await;
    tracing::info!("safari planner stopped");
    Ok(())
}

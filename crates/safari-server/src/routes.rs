//! HTTP surface: request lifecycle plus the verification protocol.
//!
//! Handlers translate wire shapes and delegate; all policy lives in
//! `safari_core`. Error bodies come from [`crate::error::AppError`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use safari_core::{FieldViolation, PlannerError, Proof, SearchParams};
use safari_types::{
    ChallengeAnswer, ChallengeRequest, RequestStatus, SafariRequest, SearchPage, StatusChange,
    StatusView, SubmitReceipt,
};

use crate::error::AppError;
use crate::state::AppState;

/// Wire up every route plus the trace and CORS layers.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/requests", post(submit_request).get(search_requests))
        .route("/api/requests/:id", get(get_status))
        .route("/api/requests/:id/status", put(update_status))
        .route("/api/verification/request", post(request_verification))
        .route("/api/verification/validate", post(validate_verification))
        .route("/healthz", get(healthz))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

// =============================================================================
// REQUEST LIFECYCLE
// =============================================================================

/// POST /api/requests
///
/// Accepts a planning request and queues generation. The caller gets the id
/// back immediately; generation happens on the worker.
pub async fn submit_request(
    State(state): State<AppState>,
    Json(payload): Json<SafariRequest>,
) -> Result<(StatusCode, Json<SubmitReceipt>), AppError> {
    let record = state.intake.submit(payload).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitReceipt {
            request_id: record.request_id,
            status: record.status,
            message: "Your request is being processed. Use the requestId to check the status."
                .into(),
        }),
    ))
}

/// GET /api/requests/:id
pub async fn get_status(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<StatusView>, AppError> {
    Ok(Json(state.tracker.get_status(request_id).await?))
}

/// Query string of the search endpoint. Dates are `YYYY-MM-DD`, both ends
/// inclusive; `cursor` is the token from the previous page.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQueryParams {
    pub email: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/requests?email=...
pub async fn search_requests(
    State(state): State<AppState>,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<SearchPage>, AppError> {
    let page = state
        .tracker
        .search(SearchParams {
            email: params.email.unwrap_or_default(),
            from: params.from,
            to: params.to,
            cursor: params.cursor,
            limit: params.limit,
        })
        .await?;
    Ok(Json(page))
}

/// PUT /api/requests/:id/status
///
/// Administrative transition, gated on a proof token for the record's email.
pub async fn update_status(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<StatusChange>,
) -> Result<Json<StatusView>, AppError> {
    let new_status: RequestStatus = body.status.trim().parse().map_err(|_| {
        PlannerError::Validation(vec![FieldViolation::new(
            "status",
            format!("unknown status {:?}", body.status),
        )])
    })?;
    let view = state
        .updater
        .update_status(request_id, new_status, body.proof_token.as_deref())
        .await?;
    Ok(Json(view))
}

// =============================================================================
// VERIFICATION
// =============================================================================

/// POST /api/verification/request
///
/// The ack is the same whether or not the address had prior activity.
pub async fn request_verification(
    State(state): State<AppState>,
    Json(body): Json<ChallengeRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    state.verification.request_challenge(&body.email).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "A verification code is on its way." })),
    ))
}

/// POST /api/verification/validate
pub async fn validate_verification(
    State(state): State<AppState>,
    Json(body): Json<ChallengeAnswer>,
) -> Result<Json<Proof>, AppError> {
    let proof = state
        .verification
        .validate_challenge(&body.email, &body.code)
        .await?;
    Ok(Json(proof))
}

// =============================================================================
// LIVENESS
// =============================================================================

pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

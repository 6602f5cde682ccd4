//! HTTP error envelope.
//!
//! Every handler error is a `PlannerError`; this wrapper renders it as
//! `{"error": <code>, "message": <human>, ...}` with the status the taxonomy
//! assigns. Validation carries a `details` array of field violations, code
//! mismatches carry `attemptsRemaining`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use safari_core::PlannerError;

pub struct AppError(pub PlannerError);

impl From<PlannerError> for AppError {
    fn from(e: PlannerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let mut body = json!({
            "error": error_code(&self.0),
            "message": self.0.to_string(),
        });
        match &self.0 {
            PlannerError::Validation(violations) => {
                body["details"] = serde_json::to_value(violations).unwrap_or_default();
            }
            PlannerError::CodeMismatch { attempts_remaining } => {
                body["attemptsRemaining"] = (*attempts_remaining).into();
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

/// Stable machine-readable code per error variant. Clients branch on this,
/// never on the message text.
fn error_code(e: &PlannerError) -> &'static str {
    match e {
        PlannerError::Validation(_) => "validation_failed",
        PlannerError::NotFound(_) => "not_found",
        PlannerError::InvalidTransition { .. } => "invalid_transition",
        PlannerError::VerificationRequired => "verification_required",
        PlannerError::ChallengeExpired => "challenge_expired",
        PlannerError::ChallengeConsumed => "challenge_consumed",
        PlannerError::CodeMismatch { .. } => "code_mismatch",
        PlannerError::ChallengeExhausted => "challenge_exhausted",
        PlannerError::UpstreamTimeout(_) => "upstream_timeout",
        PlannerError::UpstreamFailure(_) => "upstream_failure",
        PlannerError::Notification(_) => "notification_failed",
        PlannerError::Internal(_) => "internal",
    }
}

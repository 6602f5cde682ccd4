use serde::{Deserialize, Serialize};
use thiserror::Error;

use safari_types::RequestStatus;

pub type Result<T> = std::result::Result<T, PlannerError>;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("validation failed: {} violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    // Deliberately carries no detail: a replayed, expired or foreign proof
    // must be indistinguishable from a missing one.
    #[error("verification required")]
    VerificationRequired,

    #[error("verification code expired")]
    ChallengeExpired,

    #[error("verification code already used")]
    ChallengeConsumed,

    #[error("verification code mismatch: {attempts_remaining} attempt(s) remaining")]
    CodeMismatch { attempts_remaining: u32 },

    #[error("verification attempts exhausted")]
    ChallengeExhausted,

    #[error("itinerary generation timed out after {0}s")]
    UpstreamTimeout(u64),

    #[error("itinerary generation failed: {0}")]
    UpstreamFailure(String),

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PlannerError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::InvalidTransition { .. } => 409,
            Self::VerificationRequired => 403,
            Self::ChallengeExpired => 410,
            Self::ChallengeConsumed => 409,
            Self::CodeMismatch { .. } => 401,
            Self::ChallengeExhausted => 410,
            Self::UpstreamTimeout(_) => 502,
            Self::UpstreamFailure(_) => 502,
            Self::Notification(_) => 502,
            Self::Internal(_) => 500,
        }
    }
}

/// A single field-level validation violation. Field names are the wire
/// (camelCase) names so clients can map them straight onto form fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

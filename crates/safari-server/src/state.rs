//! Shared application state.
//!
//! One handle per service; handlers never touch stores directly.

use std::sync::Arc;

use safari_core::{IntakeService, StatusTracker, StatusUpdater, VerificationService};

/// Service handles shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<IntakeService>,
    pub tracker: Arc<StatusTracker>,
    pub updater: Arc<StatusUpdater>,
    pub verification: Arc<VerificationService>,
}

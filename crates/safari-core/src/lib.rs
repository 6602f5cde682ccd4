//! Safari Planner - request lifecycle core
//!
//! Domain types, services and storage ports for a safari travel-planning
//! backend. Every request moves through one lifecycle:
//! RECEIVED -> PROCESSING -> COMPLETED | FAILED, with administrative
//! cancellation from PROCESSING or COMPLETED.
//!
//! All state changes go through conditional single-record writes, so any
//! number of concurrent processors and administrators agree on exactly one
//! winner per transition.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use safari_core::{IntakeService, MemoryJobQueue, MemoryRequestStore};
//!
//! # async fn demo(payload: safari_types::SafariRequest) -> safari_core::Result<()> {
//! let store = Arc::new(MemoryRequestStore::new());
//! let queue = Arc::new(MemoryJobQueue::new());
//! let intake = IntakeService::new(store, queue);
//! let record = intake.submit(payload).await?;
//! println!("accepted request {}", record.request_id);
//! # Ok(())
//! # }
//! ```

// Error taxonomy shared by every service
pub mod error;

// Persistent shapes: the request record and the verification challenge
pub mod challenge;
pub mod record;

// Storage and collaborator ports plus the in-memory implementations
pub mod memory;
pub mod ports;

// Field-level payload validation
pub mod validate;

// Transactional email bodies
pub mod notify;

// The five services
pub mod intake;
pub mod processor;
pub mod tracker;
pub mod updater;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_support;

pub use challenge::{Proof, VerificationChallenge};
pub use error::{FieldViolation, PlannerError, Result};
pub use intake::IntakeService;
pub use memory::{MemoryChallengeStore, MemoryJobQueue, MemoryRequestStore};
pub use ports::{
    ChallengeStore, EmailMessage, ItineraryGenerator, JobQueue, Mailer, QueuedJob, RequestStore,
    SearchCursor, SearchQuery,
};
pub use processor::{ItineraryProcessor, ProcessOutcome};
pub use record::{NextState, RequestRecord};
pub use tracker::{SearchParams, StatusTracker};
pub use updater::StatusUpdater;
pub use verify::{VerificationService, VerifyConfig};

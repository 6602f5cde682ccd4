//! Model-backed itinerary generation.
//!
//! Bridges the planner core to the Anthropic Messages API: prompt assembly
//! from the validated request, one JSON-demanding completion call, then
//! extraction and normalization of the returned document. A deterministic
//! [`CannedGenerator`] covers keyless local runs.

pub mod anthropic;
pub mod extract;
pub mod generator;
pub mod llm;
pub mod prompt;

pub use anthropic::AnthropicClient;
pub use generator::{CannedGenerator, ItineraryAgent};
pub use llm::LlmClient;

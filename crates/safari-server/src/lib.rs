//! Safari planner REST server.
//!
//! The axum surface over `safari_core`, plus the background worker that
//! drains the generation queue. `main.rs` wires stores, generator and mailer
//! from the environment; everything here is also importable for tests.

pub mod error;
pub mod routes;
pub mod state;
pub mod worker;

//! Candidate bus and eligibility gate.
//!
//! - [`CandidateBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`CandidateEvent`]: one recipient's notification candidate.
//! - [`EligibilityGate`]: background service that evaluates candidates and
//!   hands eligible ones to the dispatch channel.

pub mod bus;
pub mod gate;

pub use bus::{CandidateBus, CandidateEvent};
pub use gate::{EligibilityGate, GateSummary};

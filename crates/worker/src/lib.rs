//! Worker that feeds newline-delimited JSON candidates through the
//! eligibility gate.

pub mod config;
pub mod error;
pub mod intake;

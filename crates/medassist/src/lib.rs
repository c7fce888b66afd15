//! Triage decision engine: scores a free-text situation through an injected oracle and
//! classifies it into one of five dispositions with an ordered rule table.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod triage;

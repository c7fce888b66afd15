//! Triage decision engine: oracle contract, ordered classification rules, the follow-up
//! reassessment loop, the booking stub, and the session state the presentation layer reads.

pub mod booking;
pub mod classifier;
pub mod domain;
pub mod engine;
pub mod error;
pub mod oracle;
pub mod reassessment;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use booking::{AppointmentBooker, BookingConfirmation, BookingReceipt, SimulatedBooker};
pub use classifier::{classify, ClassifierThresholds, DecisionClassifier};
pub use domain::{AIDecision, DecisionCategory, DecisionRule, PatientProfile, ScoringResult};
pub use engine::TriageEngine;
pub use error::{BookingError, OracleError, TriageError};
pub use oracle::{parse_scoring_response, render_prompt, HttpScoringOracle, ScoringOracle};
pub use reassessment::{compose_answers, merge_follow_up};
pub use repository::{SessionStore, SessionStoreError};
pub use router::{triage_router, AssessmentRequest, FollowUpRequest};
pub use service::{TriageService, TriageServiceError};
pub use session::{AssessmentSession, SessionError, SessionId, SessionView};

/// Failures raised while producing a triage decision.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("Current situation description cannot be empty.")]
    EmptyInput,
    #[error("Follow-up answer cannot be empty.")]
    EmptyFollowUp,
    #[error("scoring oracle returned an invalid result: {0}")]
    InvalidScore(String),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl TriageError {
    /// Text suitable for the presentation layer. Oracle contract defects stay generic.
    pub fn user_message(&self) -> String {
        match self {
            TriageError::EmptyInput | TriageError::EmptyFollowUp => self.to_string(),
            TriageError::InvalidScore(_) => {
                "Failed to get assessment. The assessment could not be completed.".to_string()
            }
            TriageError::Oracle(err) => format!("Failed to get assessment. {err}"),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, TriageError::EmptyInput | TriageError::EmptyFollowUp)
    }
}

/// Transport and contract failures at the scoring oracle boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("scoring oracle unavailable: {0}")]
    Unavailable(String),
    #[error("scoring oracle returned malformed output: {0}")]
    Format(String),
}

/// Appointment booking failure. Non-fatal; the caller may retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("booking was declined by the scheduler")]
    Declined,
    #[error("booking succeeded without a confirmation id")]
    MissingConfirmation,
    #[error("booking service unavailable: {0}")]
    Unavailable(String),
}

impl BookingError {
    pub fn user_message(&self) -> String {
        "Failed to book the appointment. Please try again later.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_score_detail_is_hidden_from_users() {
        let err = TriageError::InvalidScore("confidence 140 outside [0, 100]".to_string());
        let message = err.user_message();
        assert!(message.starts_with("Failed to get assessment."));
        assert!(!message.contains("140"));
    }

    #[test]
    fn oracle_failures_append_the_underlying_message() {
        let err = TriageError::from(OracleError::Unavailable("connection refused".to_string()));
        assert_eq!(
            err.user_message(),
            "Failed to get assessment. scoring oracle unavailable: connection refused"
        );
        assert!(!err.is_validation());
    }

    #[test]
    fn validation_errors_are_reported_verbatim() {
        assert_eq!(
            TriageError::EmptyInput.user_message(),
            "Current situation description cannot be empty."
        );
        assert!(TriageError::EmptyFollowUp.is_validation());
    }
}

mod policy;
mod rules;
mod thresholds;

pub use thresholds::ClassifierThresholds;

use super::domain::{AIDecision, PatientProfile, ScoringResult};
use super::error::TriageError;
use tracing::info;

/// Stateless classifier applying the ordered decision table to oracle output.
#[derive(Debug, Clone, Default)]
pub struct DecisionClassifier {
    thresholds: ClassifierThresholds,
}

impl DecisionClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    /// Classify one oracle result. The profile and situation are accepted so the
    /// contract stays stable, but the decision depends on the scores and flags alone.
    pub fn classify(
        &self,
        _profile: &PatientProfile,
        _situation: &str,
        result: &ScoringResult,
    ) -> Result<AIDecision, TriageError> {
        rules::validate(result)?;

        let rule = rules::match_rule(result, &self.thresholds);
        let decision = policy::decide(rule, result);

        info!(
            category = decision.category.label(),
            rule = ?rule,
            confidence = decision.confidence,
            risk = decision.risk,
            "triage decision classified"
        );

        Ok(decision)
    }
}

/// Classify with the default thresholds.
pub fn classify(
    profile: &PatientProfile,
    situation: &str,
    result: &ScoringResult,
) -> Result<AIDecision, TriageError> {
    DecisionClassifier::default().classify(profile, situation, result)
}

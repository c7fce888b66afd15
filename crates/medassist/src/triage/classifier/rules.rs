use super::super::domain::{DecisionRule, ScoringResult};
use super::super::error::TriageError;
use super::thresholds::ClassifierThresholds;

const SCORE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

/// Reject oracle output the rule table cannot interpret.
pub(crate) fn validate(result: &ScoringResult) -> Result<(), TriageError> {
    if !SCORE_RANGE.contains(&result.confidence) {
        return Err(TriageError::InvalidScore(format!(
            "confidence {} outside [0, 100]",
            result.confidence
        )));
    }

    if !SCORE_RANGE.contains(&result.risk) {
        return Err(TriageError::InvalidScore(format!(
            "risk {} outside [0, 100]",
            result.risk
        )));
    }

    if result.missing_critical_info
        && !result.is_adversarial
        && result
            .missing_info_questions
            .iter()
            .all(|question| question.trim().is_empty())
    {
        return Err(TriageError::InvalidScore(
            "missing critical information flagged without follow-up questions".to_string(),
        ));
    }

    Ok(())
}

/// First matching rule wins; the order below is part of the contract.
pub(crate) fn match_rule(result: &ScoringResult, t: &ClassifierThresholds) -> DecisionRule {
    let confidence = result.confidence;
    let risk = result.risk;

    if result.is_adversarial {
        return DecisionRule::Adversarial;
    }

    if result.missing_critical_info {
        return DecisionRule::MissingInformation;
    }

    if risk > t.emergency_risk_above {
        return DecisionRule::HighRisk;
    }

    if confidence < t.minimum_confidence {
        return DecisionRule::LowConfidence;
    }

    if (t.appointment_confidence_min..=t.appointment_confidence_max).contains(&confidence)
        && (t.appointment_risk_min..=t.appointment_risk_max).contains(&risk)
    {
        return DecisionRule::AppointmentBand;
    }

    if (t.warning_confidence_min..=t.warning_confidence_max).contains(&confidence) {
        return DecisionRule::WarningBand;
    }

    if confidence > t.confident_confidence_above && risk < t.confident_risk_below {
        return DecisionRule::ConfidentBand;
    }

    DecisionRule::Unclassified
}

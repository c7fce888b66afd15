use super::super::domain::{AIDecision, DecisionCategory, DecisionRule, ScoringResult};

const ADVERSARIAL_REASONING: &str =
    "This request is inappropriate for a medical assessment and cannot be evaluated.";
const ADVERSARIAL_ACTION: &str =
    "Describe a genuine medical concern, or contact a healthcare professional directly.";

const MISSING_INFO_REASONING: &str =
    "Critical information is missing to make a sound assessment.";
const MISSING_INFO_ACTION: &str =
    "Answer the follow-up questions so the situation can be reassessed.";

const HIGH_RISK_REASONING: &str = "The risk level is high. Seek immediate professional medical \
     help, for example by calling emergency services.";
const HIGH_RISK_ACTION: &str =
    "Call emergency services or go to the nearest emergency department now.";

const LOW_CONFIDENCE_REASONING: &str = "There is high uncertainty in this assessment, so a \
     professional medical evaluation is required.";
const PROFESSIONAL_ACTION: &str = "Consult a doctor or another qualified healthcare professional.";

const APPOINTMENT_ACTION: &str =
    "Book an appointment with a doctor for a professional evaluation.";
const WARNING_ACTION: &str =
    "Consult a doctor or monitor your symptoms closely, and seek care if they worsen.";
const CONFIDENT_ACTION: &str =
    "Simple home care and observation should be sufficient. Seek care if symptoms change.";

const UNCLASSIFIED_REASONING: &str = "The assessment fell outside all defined decision \
     categories, so no self-care guidance can be given. A professional medical evaluation is \
     required.";

/// Render the decision record for the rule that fired.
pub(crate) fn decide(rule: DecisionRule, result: &ScoringResult) -> AIDecision {
    match rule {
        DecisionRule::Adversarial => AIDecision {
            category: DecisionCategory::Refuse,
            confidence: 0.0,
            risk: 100.0,
            reasoning: ADVERSARIAL_REASONING.to_string(),
            action_suggestion: ADVERSARIAL_ACTION.to_string(),
            missing_info_questions: None,
            rule,
        },
        DecisionRule::MissingInformation => AIDecision {
            category: DecisionCategory::AskForMoreInfo,
            confidence: result.confidence,
            risk: result.risk,
            reasoning: oracle_reasoning_or(result, MISSING_INFO_REASONING),
            action_suggestion: MISSING_INFO_ACTION.to_string(),
            missing_info_questions: Some(
                result
                    .missing_info_questions
                    .iter()
                    .filter(|question| !question.trim().is_empty())
                    .cloned()
                    .collect(),
            ),
            rule,
        },
        DecisionRule::HighRisk => refusal(rule, result, HIGH_RISK_REASONING, HIGH_RISK_ACTION),
        DecisionRule::LowConfidence => {
            refusal(rule, result, LOW_CONFIDENCE_REASONING, PROFESSIONAL_ACTION)
        }
        DecisionRule::Unclassified => {
            refusal(rule, result, UNCLASSIFIED_REASONING, PROFESSIONAL_ACTION)
        }
        DecisionRule::AppointmentBand => advisory(
            DecisionCategory::SuggestAppointment,
            rule,
            result,
            APPOINTMENT_ACTION,
        ),
        DecisionRule::WarningBand => {
            advisory(DecisionCategory::ActWithWarning, rule, result, WARNING_ACTION)
        }
        DecisionRule::ConfidentBand => {
            advisory(DecisionCategory::ActConfidently, rule, result, CONFIDENT_ACTION)
        }
    }
}

fn refusal(
    rule: DecisionRule,
    result: &ScoringResult,
    statement: &str,
    action: &str,
) -> AIDecision {
    let detail = result.reasoning.trim();
    let reasoning = if detail.is_empty() {
        statement.to_string()
    } else {
        format!("{statement} {detail}")
    };

    AIDecision {
        category: DecisionCategory::Refuse,
        confidence: result.confidence,
        risk: result.risk,
        reasoning,
        action_suggestion: action.to_string(),
        missing_info_questions: None,
        rule,
    }
}

fn advisory(
    category: DecisionCategory,
    rule: DecisionRule,
    result: &ScoringResult,
    action: &str,
) -> AIDecision {
    AIDecision {
        category,
        confidence: result.confidence,
        risk: result.risk,
        reasoning: oracle_reasoning_or(result, "No further reasoning was provided."),
        action_suggestion: action.to_string(),
        missing_info_questions: None,
        rule,
    }
}

fn oracle_reasoning_or(result: &ScoringResult, fallback: &str) -> String {
    let detail = result.reasoning.trim();
    if detail.is_empty() {
        fallback.to_string()
    } else {
        detail.to_string()
    }
}

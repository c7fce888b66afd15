use serde::{Deserialize, Serialize};

/// Patient attributes captured alongside the situation. Empty strings mean "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub conditions: String,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub medications: String,
}

/// Scores and flags extracted from free text by the scoring oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResult {
    pub confidence: f64,
    pub risk: f64,
    pub is_adversarial: bool,
    pub missing_critical_info: bool,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_info_questions: Vec<String>,
}

/// The five dispositions a triage decision may land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionCategory {
    ActConfidently,
    ActWithWarning,
    SuggestAppointment,
    Refuse,
    AskForMoreInfo,
}

impl DecisionCategory {
    pub fn label(&self) -> &'static str {
        match self {
            DecisionCategory::ActConfidently => "ACT_CONFIDENTLY",
            DecisionCategory::ActWithWarning => "ACT_WITH_WARNING",
            DecisionCategory::SuggestAppointment => "SUGGEST_APPOINTMENT",
            DecisionCategory::Refuse => "REFUSE",
            DecisionCategory::AskForMoreInfo => "ASK_FOR_MORE_INFO",
        }
    }

    /// Whether a user may book an appointment after receiving this disposition.
    pub fn permits_booking(&self) -> bool {
        !matches!(
            self,
            DecisionCategory::Refuse | DecisionCategory::AskForMoreInfo
        )
    }
}

/// Rule of the classifier table that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    Adversarial,
    MissingInformation,
    HighRisk,
    LowConfidence,
    AppointmentBand,
    WarningBand,
    ConfidentBand,
    Unclassified,
}

/// Immutable classification output. A reassessment supersedes it with a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AIDecision {
    #[serde(rename = "decision_category")]
    pub category: DecisionCategory,
    #[serde(rename = "confidence_score")]
    pub confidence: f64,
    #[serde(rename = "risk_level")]
    pub risk: f64,
    pub reasoning: String,
    pub action_suggestion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_info_questions: Option<Vec<String>>,
    #[serde(rename = "matched_rule")]
    pub rule: DecisionRule,
}

impl AIDecision {
    pub fn summary(&self) -> String {
        format!(
            "{} (confidence {:.0}, risk {:.0})",
            self.category.label(),
            self.confidence,
            self.risk
        )
    }
}

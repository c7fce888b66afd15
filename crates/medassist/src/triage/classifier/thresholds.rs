use serde::{Deserialize, Serialize};

/// Numeric cut-offs of the decision table. Inclusivity of each bound is fixed by the rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// Risk strictly above this refuses outright.
    pub emergency_risk_above: f64,
    /// Confidence strictly below this refuses outright.
    pub minimum_confidence: f64,
    pub appointment_confidence_min: f64,
    pub appointment_confidence_max: f64,
    pub appointment_risk_min: f64,
    pub appointment_risk_max: f64,
    pub warning_confidence_min: f64,
    pub warning_confidence_max: f64,
    pub confident_confidence_above: f64,
    pub confident_risk_below: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            emergency_risk_above: 70.0,
            minimum_confidence: 50.0,
            appointment_confidence_min: 65.0,
            appointment_confidence_max: 85.0,
            appointment_risk_min: 30.0,
            appointment_risk_max: 70.0,
            warning_confidence_min: 50.0,
            warning_confidence_max: 80.0,
            confident_confidence_above: 80.0,
            confident_risk_below: 30.0,
        }
    }
}

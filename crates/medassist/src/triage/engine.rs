use std::sync::Arc;

use tracing::{info, warn};

use super::booking::{AppointmentBooker, BookingConfirmation};
use super::classifier::DecisionClassifier;
use super::domain::{AIDecision, PatientProfile};
use super::error::{BookingError, TriageError};
use super::oracle::ScoringOracle;
use super::reassessment::merge_follow_up;

/// Decision engine composing the scoring oracle, the classifier, and the booking stub.
pub struct TriageEngine<O, B> {
    oracle: Arc<O>,
    booker: Arc<B>,
    classifier: DecisionClassifier,
}

impl<O, B> TriageEngine<O, B>
where
    O: ScoringOracle + 'static,
    B: AppointmentBooker + 'static,
{
    pub fn new(oracle: Arc<O>, booker: Arc<B>, classifier: DecisionClassifier) -> Self {
        Self {
            oracle,
            booker,
            classifier,
        }
    }

    /// Score and classify one situation. Blank input never reaches the oracle.
    pub async fn assess(
        &self,
        profile: &PatientProfile,
        situation: &str,
    ) -> Result<AIDecision, TriageError> {
        if situation.trim().is_empty() {
            return Err(TriageError::EmptyInput);
        }

        let result = self.oracle.score(profile, situation).await.map_err(|err| {
            warn!(error = %err, "scoring oracle call failed");
            TriageError::from(err)
        })?;

        self.classifier
            .classify(profile, situation, &result)
            .inspect_err(|err| warn!(error = %err, "oracle result rejected by classifier"))
    }

    /// Merge the follow-up answer into the prior situation and run a full new round.
    ///
    /// There is no cap on the number of rounds; another `ASK_FOR_MORE_INFO` is a valid result.
    pub async fn reassess(
        &self,
        profile: &PatientProfile,
        prior_situation: &str,
        follow_up_answer: &str,
    ) -> Result<(String, AIDecision), TriageError> {
        let situation = merge_follow_up(prior_situation, follow_up_answer)?;
        let decision = self.assess(profile, &situation).await?;
        Ok((situation, decision))
    }

    pub async fn book_appointment(&self) -> Result<BookingConfirmation, BookingError> {
        let receipt = self.booker.book().await?;
        let confirmation = BookingConfirmation::try_from(receipt)
            .inspect_err(|err| warn!(error = %err, "booking receipt rejected"))?;
        info!(confirmation_id = %confirmation.confirmation_id, "appointment booked");
        Ok(confirmation)
    }
}

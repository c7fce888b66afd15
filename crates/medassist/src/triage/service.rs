use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use super::booking::{AppointmentBooker, BookingConfirmation};
use super::classifier::DecisionClassifier;
use super::domain::{AIDecision, PatientProfile};
use super::engine::TriageEngine;
use super::error::TriageError;
use super::oracle::ScoringOracle;
use super::repository::{SessionStore, SessionStoreError};
use super::session::{
    AssessmentSession, BookingStart, RoundTicket, SessionError, SessionId, SessionView,
};

/// Service composing the session store and the decision engine.
///
/// Each call reserves the session, runs the engine without holding any lock, then applies the
/// result only if the reservation is still current.
pub struct TriageService<S, O, B> {
    store: Arc<S>,
    engine: Arc<TriageEngine<O, B>>,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("session-{id:06}"))
}

impl<S, O, B> TriageService<S, O, B>
where
    S: SessionStore + 'static,
    O: ScoringOracle + 'static,
    B: AppointmentBooker + 'static,
{
    pub fn new(
        store: Arc<S>,
        oracle: Arc<O>,
        booker: Arc<B>,
        classifier: DecisionClassifier,
    ) -> Self {
        let engine = Arc::new(TriageEngine::new(oracle, booker, classifier));
        Self { store, engine }
    }

    pub fn engine(&self) -> &TriageEngine<O, B> {
        &self.engine
    }

    /// Open an empty session.
    pub fn create_session(&self) -> Result<SessionView, TriageServiceError> {
        let session = AssessmentSession::new(next_session_id());
        let view = session.view();
        self.store.insert(session)?;
        info!(session_id = %view.session_id.0, "triage session opened");
        Ok(view)
    }

    /// Run a first-round assessment. Clears any earlier decision and booking.
    pub async fn assess(
        &self,
        id: &SessionId,
        profile: PatientProfile,
        situation: String,
    ) -> Result<SessionView, TriageServiceError> {
        let ticket = self
            .store
            .update(id, |session| session.begin_assessment(profile, situation))??;

        let result = self
            .engine
            .assess(&ticket.profile, &ticket.situation)
            .await
            .map(|decision| (ticket.situation.clone(), decision));

        self.finish_round(id, ticket, result)
    }

    /// Fold a follow-up answer into the current situation and run a new round.
    pub async fn reassess(
        &self,
        id: &SessionId,
        answer: String,
    ) -> Result<SessionView, TriageServiceError> {
        let ticket = self
            .store
            .update(id, |session| session.begin_reassessment(answer))??;

        let answer = ticket.answer.as_deref().unwrap_or_default();
        let result = self
            .engine
            .reassess(&ticket.profile, &ticket.situation, answer)
            .await;

        self.finish_round(id, ticket, result)
    }

    /// Book an appointment for the latest decision. Repeat calls return the same confirmation.
    pub async fn book_appointment(
        &self,
        id: &SessionId,
    ) -> Result<BookingConfirmation, TriageServiceError> {
        let ticket = match self.store.update(id, |session| session.begin_booking())?? {
            BookingStart::AlreadyConfirmed(confirmation) => return Ok(confirmation),
            BookingStart::Pending(ticket) => ticket,
        };

        let result = self.engine.book_appointment().await;

        let applied = self
            .store
            .update(id, |session| session.complete_booking(ticket, result))?;
        if let Err(SessionError::Superseded) = &applied {
            warn!(session_id = %id.0, "discarding booking result for abandoned request");
        }
        Ok(applied?)
    }

    /// Abandon whatever call is in flight. Returns whether anything was abandoned.
    pub fn abandon(&self, id: &SessionId) -> Result<bool, TriageServiceError> {
        let abandoned = self.store.update(id, AssessmentSession::abandon)?;
        if abandoned {
            info!(session_id = %id.0, "in-flight request abandoned");
        }
        Ok(abandoned)
    }

    pub fn view(&self, id: &SessionId) -> Result<SessionView, TriageServiceError> {
        let session = self
            .store
            .fetch(id)?
            .ok_or(SessionStoreError::NotFound)?;
        Ok(session.view())
    }

    fn finish_round(
        &self,
        id: &SessionId,
        ticket: RoundTicket,
        result: Result<(String, AIDecision), TriageError>,
    ) -> Result<SessionView, TriageServiceError> {
        let applied = self.store.update(id, |session| {
            session
                .complete_round(ticket, result)
                .map(|_| session.view())
        })?;

        if let Err(SessionError::Superseded) = &applied {
            warn!(session_id = %id.0, "discarding stale assessment result");
        }
        Ok(applied?)
    }
}

/// Error raised by the triage service.
#[derive(Debug, thiserror::Error)]
pub enum TriageServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] SessionStoreError),
}

impl TriageServiceError {
    pub fn user_message(&self) -> String {
        match self {
            TriageServiceError::Session(err) => err.user_message(),
            TriageServiceError::Store(err) => err.to_string(),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::booking::BookingConfirmation;
use super::domain::{AIDecision, DecisionCategory, PatientProfile};
use super::error::{BookingError, TriageError};

/// Identifier wrapper for assessment sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Session-scoped state shared between the coordinator and the presentation layer.
///
/// Every round (assessment, follow-up, booking) takes the busy flag and a generation number.
/// Results are applied only while their generation is still current, so an abandoned call
/// can never overwrite a newer decision.
#[derive(Debug, Clone)]
pub struct AssessmentSession {
    id: SessionId,
    created_at: DateTime<Utc>,
    profile: PatientProfile,
    situations: Vec<String>,
    latest_decision: Option<AIDecision>,
    latest_error: Option<String>,
    booking: Option<BookingConfirmation>,
    busy: bool,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RoundKind {
    Initial,
    FollowUp,
}

/// Claim on an in-flight assessment round.
#[derive(Debug, Clone)]
pub struct RoundTicket {
    generation: u64,
    kind: RoundKind,
    pub profile: PatientProfile,
    /// Situation for an initial round, prior situation for a follow-up round.
    pub situation: String,
    pub answer: Option<String>,
}

/// Claim on an in-flight booking call.
#[derive(Debug, Clone, Copy)]
pub struct BookingTicket {
    generation: u64,
}

/// Outcome of asking to book.
#[derive(Debug, Clone)]
pub enum BookingStart {
    Pending(BookingTicket),
    AlreadyConfirmed(BookingConfirmation),
}

/// Session-level rejection or a failure recorded against the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("another request is still in progress for this session")]
    Busy,
    #[error("result discarded because the request was superseded")]
    Superseded,
    #[error("no follow-up questions are awaiting an answer")]
    NoPendingQuestions,
    #[error("the latest decision does not allow booking an appointment")]
    BookingNotPermitted,
    #[error(transparent)]
    Triage(#[from] TriageError),
    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Triage(err) => err.user_message(),
            SessionError::Booking(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

impl AssessmentSession {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            profile: PatientProfile::default(),
            situations: Vec::new(),
            latest_decision: None,
            latest_error: None,
            booking: None,
            busy: false,
            generation: 0,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn profile(&self) -> &PatientProfile {
        &self.profile
    }

    /// Situation texts in round order; the first entry is the original description.
    pub fn situation_history(&self) -> &[String] {
        &self.situations
    }

    pub fn current_situation(&self) -> Option<&str> {
        self.situations.last().map(String::as_str)
    }

    pub fn latest_decision(&self) -> Option<&AIDecision> {
        self.latest_decision.as_ref()
    }

    pub fn latest_error(&self) -> Option<&str> {
        self.latest_error.as_deref()
    }

    pub fn booking(&self) -> Option<&BookingConfirmation> {
        self.booking.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Start a first-round assessment with a fresh profile and situation.
    pub fn begin_assessment(
        &mut self,
        profile: PatientProfile,
        situation: String,
    ) -> Result<RoundTicket, SessionError> {
        self.ensure_idle()?;

        if situation.trim().is_empty() {
            return Err(self.reject(TriageError::EmptyInput));
        }

        Ok(self.open_round(RoundKind::Initial, profile, situation, None))
    }

    /// Start a follow-up round answering the latest decision's questions.
    pub fn begin_reassessment(&mut self, answer: String) -> Result<RoundTicket, SessionError> {
        self.ensure_idle()?;

        let awaiting_answers = matches!(
            self.latest_decision.as_ref().map(|decision| decision.category),
            Some(DecisionCategory::AskForMoreInfo)
        );
        let prior = match self.current_situation() {
            Some(prior) if awaiting_answers => prior.to_string(),
            _ => return Err(SessionError::NoPendingQuestions),
        };

        if answer.trim().is_empty() {
            return Err(self.reject(TriageError::EmptyFollowUp));
        }

        let profile = self.profile.clone();
        Ok(self.open_round(RoundKind::FollowUp, profile, prior, Some(answer)))
    }

    /// Apply a round's result if the ticket is still current.
    pub fn complete_round(
        &mut self,
        ticket: RoundTicket,
        result: Result<(String, AIDecision), TriageError>,
    ) -> Result<AIDecision, SessionError> {
        self.ensure_current(ticket.generation)?;
        self.busy = false;

        // A first round replaces the previous patient context even when it fails.
        if ticket.kind == RoundKind::Initial {
            self.profile = ticket.profile;
            self.situations.clear();
        }

        match result {
            Ok((situation, decision)) => {
                self.situations.push(situation);
                self.latest_decision = Some(decision.clone());
                Ok(decision)
            }
            Err(err) => {
                self.latest_error = Some(err.user_message());
                Err(SessionError::Triage(err))
            }
        }
    }

    /// Start a booking, or hand back the existing confirmation without booking again.
    pub fn begin_booking(&mut self) -> Result<BookingStart, SessionError> {
        self.ensure_idle()?;

        if let Some(confirmation) = &self.booking {
            return Ok(BookingStart::AlreadyConfirmed(confirmation.clone()));
        }

        let permitted = self
            .latest_decision
            .as_ref()
            .map(|decision| decision.category.permits_booking())
            .unwrap_or(false);
        if !permitted {
            return Err(SessionError::BookingNotPermitted);
        }

        self.generation += 1;
        self.busy = true;
        self.latest_error = None;
        Ok(BookingStart::Pending(BookingTicket {
            generation: self.generation,
        }))
    }

    /// Apply a booking result. Failures leave the decision in place.
    pub fn complete_booking(
        &mut self,
        ticket: BookingTicket,
        result: Result<BookingConfirmation, BookingError>,
    ) -> Result<BookingConfirmation, SessionError> {
        self.ensure_current(ticket.generation)?;
        self.busy = false;

        match result {
            Ok(confirmation) => {
                self.booking = Some(confirmation.clone());
                Ok(confirmation)
            }
            Err(err) => {
                self.latest_error = Some(err.user_message());
                Err(SessionError::Booking(err))
            }
        }
    }

    /// Give up on the in-flight call. Its result will be discarded when it arrives.
    pub fn abandon(&mut self) -> bool {
        if !self.busy {
            return false;
        }
        self.generation += 1;
        self.busy = false;
        true
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id.clone(),
            created_at: self.created_at,
            profile: self.profile.clone(),
            situation_history: self.situations.clone(),
            latest_decision: self.latest_decision.clone(),
            latest_error: self.latest_error.clone(),
            booking_confirmation: self.booking.clone(),
            busy: self.busy,
        }
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.busy {
            Err(SessionError::Busy)
        } else {
            Ok(())
        }
    }

    fn ensure_current(&self, generation: u64) -> Result<(), SessionError> {
        if generation == self.generation {
            Ok(())
        } else {
            Err(SessionError::Superseded)
        }
    }

    fn reject(&mut self, err: TriageError) -> SessionError {
        self.latest_error = Some(err.user_message());
        SessionError::Triage(err)
    }

    fn open_round(
        &mut self,
        kind: RoundKind,
        profile: PatientProfile,
        situation: String,
        answer: Option<String>,
    ) -> RoundTicket {
        self.generation += 1;
        self.busy = true;
        self.latest_decision = None;
        self.latest_error = None;
        self.booking = None;

        RoundTicket {
            generation: self.generation,
            kind,
            profile,
            situation,
            answer,
        }
    }
}

/// Read-only snapshot of a session for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub profile: PatientProfile,
    pub situation_history: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_decision: Option<AIDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_confirmation: Option<BookingConfirmation>,
    pub busy: bool,
}

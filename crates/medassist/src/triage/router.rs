use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::booking::AppointmentBooker;
use super::domain::PatientProfile;
use super::error::{OracleError, TriageError};
use super::oracle::ScoringOracle;
use super::reassessment::compose_answers;
use super::repository::{SessionStore, SessionStoreError};
use super::service::{TriageService, TriageServiceError};
use super::session::{SessionError, SessionId};

/// Body of a first-round assessment.
#[derive(Debug, Deserialize)]
pub struct AssessmentRequest {
    #[serde(default)]
    pub profile: PatientProfile,
    pub situation: String,
}

/// Body of a follow-up round: either one free-text answer or one answer per question.
#[derive(Debug, Default, Deserialize)]
pub struct FollowUpRequest {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub answers: Vec<String>,
}

/// Router builder exposing the session endpoints of the triage workflow.
pub fn triage_router<S, O, B>(service: Arc<TriageService<S, O, B>>) -> Router
where
    S: SessionStore + 'static,
    O: ScoringOracle + 'static,
    B: AppointmentBooker + 'static,
{
    Router::new()
        .route("/api/v1/triage/sessions", post(create_handler::<S, O, B>))
        .route(
            "/api/v1/triage/sessions/:session_id",
            get(status_handler::<S, O, B>),
        )
        .route(
            "/api/v1/triage/sessions/:session_id/assessments",
            post(assess_handler::<S, O, B>),
        )
        .route(
            "/api/v1/triage/sessions/:session_id/follow-ups",
            post(follow_up_handler::<S, O, B>),
        )
        .route(
            "/api/v1/triage/sessions/:session_id/booking",
            post(booking_handler::<S, O, B>),
        )
        .route(
            "/api/v1/triage/sessions/:session_id/abandon",
            post(abandon_handler::<S, O, B>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<S, O, B>(
    State(service): State<Arc<TriageService<S, O, B>>>,
) -> Response
where
    S: SessionStore + 'static,
    O: ScoringOracle + 'static,
    B: AppointmentBooker + 'static,
{
    match service.create_session() {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<S, O, B>(
    State(service): State<Arc<TriageService<S, O, B>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    O: ScoringOracle + 'static,
    B: AppointmentBooker + 'static,
{
    match service.view(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn assess_handler<S, O, B>(
    State(service): State<Arc<TriageService<S, O, B>>>,
    Path(session_id): Path<String>,
    Json(request): Json<AssessmentRequest>,
) -> Response
where
    S: SessionStore + 'static,
    O: ScoringOracle + 'static,
    B: AppointmentBooker + 'static,
{
    let id = SessionId(session_id);
    match service.assess(&id, request.profile, request.situation).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn follow_up_handler<S, O, B>(
    State(service): State<Arc<TriageService<S, O, B>>>,
    Path(session_id): Path<String>,
    Json(request): Json<FollowUpRequest>,
) -> Response
where
    S: SessionStore + 'static,
    O: ScoringOracle + 'static,
    B: AppointmentBooker + 'static,
{
    let id = SessionId(session_id);

    let answer = match request.answer {
        Some(answer) => answer,
        None => {
            let questions = match service.view(&id) {
                Ok(view) => view
                    .latest_decision
                    .and_then(|decision| decision.missing_info_questions)
                    .unwrap_or_default(),
                Err(err) => return error_response(err),
            };
            compose_answers(&questions, &request.answers)
        }
    };

    match service.reassess(&id, answer).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn booking_handler<S, O, B>(
    State(service): State<Arc<TriageService<S, O, B>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    O: ScoringOracle + 'static,
    B: AppointmentBooker + 'static,
{
    match service.book_appointment(&SessionId(session_id)).await {
        Ok(confirmation) => (StatusCode::OK, Json(confirmation)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn abandon_handler<S, O, B>(
    State(service): State<Arc<TriageService<S, O, B>>>,
    Path(session_id): Path<String>,
) -> Response
where
    S: SessionStore + 'static,
    O: ScoringOracle + 'static,
    B: AppointmentBooker + 'static,
{
    match service.abandon(&SessionId(session_id)) {
        Ok(abandoned) => (StatusCode::OK, Json(json!({ "abandoned": abandoned }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn status_for(err: &TriageServiceError) -> StatusCode {
    match err {
        TriageServiceError::Store(SessionStoreError::NotFound) => StatusCode::NOT_FOUND,
        TriageServiceError::Store(SessionStoreError::Conflict) => StatusCode::CONFLICT,
        TriageServiceError::Store(SessionStoreError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        TriageServiceError::Session(session) => match session {
            SessionError::Busy
            | SessionError::Superseded
            | SessionError::NoPendingQuestions
            | SessionError::BookingNotPermitted => StatusCode::CONFLICT,
            SessionError::Triage(TriageError::EmptyInput | TriageError::EmptyFollowUp) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            SessionError::Triage(
                TriageError::InvalidScore(_)
                | TriageError::Oracle(OracleError::Format(_) | OracleError::Unavailable(_)),
            ) => StatusCode::BAD_GATEWAY,
            SessionError::Booking(_) => StatusCode::SERVICE_UNAVAILABLE,
        },
    }
}

fn error_response(err: TriageServiceError) -> Response {
    let status = status_for(&err);
    let payload = json!({
        "error": err.user_message(),
    });
    (status, Json(payload)).into_response()
}

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;
use tokio::sync::Notify;

use crate::triage::booking::{AppointmentBooker, BookingReceipt};
use crate::triage::classifier::DecisionClassifier;
use crate::triage::domain::{PatientProfile, ScoringResult};
use crate::triage::error::{BookingError, OracleError};
use crate::triage::oracle::ScoringOracle;
use crate::triage::repository::{SessionStore, SessionStoreError};
use crate::triage::service::TriageService;
use crate::triage::session::{AssessmentSession, SessionId};

pub(super) type TestService = TriageService<MemorySessions, ScriptedOracle, CountingBooker>;

pub(super) fn profile() -> PatientProfile {
    PatientProfile {
        age: "34".to_string(),
        conditions: "asthma".to_string(),
        allergies: String::new(),
        medications: String::new(),
    }
}

pub(super) fn scores(confidence: f64, risk: f64) -> ScoringResult {
    ScoringResult {
        confidence,
        risk,
        is_adversarial: false,
        missing_critical_info: false,
        reasoning: "symptoms are mild and self-limiting".to_string(),
        missing_info_questions: Vec::new(),
    }
}

pub(super) fn missing_info(questions: &[&str]) -> ScoringResult {
    ScoringResult {
        missing_critical_info: true,
        reasoning: "duration and temperature unknown".to_string(),
        missing_info_questions: questions.iter().map(|q| q.to_string()).collect(),
        ..scores(60.0, 40.0)
    }
}

/// Oracle replaying a fixed script. The first call can be held until the gate opens.
#[derive(Default)]
pub(super) struct ScriptedOracle {
    responses: Mutex<VecDeque<Result<ScoringResult, OracleError>>>,
    calls: Mutex<Vec<(PatientProfile, String)>>,
    first_call_gate: Option<Arc<Notify>>,
}

impl ScriptedOracle {
    pub(super) fn new(responses: Vec<Result<ScoringResult, OracleError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub(super) fn gated(
        responses: Vec<Result<ScoringResult, OracleError>>,
        gate: Arc<Notify>,
    ) -> Self {
        Self {
            first_call_gate: Some(gate),
            ..Self::new(responses)
        }
    }

    pub(super) fn calls(&self) -> Vec<(PatientProfile, String)> {
        self.calls.lock().expect("oracle mutex poisoned").clone()
    }
}

#[async_trait]
impl ScoringOracle for ScriptedOracle {
    async fn score(
        &self,
        profile: &PatientProfile,
        situation: &str,
    ) -> Result<ScoringResult, OracleError> {
        let (call_index, response) = {
            let mut calls = self.calls.lock().expect("oracle mutex poisoned");
            calls.push((profile.clone(), situation.to_string()));
            let response = self
                .responses
                .lock()
                .expect("oracle mutex poisoned")
                .pop_front()
                .unwrap_or_else(|| Err(OracleError::Unavailable("script exhausted".to_string())));
            (calls.len(), response)
        };

        if call_index == 1 {
            if let Some(gate) = &self.first_call_gate {
                gate.notified().await;
            }
        }

        response
    }
}

/// Booker counting how often the scheduler is actually reached.
pub(super) struct CountingBooker {
    calls: AtomicUsize,
    outcome: Result<BookingReceipt, BookingError>,
}

impl CountingBooker {
    pub(super) fn confirming(id: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            outcome: Ok(BookingReceipt {
                success: true,
                confirmation_id: Some(id.to_string()),
            }),
        }
    }

    pub(super) fn failing(error: BookingError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            outcome: Err(error),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AppointmentBooker for CountingBooker {
    async fn book(&self) -> Result<BookingReceipt, BookingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

#[derive(Default)]
pub(super) struct MemorySessions {
    sessions: Mutex<HashMap<SessionId, AssessmentSession>>,
}

impl SessionStore for MemorySessions {
    fn insert(&self, session: AssessmentSession) -> Result<(), SessionStoreError> {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        if guard.contains_key(session.id()) {
            return Err(SessionStoreError::Conflict);
        }
        guard.insert(session.id().clone(), session);
        Ok(())
    }

    fn update<T, F>(&self, id: &SessionId, apply: F) -> Result<T, SessionStoreError>
    where
        F: FnOnce(&mut AssessmentSession) -> T,
    {
        let mut guard = self.sessions.lock().expect("session mutex poisoned");
        let session = guard.get_mut(id).ok_or(SessionStoreError::NotFound)?;
        Ok(apply(session))
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<AssessmentSession>, SessionStoreError> {
        let guard = self.sessions.lock().expect("session mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) fn build_service(
    oracle: ScriptedOracle,
    booker: CountingBooker,
) -> (Arc<TestService>, Arc<ScriptedOracle>, Arc<CountingBooker>) {
    let oracle = Arc::new(oracle);
    let booker = Arc::new(booker);
    let service = TriageService::new(
        Arc::new(MemorySessions::default()),
        oracle.clone(),
        booker.clone(),
        DecisionClassifier::default(),
    );
    (Arc::new(service), oracle, booker)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

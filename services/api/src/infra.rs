use medassist::triage::{AssessmentSession, SessionId, SessionStore, SessionStoreError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

type SessionMap = HashMap<SessionId, AssessmentSession>;

/// Process-local session storage. Sessions live only as long as the server.
#[derive(Default, Clone)]
pub(crate) struct InMemorySessionStore {
    sessions: Arc<Mutex<SessionMap>>,
}

impl InMemorySessionStore {
    fn lock(&self) -> Result<MutexGuard<'_, SessionMap>, SessionStoreError> {
        self.sessions
            .lock()
            .map_err(|_| SessionStoreError::Unavailable("session mutex poisoned".to_string()))
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: AssessmentSession) -> Result<(), SessionStoreError> {
        let mut guard = self.lock()?;
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
        let mut guard = self.lock()?;
        guard.get_mut(id).map(apply).ok_or(SessionStoreError::NotFound)
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<AssessmentSession>, SessionStoreError> {
        Ok(self.lock()?.get(id).cloned())
    }
}

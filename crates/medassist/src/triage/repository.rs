use super::session::{AssessmentSession, SessionId};

/// Storage abstraction for live sessions so the service can be exercised in isolation.
///
/// Sessions are ephemeral; implementations only need to hold them for the interaction.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: AssessmentSession) -> Result<(), SessionStoreError>;

    /// Mutate a session atomically. Implementations must not hold locks across `.await`.
    fn update<T, F>(&self, id: &SessionId, apply: F) -> Result<T, SessionStoreError>
    where
        F: FnOnce(&mut AssessmentSession) -> T;

    fn fetch(&self, id: &SessionId) -> Result<Option<AssessmentSession>, SessionStoreError>;
}

/// Error enumeration for session store failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

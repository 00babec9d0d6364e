//! Starts OAuth authorization attempts: backend session, browser hand-off,
//! pending-state registration.
//!
//! The manual-token path bypasses this component entirely.

use crate::domain::{AuthProvider, AuthSession, DomainError};
use crate::ports::{AuthWindowPort, BackendPort};
use crate::usecases::pending::PendingAuth;
use std::sync::Arc;
use tracing::{debug, info};

pub struct AuthSessionBroker {
    backend: Arc<dyn BackendPort>,
    window: Arc<dyn AuthWindowPort>,
    pending: Arc<PendingAuth>,
}

impl AuthSessionBroker {
    pub fn new(
        backend: Arc<dyn BackendPort>,
        window: Arc<dyn AuthWindowPort>,
        pending: Arc<PendingAuth>,
    ) -> Self {
        Self {
            backend,
            window,
            pending,
        }
    }

    /// Begin a new authorization attempt for an OAuth provider.
    ///
    /// Order matters: the window is opened before the pending state is
    /// registered, so a blocked window aborts the flow without leaving a
    /// pending attempt behind. Registering the new state supersedes any
    /// previous attempt immediately.
    pub async fn begin(&self, provider: AuthProvider) -> Result<AuthSession, DomainError> {
        if provider == AuthProvider::Email {
            return Err(DomainError::Validation(
                "the manual token path does not use an authorization window".to_string(),
            ));
        }

        let session = self
            .backend
            .create_auth_session(provider)
            .await
            .map_err(|e| DomainError::SessionCreation(e.detail()))?;

        self.window.open(&session.auth_url)?;

        if let Some(superseded) = self.pending.replace(session.state.clone(), provider) {
            debug!(state = %superseded.state, "superseded a pending authorization attempt");
        }
        info!(%provider, "authorization window opened, waiting for the callback");

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::support::{MockWindow, ScriptedBackend, sample_session};

    fn broker(
        backend: Arc<ScriptedBackend>,
        window: Arc<MockWindow>,
        pending: Arc<PendingAuth>,
    ) -> AuthSessionBroker {
        AuthSessionBroker::new(backend, window, pending)
    }

    #[tokio::test]
    async fn begin_registers_the_session_state_as_pending() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_auth_session(Ok(sample_session("abc123")));
        let window = Arc::new(MockWindow::new());
        let pending = Arc::new(PendingAuth::new());

        let session = broker(backend, Arc::clone(&window), Arc::clone(&pending))
            .begin(AuthProvider::Google)
            .await
            .unwrap();

        assert_eq!(session.state, "abc123");
        assert_eq!(pending.current_state().as_deref(), Some("abc123"));
        assert_eq!(
            window.opened.lock().unwrap().as_slice(),
            ["https://auth.example/abc123"]
        );
    }

    #[tokio::test]
    async fn begin_twice_supersedes_the_first_attempt() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_auth_session(Ok(sample_session("first")));
        backend.push_auth_session(Ok(sample_session("second")));
        let window = Arc::new(MockWindow::new());
        let pending = Arc::new(PendingAuth::new());
        let broker = broker(backend, window, Arc::clone(&pending));

        broker.begin(AuthProvider::Google).await.unwrap();
        broker.begin(AuthProvider::Apple).await.unwrap();

        assert_eq!(pending.current_state().as_deref(), Some("second"));
        assert!(pending.accept("first").is_none());
    }

    #[tokio::test]
    async fn blocked_window_aborts_without_registering_a_pending_state() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_auth_session(Ok(sample_session("abc123")));
        let window = Arc::new(MockWindow::blocked());
        let pending = Arc::new(PendingAuth::new());

        let err = broker(backend, window, Arc::clone(&pending))
            .begin(AuthProvider::Google)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::PopupBlocked(_)));
        assert!(!pending.is_pending());
    }

    #[tokio::test]
    async fn begin_with_email_is_rejected_locally() {
        let backend = Arc::new(ScriptedBackend::new());
        let window = Arc::new(MockWindow::new());
        let pending = Arc::new(PendingAuth::new());
        let broker = broker(Arc::clone(&backend), window, pending);

        let err = broker.begin(AuthProvider::Email).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert!(backend.calls.lock().unwrap().is_empty(), "no backend call");
    }

    #[tokio::test]
    async fn session_creation_failure_maps_to_the_session_error() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_auth_session(Err("backend unreachable".to_string()));
        let window = Arc::new(MockWindow::new());
        let pending = Arc::new(PendingAuth::new());

        let err = broker(backend, Arc::clone(&window), Arc::clone(&pending))
            .begin(AuthProvider::Google)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::SessionCreation(_)));
        assert!(window.opened.lock().unwrap().is_empty());
        assert!(!pending.is_pending());
    }
}

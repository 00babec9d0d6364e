//! Consumes authorization callback messages and resolves the pending attempt.
//!
//! Runs as a spawned task owning the channel receiver for the component's
//! lifetime; the handle aborts the task on drop so a stale listener can never
//! react to messages after its owner is gone.

use crate::domain::{ConnectionResult, DomainError, OauthCallback, StoredConnection};
use crate::ports::{AuthWindowPort, BackendPort, ConnectionStorePort};
use crate::usecases::pending::{PendingAttempt, PendingAuth};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Terminal outcome of one authorization attempt, published to whoever is
/// waiting on the flow.
#[derive(Debug)]
pub enum AuthOutcome {
    Finalized(ConnectionResult),
    Rejected(DomainError),
}

pub struct AuthResultListener {
    backend: Arc<dyn BackendPort>,
    store: Arc<dyn ConnectionStorePort>,
    window: Arc<dyn AuthWindowPort>,
    pending: Arc<PendingAuth>,
    outcomes: mpsc::UnboundedSender<AuthOutcome>,
}

impl AuthResultListener {
    pub fn new(
        backend: Arc<dyn BackendPort>,
        store: Arc<dyn ConnectionStorePort>,
        window: Arc<dyn AuthWindowPort>,
        pending: Arc<PendingAuth>,
        outcomes: mpsc::UnboundedSender<AuthOutcome>,
    ) -> Self {
        Self {
            backend,
            store,
            window,
            pending,
            outcomes,
        }
    }

    /// Spawn the consumer task. Messages are processed one at a time in
    /// arrival order; the task ends when the channel closes, or is aborted
    /// when the returned handle drops.
    pub fn spawn(self, mut rx: mpsc::UnboundedReceiver<OauthCallback>) -> ListenerHandle {
        let task = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                self.handle(msg).await;
            }
            debug!("callback channel closed, listener finished");
        });
        ListenerHandle { task }
    }

    /// Process one callback message.
    ///
    /// `accept` clears the pending slot in the same locked operation that
    /// matches the state, before any suspension point — a duplicate message
    /// for the same state finds the slot empty and is discarded, so an
    /// attempt can never be finalized twice.
    pub async fn handle(&self, msg: OauthCallback) {
        let Some(attempt) = self.pending.accept(&msg.state) else {
            debug!(state = %msg.state, "discarding callback with no matching pending attempt");
            return;
        };

        if msg.success {
            self.finalize(attempt, &msg.state).await;
        } else {
            self.window.close();
            let message = msg
                .message
                .unwrap_or_else(|| "The Dropbox authorization was interrupted.".to_string());
            warn!(state = %msg.state, %message, "authorization rejected");
            self.publish(AuthOutcome::Rejected(DomainError::AuthDenied(message)));
        }
    }

    async fn finalize(&self, attempt: PendingAttempt, state: &str) {
        match self.backend.fetch_connection(state).await {
            Ok(result) => {
                let record = StoredConnection {
                    provider: attempt.provider,
                    state: Some(state.to_string()),
                    result: Some(result.clone()),
                };
                if let Err(e) = self.store.save(&record).await {
                    warn!(error = %e, "could not persist the connection; it will not survive a restart");
                }
                info!(provider = %attempt.provider, "authorization finalized");
                self.publish(AuthOutcome::Finalized(result));
            }
            Err(e) => {
                warn!(error = %e, "authorization confirmed but the connection could not be fetched");
                self.publish(AuthOutcome::Rejected(DomainError::Backend(format!(
                    "authorization succeeded but the connection could not be fetched: {}",
                    e.detail()
                ))));
            }
        }
        self.window.close();
    }

    fn publish(&self, outcome: AuthOutcome) {
        if self.outcomes.send(outcome).is_err() {
            debug!("outcome receiver dropped, nobody is waiting for this flow");
        }
    }
}

/// Owns the spawned listener task; aborts it on drop.
pub struct ListenerHandle {
    task: JoinHandle<()>,
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

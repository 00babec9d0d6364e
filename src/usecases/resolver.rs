//! Restores the persisted connection on startup.
//!
//! Manual-token records replay their cached result with no network call;
//! OAuth records are re-resolved against the backend to detect expiry.

use crate::domain::{AuthProvider, ConnectionResult, DomainError, StoredConnection};
use crate::ports::{BackendPort, ConnectionStorePort};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a startup restore.
#[derive(Debug)]
pub enum Restored {
    /// No usable record on disk; the user must connect.
    None,
    Connected(ConnectionResult),
}

pub struct ConnectionResolver {
    backend: Arc<dyn BackendPort>,
    store: Arc<dyn ConnectionStorePort>,
}

impl ConnectionResolver {
    pub fn new(backend: Arc<dyn BackendPort>, store: Arc<dyn ConnectionStorePort>) -> Self {
        Self { backend, store }
    }

    /// Restore the prior connection, if any.
    ///
    /// An OAuth record whose state no longer resolves is cleared from disk and
    /// surfaced as a stale-connection error — never retried silently.
    pub async fn restore(&self) -> Result<Restored, DomainError> {
        let record = match self.store.load().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "could not read the stored connection");
                None
            }
        };
        let Some(record) = record else {
            return Ok(Restored::None);
        };

        match record {
            StoredConnection {
                provider: AuthProvider::Email,
                result: Some(result),
                ..
            } => {
                // Manual-token connections are assumed valid until forgotten.
                info!("restored manual-token connection from disk");
                Ok(Restored::Connected(result))
            }
            StoredConnection {
                provider,
                state: Some(state),
                ..
            } => match self.backend.fetch_connection(&state).await {
                Ok(result) => {
                    let refreshed = StoredConnection {
                        provider,
                        state: Some(state),
                        result: Some(result.clone()),
                    };
                    if let Err(e) = self.store.save(&refreshed).await {
                        warn!(error = %e, "could not re-persist the refreshed connection");
                    }
                    info!(%provider, "restored OAuth connection from the backend");
                    Ok(Restored::Connected(result))
                }
                Err(e) => {
                    debug!(error = %e, "stored state no longer resolves");
                    self.forget().await;
                    Err(DomainError::StaleConnection(
                        "the Dropbox session has expired, please reconnect".to_string(),
                    ))
                }
            },
            _ => {
                // Record with neither a cached result nor a state: nothing to resolve.
                Ok(Restored::None)
            }
        }
    }

    /// Forget the persisted connection. Failures are logged and swallowed —
    /// the worst case is a stale record resurfacing next run.
    pub async fn forget(&self) {
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "could not remove the stored connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::support::{MemoryStore, ScriptedBackend, sample_result};

    fn resolver(backend: Arc<ScriptedBackend>, store: Arc<MemoryStore>) -> ConnectionResolver {
        ConnectionResolver::new(backend, store)
    }

    #[tokio::test]
    async fn no_record_restores_to_none() {
        let backend = Arc::new(ScriptedBackend::new());
        let store = Arc::new(MemoryStore::new());

        let restored = resolver(Arc::clone(&backend), store).restore().await.unwrap();

        assert!(matches!(restored, Restored::None));
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn manual_record_replays_cached_result_with_zero_backend_calls() {
        let backend = Arc::new(ScriptedBackend::new());
        let store = Arc::new(MemoryStore::new());
        *store.record.lock().unwrap() = Some(StoredConnection {
            provider: AuthProvider::Email,
            state: None,
            result: Some(sample_result(None)),
        });

        let restored = resolver(Arc::clone(&backend), store).restore().await.unwrap();

        match restored {
            Restored::Connected(result) => assert_eq!(result.app_id, "baby-tracker"),
            other => panic!("unexpected restore: {other:?}"),
        }
        assert!(backend.calls.lock().unwrap().is_empty(), "no network call");
    }

    #[tokio::test]
    async fn oauth_record_is_refreshed_and_repersisted() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_connection(Ok(sample_result(Some("abc123"))));
        let store = Arc::new(MemoryStore::new());
        *store.record.lock().unwrap() = Some(StoredConnection {
            provider: AuthProvider::Google,
            state: Some("abc123".into()),
            result: None,
        });

        let restored = resolver(backend, Arc::clone(&store)).restore().await.unwrap();

        assert!(matches!(restored, Restored::Connected(_)));
        let saved = store.record.lock().unwrap().clone().unwrap();
        assert_eq!(saved.provider, AuthProvider::Google);
        assert!(saved.result.is_some(), "refreshed snapshot re-persisted");
    }

    #[tokio::test]
    async fn expired_oauth_record_is_cleared_and_surfaced_as_stale() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_connection(Err("unknown state".into()));
        let store = Arc::new(MemoryStore::new());
        *store.record.lock().unwrap() = Some(StoredConnection {
            provider: AuthProvider::Google,
            state: Some("abc123".into()),
            result: Some(sample_result(Some("abc123"))),
        });

        let err = resolver(backend, Arc::clone(&store)).restore().await.unwrap_err();

        assert!(matches!(err, DomainError::StaleConnection(_)));
        assert!(store.record.lock().unwrap().is_none(), "record cleared");
    }

    #[tokio::test]
    async fn forget_clears_the_store_so_a_later_restore_finds_nothing() {
        let backend = Arc::new(ScriptedBackend::new());
        let store = Arc::new(MemoryStore::new());
        *store.record.lock().unwrap() = Some(StoredConnection {
            provider: AuthProvider::Email,
            state: None,
            result: Some(sample_result(None)),
        });
        let resolver = resolver(backend, Arc::clone(&store));

        resolver.forget().await;
        let restored = resolver.restore().await.unwrap();

        assert!(matches!(restored, Restored::None));
        assert!(store.record.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn unusable_record_restores_to_none_without_network() {
        let backend = Arc::new(ScriptedBackend::new());
        let store = Arc::new(MemoryStore::new());
        // OAuth provider but no state to re-query.
        *store.record.lock().unwrap() = Some(StoredConnection {
            provider: AuthProvider::Google,
            state: None,
            result: None,
        });

        let restored = resolver(Arc::clone(&backend), store).restore().await.unwrap();

        assert!(matches!(restored, Restored::None));
        assert!(backend.calls.lock().unwrap().is_empty());
    }
}

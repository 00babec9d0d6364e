//! Manual-token connection path: local validation, backend connect, persist.
//!
//! Bypasses the authorization window entirely. The submitted token is sent to
//! the backend once and never persisted locally.

use crate::domain::{
    AuthProvider, ConnectionResult, DomainError, ManualConnectRequest, StoredConnection,
};
use crate::ports::{BackendPort, ConnectionStorePort};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ManualLinkService {
    backend: Arc<dyn BackendPort>,
    store: Arc<dyn ConnectionStorePort>,
}

impl ManualLinkService {
    pub fn new(backend: Arc<dyn BackendPort>, store: Arc<dyn ConnectionStorePort>) -> Self {
        Self { backend, store }
    }

    /// Connect with a manually supplied access token.
    ///
    /// Validation happens locally first: an empty app selection or a blank
    /// token is rejected with zero backend calls.
    pub async fn connect(
        &self,
        request: ManualConnectRequest,
    ) -> Result<ConnectionResult, DomainError> {
        if request.app_id.trim().is_empty() {
            return Err(DomainError::Validation(
                "select an application to connect first".to_string(),
            ));
        }
        if request.access_token.trim().is_empty() {
            return Err(DomainError::Validation(
                "paste a Dropbox access token, or connect with Google / Apple".to_string(),
            ));
        }

        let request = ManualConnectRequest {
            app_id: request.app_id,
            account_email: request
                .account_email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            access_token: request.access_token.trim().to_string(),
        };

        let result = self.backend.connect_with_token(&request).await?;

        let record = StoredConnection {
            provider: AuthProvider::Email,
            state: None,
            result: Some(result.clone()),
        };
        if let Err(e) = self.store.save(&record).await {
            warn!(error = %e, "could not persist the manual connection; it will not survive a restart");
        }
        info!(app_id = %request.app_id, "connected with a manual token");

        Ok(result)
    }
}

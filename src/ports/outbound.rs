//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    AuthProvider, AuthSession, ConnectionResult, DomainError, ImportSummaryItem, IntegrationApp,
    ManualConnectRequest, StoredConnection,
};

/// Backend collaborator. Issues OAuth sessions, resolves connection results,
/// and performs the actual backup-content import/merge.
#[async_trait::async_trait]
pub trait BackendPort: Send + Sync {
    /// List applications whose backups can be imported (app-selection step).
    async fn list_apps(&self) -> Result<Vec<IntegrationApp>, DomainError>;

    /// Request a new authorization session for an OAuth provider.
    async fn create_auth_session(
        &self,
        provider: AuthProvider,
    ) -> Result<AuthSession, DomainError>;

    /// Fetch the resolved connection for a correlation state. Fails when the
    /// state is expired or unknown.
    async fn fetch_connection(&self, state: &str) -> Result<ConnectionResult, DomainError>;

    /// Connect with a manually supplied access token (no OAuth handshake).
    async fn connect_with_token(
        &self,
        request: &ManualConnectRequest,
    ) -> Result<ConnectionResult, DomainError>;

    /// Import one backup into the local dataset. The backend merges
    /// idempotently and returns per-date counts.
    async fn import_backup(
        &self,
        state: &str,
        path: &str,
    ) -> Result<Vec<ImportSummaryItem>, DomainError>;
}

/// Durable persistence of the last known connection record. Single slot,
/// no network.
#[async_trait::async_trait]
pub trait ConnectionStorePort: Send + Sync {
    /// Write the full record atomically, overwriting any prior value.
    async fn save(&self, record: &StoredConnection) -> Result<(), DomainError>;

    /// Last saved record, or `None`. A missing or unparsable entry is absent,
    /// not an error.
    async fn load(&self) -> Result<Option<StoredConnection>, DomainError>;

    /// Remove the record unconditionally. Removing an absent record succeeds.
    async fn clear(&self) -> Result<(), DomainError>;
}

/// The external browsing context used to complete the authorization handshake.
///
/// `open` failing maps to the popup-blocked error; `close` must be called on
/// every terminal transition of the flow so no window is left dangling.
pub trait AuthWindowPort: Send + Sync {
    fn open(&self, url: &str) -> Result<(), DomainError>;

    fn close(&self);
}

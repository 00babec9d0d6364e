//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these. Every variant is converted
//! into an inline user-visible message at the UI boundary; none may terminate
//! the program, and none is retried automatically.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Backend request failed: {0}")]
    Backend(String),

    #[error("Could not start the authorization session: {0}")]
    SessionCreation(String),

    #[error("Could not open the authorization window: {0}")]
    PopupBlocked(String),

    #[error("Authorization was denied: {0}")]
    AuthDenied(String),

    #[error("Saved session is no longer valid: {0}")]
    StaleConnection(String),

    #[error("Backup import failed: {0}")]
    Import(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Connection store error: {0}")]
    Store(String),

    #[error("Callback listener error: {0}")]
    Callback(String),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl DomainError {
    /// Inner detail without the variant prefix. Used when a flow boundary
    /// rewraps an infrastructure error into its user-facing variant.
    pub fn detail(self) -> String {
        match self {
            DomainError::Backend(m)
            | DomainError::SessionCreation(m)
            | DomainError::PopupBlocked(m)
            | DomainError::AuthDenied(m)
            | DomainError::StaleConnection(m)
            | DomainError::Import(m)
            | DomainError::Validation(m)
            | DomainError::Store(m)
            | DomainError::Callback(m)
            | DomainError::Prompt(m) => m,
        }
    }
}

//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;

pub use entities::{
    AppStatus, AuthProvider, AuthSession, BackupInfo, ConnectionResult, ConnectionStatus,
    ImportSummaryItem, IntegrationApp, ManualConnectRequest, OauthCallback, StoredConnection,
};
pub use errors::DomainError;

//! Domain entities. Pure data structures for the core business.
//!
//! Wire shapes match the backend API (camelCase JSON) — mapped 1:1 by serde.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity provider used to authorize the Dropbox link.
///
/// `Email` is the manual-token path: the user pastes an access token and the
/// windowed authorization handshake is bypassed entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Google,
    Apple,
    Email,
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthProvider::Google => write!(f, "google"),
            AuthProvider::Apple => write!(f, "apple"),
            AuthProvider::Email => write!(f, "email"),
        }
    }
}

/// One authorization attempt, as issued by the backend. Ephemeral: lives only
/// until the attempt resolves or is superseded, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    /// URL the user must visit to grant access.
    pub auth_url: String,
    /// Correlation state binding this attempt to exactly one accepted callback.
    pub state: String,
}

/// Callback message produced by the authorization redirect and consumed by the
/// result listener. Carries the state it is responding to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OauthCallback {
    pub state: String,
    pub success: bool,
    /// Provider-supplied failure detail, when there is one.
    pub message: Option<String>,
}

/// An application whose backups can be discovered, for the selection step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationApp {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub description: String,
    pub status: AppStatus,
    pub requires_two_factor: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppStatus {
    Beta,
    Ready,
}

/// A discoverable backup artifact in the linked account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub id: String,
    pub file_name: String,
    pub size_label: String,
    pub size_in_bytes: u64,
    pub last_modified: DateTime<Utc>,
    pub note: String,
    /// Stable identifier used for import requests and in-flight tracking.
    pub path_lower: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
}

/// Resolved connection as returned by the backend. Treated as opaque: replaced
/// wholesale on each (re)connection, never partially mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResult {
    pub status: ConnectionStatus,
    pub app_id: String,
    pub app_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<AuthProvider>,
    /// OAuth correlation state. Absent for manual-token connections, which
    /// therefore cannot import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub available_backups: Vec<BackupInfo>,
    pub message: String,
}

/// Payload for the manual-token connection path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualConnectRequest {
    pub app_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_email: Option<String>,
    pub access_token: String,
}

/// Per-date counts returned by a backup import. Displayed verbatim; the
/// backend owns de-duplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummaryItem {
    pub date: String,
    pub new_entries: u32,
    pub skipped: u32,
}

/// The unit persisted durably. At most one instance exists at a time
/// (single storage slot); absent or a single coherent snapshot, never partial.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConnection {
    pub provider: AuthProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ConnectionResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_result_deserializes_from_the_backend_wire_format() {
        let json = r#"{
            "status": "connected",
            "appId": "baby-tracker",
            "appName": "Baby Tracker",
            "accountEmail": "parent@example.com",
            "provider": "google",
            "state": "abc123",
            "availableBackups": [{
                "id": "bk-1",
                "fileName": "2024-01.json",
                "sizeLabel": "1.2 MB",
                "sizeInBytes": 1258291,
                "lastModified": "2024-01-31T08:30:00Z",
                "note": "January export",
                "pathLower": "/apps/tracker/2024-01.json"
            }],
            "message": "Connected"
        }"#;

        let result: ConnectionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.app_id, "baby-tracker");
        assert_eq!(result.provider, Some(AuthProvider::Google));
        assert_eq!(result.state.as_deref(), Some("abc123"));
        assert_eq!(result.available_backups.len(), 1);
        assert_eq!(
            result.available_backups[0].path_lower,
            "/apps/tracker/2024-01.json"
        );
    }

    #[test]
    fn optional_fields_may_be_absent_on_the_wire() {
        let json = r#"{
            "status": "connected",
            "appId": "baby-tracker",
            "appName": "Baby Tracker",
            "availableBackups": [],
            "message": "Connected"
        }"#;

        let result: ConnectionResult = serde_json::from_str(json).unwrap();
        assert!(result.account_email.is_none());
        assert!(result.provider.is_none());
        assert!(result.state.is_none());
    }

    #[test]
    fn stored_connection_serializes_camel_case_without_empty_options() {
        let record = StoredConnection {
            provider: AuthProvider::Email,
            state: None,
            result: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({ "provider": "email" }));
    }
}

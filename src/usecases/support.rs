//! Test doubles for the port traits, shared by the use-case tests.
//!
//! Scripted responses are queued per endpoint; every backend call is recorded
//! so tests can assert "zero backend calls" properties.

use crate::domain::{
    AuthProvider, AuthSession, BackupInfo, ConnectionResult, ConnectionStatus, DomainError,
    ImportSummaryItem, IntegrationApp, ManualConnectRequest, StoredConnection,
};
use crate::ports::{AuthWindowPort, BackendPort, ConnectionStorePort};
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

type Scripted<T> = Mutex<VecDeque<Result<T, String>>>;

pub(crate) struct ScriptedBackend {
    pub calls: Mutex<Vec<String>>,
    pub apps: Mutex<Vec<IntegrationApp>>,
    auth_sessions: Scripted<AuthSession>,
    connections: Scripted<ConnectionResult>,
    manual_results: Scripted<ConnectionResult>,
    import_results: Scripted<Vec<ImportSummaryItem>>,
    /// When set, `import_backup` parks on this gate after recording the call,
    /// to hold a request in flight while a test probes the coordinator.
    import_gate: Option<Arc<Notify>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            apps: Mutex::new(Vec::new()),
            auth_sessions: Mutex::new(VecDeque::new()),
            connections: Mutex::new(VecDeque::new()),
            manual_results: Mutex::new(VecDeque::new()),
            import_results: Mutex::new(VecDeque::new()),
            import_gate: None,
        }
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            import_gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn push_auth_session(&self, response: Result<AuthSession, String>) {
        self.auth_sessions.lock().unwrap().push_back(response);
    }

    pub fn push_connection(&self, response: Result<ConnectionResult, String>) {
        self.connections.lock().unwrap().push_back(response);
    }

    pub fn push_manual_result(&self, response: Result<ConnectionResult, String>) {
        self.manual_results.lock().unwrap().push_back(response);
    }

    pub fn push_import_result(&self, response: Result<Vec<ImportSummaryItem>, String>) {
        self.import_results.lock().unwrap().push_back(response);
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn next<T>(queue: &Scripted<T>, endpoint: &str) -> Result<T, DomainError> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted call to {endpoint}"))
            .map_err(DomainError::Backend)
    }
}

#[async_trait::async_trait]
impl BackendPort for ScriptedBackend {
    async fn list_apps(&self) -> Result<Vec<IntegrationApp>, DomainError> {
        self.record("list_apps".to_string());
        Ok(self.apps.lock().unwrap().clone())
    }

    async fn create_auth_session(
        &self,
        provider: AuthProvider,
    ) -> Result<AuthSession, DomainError> {
        self.record(format!("create_auth_session {provider}"));
        Self::next(&self.auth_sessions, "create_auth_session")
    }

    async fn fetch_connection(&self, state: &str) -> Result<ConnectionResult, DomainError> {
        self.record(format!("fetch_connection {state}"));
        Self::next(&self.connections, "fetch_connection")
    }

    async fn connect_with_token(
        &self,
        request: &ManualConnectRequest,
    ) -> Result<ConnectionResult, DomainError> {
        self.record(format!("connect_with_token {}", request.app_id));
        Self::next(&self.manual_results, "connect_with_token")
    }

    async fn import_backup(
        &self,
        state: &str,
        path: &str,
    ) -> Result<Vec<ImportSummaryItem>, DomainError> {
        self.record(format!("import_backup {state} {path}"));
        if let Some(gate) = &self.import_gate {
            gate.notified().await;
        }
        Self::next(&self.import_results, "import_backup")
    }
}

pub(crate) struct MemoryStore {
    pub record: Mutex<Option<StoredConnection>>,
    pub fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            record: Mutex::new(None),
            fail_saves: AtomicBool::new(false),
        }
    }
}

#[async_trait::async_trait]
impl ConnectionStorePort for MemoryStore {
    async fn save(&self, record: &StoredConnection) -> Result<(), DomainError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(DomainError::Store("disk full".to_string()));
        }
        *self.record.lock().unwrap() = Some(record.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<StoredConnection>, DomainError> {
        Ok(self.record.lock().unwrap().clone())
    }

    async fn clear(&self) -> Result<(), DomainError> {
        *self.record.lock().unwrap() = None;
        Ok(())
    }
}

pub(crate) struct MockWindow {
    pub opened: Mutex<Vec<String>>,
    pub closed: AtomicUsize,
    blocked: bool,
}

impl MockWindow {
    pub fn new() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            closed: AtomicUsize::new(0),
            blocked: false,
        }
    }

    pub fn blocked() -> Self {
        Self {
            blocked: true,
            ..Self::new()
        }
    }
}

impl AuthWindowPort for MockWindow {
    fn open(&self, url: &str) -> Result<(), DomainError> {
        if self.blocked {
            return Err(DomainError::PopupBlocked(
                "the browser refused to open".to_string(),
            ));
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) fn sample_session(state: &str) -> AuthSession {
    AuthSession {
        auth_url: format!("https://auth.example/{state}"),
        state: state.to_string(),
    }
}

pub(crate) fn sample_backup(path: &str) -> BackupInfo {
    BackupInfo {
        id: "bk-1".to_string(),
        file_name: "2024-01.json".to_string(),
        size_label: "1.2 MB".to_string(),
        size_in_bytes: 1_258_291,
        last_modified: Utc.with_ymd_and_hms(2024, 1, 31, 8, 30, 0).unwrap(),
        note: "January export".to_string(),
        path_lower: path.to_string(),
    }
}

pub(crate) fn sample_result(state: Option<&str>) -> ConnectionResult {
    ConnectionResult {
        status: ConnectionStatus::Connected,
        app_id: "baby-tracker".to_string(),
        app_name: "Baby Tracker".to_string(),
        account_email: Some("parent@example.com".to_string()),
        provider: state.map(|_| AuthProvider::Google),
        state: state.map(str::to_string),
        available_backups: vec![sample_backup("/apps/tracker/2024-01.json")],
        message: "Connected".to_string(),
    }
}

pub(crate) fn sample_summary() -> Vec<ImportSummaryItem> {
    vec![ImportSummaryItem {
        date: "2024-01-10".to_string(),
        new_entries: 3,
        skipped: 1,
    }]
}


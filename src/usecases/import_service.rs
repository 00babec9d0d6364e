//! Drives backup imports through the backend, one in-flight request per
//! backup path.
//!
//! The in-flight set is the source of truth for "is this path busy"; the UI
//! disabling its trigger is cosmetic. The returned per-date summary is stored
//! verbatim — idempotent merging is the backend's contract, nothing is
//! recomputed here.

use crate::domain::{BackupInfo, DomainError, ImportSummaryItem};
use crate::ports::BackendPort;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Outcome of an import request at the coordinator boundary.
#[derive(Debug)]
pub enum ImportOutcome {
    Imported(Vec<ImportSummaryItem>),
    /// An import for this path is already in flight; the request was not issued.
    AlreadyRunning,
    /// The connection has no OAuth state (manual-token link); reconnect to import.
    ReauthRequired,
}

pub struct BackupImportCoordinator {
    backend: Arc<dyn BackendPort>,
    in_flight: Mutex<HashSet<String>>,
    latest: Mutex<Option<Vec<ImportSummaryItem>>>,
}

impl BackupImportCoordinator {
    pub fn new(backend: Arc<dyn BackendPort>) -> Self {
        Self {
            backend,
            in_flight: Mutex::new(HashSet::new()),
            latest: Mutex::new(None),
        }
    }

    /// Import one backup.
    ///
    /// A second call for a path already in flight is a no-op. On success the
    /// summary replaces the latest result; on failure the previous summary is
    /// left untouched. The in-flight marker is cleared by a guard on every
    /// exit, including panics and cancellation.
    pub async fn import_backup(
        &self,
        connection_state: Option<&str>,
        backup: &BackupInfo,
    ) -> Result<ImportOutcome, DomainError> {
        let Some(state) = connection_state else {
            return Ok(ImportOutcome::ReauthRequired);
        };

        let Some(_guard) = self.try_mark(&backup.path_lower) else {
            debug!(path = %backup.path_lower, "import already in flight for this path");
            return Ok(ImportOutcome::AlreadyRunning);
        };

        info!(path = %backup.path_lower, "importing backup");
        match self.backend.import_backup(state, &backup.path_lower).await {
            Ok(summary) => {
                *lock(&self.latest) = Some(summary.clone());
                info!(path = %backup.path_lower, dates = summary.len(), "backup imported");
                Ok(ImportOutcome::Imported(summary))
            }
            Err(e) => Err(DomainError::Import(e.detail())),
        }
    }

    /// The most recent successful import summary, verbatim.
    pub fn last_summary(&self) -> Option<Vec<ImportSummaryItem>> {
        lock(&self.latest).clone()
    }

    fn try_mark(&self, path: &str) -> Option<InFlightGuard<'_>> {
        let mut set = lock(&self.in_flight);
        if !set.insert(path.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            set: &self.in_flight,
            path: path.to_string(),
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes the path from the in-flight set when dropped.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    path: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::support::{ScriptedBackend, sample_backup, sample_summary};
    use tokio::sync::Notify;

    #[tokio::test]
    async fn summary_is_stored_verbatim() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_import_result(Ok(sample_summary()));
        let coordinator = BackupImportCoordinator::new(backend);
        let backup = sample_backup("/apps/tracker/2024-01.json");

        let outcome = coordinator
            .import_backup(Some("abc123"), &backup)
            .await
            .unwrap();

        match outcome {
            ImportOutcome::Imported(summary) => {
                assert_eq!(summary, sample_summary());
                assert_eq!(coordinator.last_summary().unwrap(), sample_summary());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_state_requires_reauth_without_a_backend_call() {
        let backend = Arc::new(ScriptedBackend::new());
        let coordinator = BackupImportCoordinator::new(Arc::clone(&backend) as _);
        let backup = sample_backup("/apps/tracker/2024-01.json");

        let outcome = coordinator.import_backup(None, &backup).await.unwrap();

        assert!(matches!(outcome, ImportOutcome::ReauthRequired));
        assert!(backend.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_import_for_the_same_path_is_a_no_op_while_in_flight() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend::gated(Arc::clone(&gate)));
        backend.push_import_result(Ok(sample_summary()));
        let coordinator = Arc::new(BackupImportCoordinator::new(Arc::clone(&backend) as _));
        let backup = sample_backup("/apps/tracker/2024-01.json");

        let first = {
            let coordinator = Arc::clone(&coordinator);
            let backup = backup.clone();
            tokio::spawn(async move { coordinator.import_backup(Some("abc123"), &backup).await })
        };
        // Let the first call reach the backend and park on the gate.
        tokio::task::yield_now().await;

        let second = coordinator
            .import_backup(Some("abc123"), &backup)
            .await
            .unwrap();
        assert!(matches!(second, ImportOutcome::AlreadyRunning));

        gate.notify_one();
        let first = first.await.unwrap().unwrap();
        assert!(matches!(first, ImportOutcome::Imported(_)));
        assert_eq!(
            backend.calls.lock().unwrap().len(),
            1,
            "only one backend import was issued"
        );
    }

    #[tokio::test]
    async fn distinct_paths_import_independently() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_import_result(Ok(sample_summary()));
        backend.push_import_result(Ok(vec![]));
        let coordinator = BackupImportCoordinator::new(backend);

        let a = coordinator
            .import_backup(Some("abc123"), &sample_backup("/a.json"))
            .await
            .unwrap();
        let b = coordinator
            .import_backup(Some("abc123"), &sample_backup("/b.json"))
            .await
            .unwrap();

        assert!(matches!(a, ImportOutcome::Imported(_)));
        assert!(matches!(b, ImportOutcome::Imported(_)));
    }

    #[tokio::test]
    async fn failure_maps_to_import_error_and_keeps_the_previous_summary() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_import_result(Ok(sample_summary()));
        backend.push_import_result(Err("backend said no".into()));
        let coordinator = BackupImportCoordinator::new(backend);
        let backup = sample_backup("/apps/tracker/2024-01.json");

        coordinator
            .import_backup(Some("abc123"), &backup)
            .await
            .unwrap();
        let err = coordinator
            .import_backup(Some("abc123"), &backup)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Import(_)));
        assert_eq!(
            coordinator.last_summary().unwrap(),
            sample_summary(),
            "previous summary untouched"
        );
    }

    #[tokio::test]
    async fn in_flight_marker_is_cleared_after_failure() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_import_result(Err("transient".into()));
        backend.push_import_result(Ok(sample_summary()));
        let coordinator = BackupImportCoordinator::new(backend);
        let backup = sample_backup("/apps/tracker/2024-01.json");

        coordinator
            .import_backup(Some("abc123"), &backup)
            .await
            .unwrap_err();
        let retry = coordinator
            .import_backup(Some("abc123"), &backup)
            .await
            .unwrap();

        assert!(matches!(retry, ImportOutcome::Imported(_)), "path not stuck busy");
    }
}

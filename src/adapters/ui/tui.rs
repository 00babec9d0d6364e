//! Implements InputPort. Inquire-based interactive prompts.
//!
//! Drives the whole flow: restore, app selection, OAuth or manual-token
//! connection, backup import, forget. Every error is shown inline and the
//! menu loops for an explicit user retry; nothing is retried automatically.

use crate::domain::{
    AppStatus, AuthProvider, ConnectionResult, DomainError, ImportSummaryItem, IntegrationApp,
    ManualConnectRequest,
};
use crate::ports::{BackendPort, InputPort};
use crate::usecases::{
    AuthOutcome, AuthSessionBroker, BackupImportCoordinator, ConnectionResolver, ImportOutcome,
    ManualLinkService, PendingAuth, Restored,
};
use async_trait::async_trait;
use inquire::{Password, Select, Text};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

use super::progress;

const CONNECT_GOOGLE: &str = "Connect with Google";
const CONNECT_APPLE: &str = "Connect with Apple";
const CONNECT_TOKEN: &str = "Link with a manual access token";
const IMPORT_BACKUP: &str = "Import a backup";
const FORGET: &str = "Forget the connection";
const RETRY: &str = "Retry";
const BACK: &str = "Back";
const QUIT: &str = "Quit";

enum ConnectedAction {
    Stay,
    Disconnect,
    Quit,
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    backend: Arc<dyn BackendPort>,
    broker: Arc<AuthSessionBroker>,
    resolver: Arc<ConnectionResolver>,
    manual: Arc<ManualLinkService>,
    importer: Arc<BackupImportCoordinator>,
    pending: Arc<PendingAuth>,
    outcomes: Mutex<mpsc::UnboundedReceiver<AuthOutcome>>,
}

impl TuiInputPort {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        backend: Arc<dyn BackendPort>,
        broker: Arc<AuthSessionBroker>,
        resolver: Arc<ConnectionResolver>,
        manual: Arc<ManualLinkService>,
        importer: Arc<BackupImportCoordinator>,
        pending: Arc<PendingAuth>,
        outcomes: mpsc::UnboundedReceiver<AuthOutcome>,
    ) -> Self {
        Self {
            backend,
            broker,
            resolver,
            manual,
            importer,
            pending,
            outcomes: Mutex::new(outcomes),
        }
    }

    async fn connect_menu(&self) -> Result<Option<ConnectionResult>, DomainError> {
        let Some(app) = self.select_app().await? else {
            return Ok(None);
        };
        println!("{}", app.description);
        if let Some(url) = &app.documentation_url {
            println!("Documentation: {url}");
        }

        loop {
            let choice = Select::new(
                "How do you want to link Dropbox?",
                vec![CONNECT_GOOGLE, CONNECT_APPLE, CONNECT_TOKEN, QUIT],
            )
            .prompt()
            .map_err(prompt_err)?;

            let attempt = match choice {
                CONNECT_GOOGLE => self.oauth_flow(AuthProvider::Google).await,
                CONNECT_APPLE => self.oauth_flow(AuthProvider::Apple).await,
                CONNECT_TOKEN => self.manual_flow(&app).await,
                _ => return Ok(None),
            };

            match attempt {
                Ok(result) => {
                    println!("{}", result.message);
                    return Ok(Some(result));
                }
                Err(e) => println!("{e}"),
            }
        }
    }

    async fn select_app(&self) -> Result<Option<IntegrationApp>, DomainError> {
        loop {
            let apps = match self.backend.list_apps().await {
                Ok(apps) => apps,
                Err(e) => {
                    println!("Could not load the compatible applications: {e}");
                    Vec::new()
                }
            };

            if apps.is_empty() {
                let choice = Select::new("No application is available.", vec![RETRY, QUIT])
                    .prompt()
                    .map_err(prompt_err)?;
                if choice == QUIT {
                    return Ok(None);
                }
                continue;
            }

            let labels: Vec<String> = apps.iter().map(app_label).collect();
            let picked = Select::new("Application to connect", labels.clone())
                .prompt()
                .map_err(prompt_err)?;
            let index = labels.iter().position(|l| *l == picked).unwrap_or(0);
            return Ok(apps.into_iter().nth(index));
        }
    }

    /// Start an OAuth attempt and wait for its terminal outcome. There is no
    /// timeout: an abandoned browser window keeps the attempt pending until a
    /// new attempt supersedes it or the program exits.
    async fn oauth_flow(&self, provider: AuthProvider) -> Result<ConnectionResult, DomainError> {
        let session = self.broker.begin(provider).await?;
        println!("If the browser did not open, visit: {}", session.auth_url);

        let pb = progress::spinner("Waiting for the authorization to finish in the browser...");
        let outcome = self.outcomes.lock().await.recv().await;
        pb.finish_and_clear();

        match outcome {
            Some(AuthOutcome::Finalized(result)) => Ok(result),
            Some(AuthOutcome::Rejected(err)) => Err(err),
            None => Err(DomainError::Callback(
                "the authorization listener stopped".to_string(),
            )),
        }
    }

    async fn manual_flow(
        &self,
        app: &IntegrationApp,
    ) -> Result<ConnectionResult, DomainError> {
        let email = Text::new("Dropbox account email (optional):")
            .prompt()
            .map_err(prompt_err)?;
        let token = Password::new("Dropbox access token:")
            .without_confirmation()
            .prompt()
            .map_err(prompt_err)?;

        let request = ManualConnectRequest {
            app_id: app.id.clone(),
            account_email: {
                let email = email.trim();
                (!email.is_empty()).then(|| email.to_string())
            },
            access_token: token,
        };
        self.manual.connect(request).await
    }

    async fn connected_menu(
        &self,
        result: &ConnectionResult,
    ) -> Result<ConnectedAction, DomainError> {
        let account = result.account_email.as_deref().unwrap_or("Dropbox");
        println!("Linked to {account} · {}", result.app_name);

        let choice = Select::new("What next?", vec![IMPORT_BACKUP, FORGET, QUIT])
            .prompt()
            .map_err(prompt_err)?;

        match choice {
            IMPORT_BACKUP => {
                self.import_flow(result).await;
                Ok(ConnectedAction::Stay)
            }
            FORGET => {
                self.resolver.forget().await;
                self.pending.clear();
                println!("Connection forgotten. Link another account whenever you like.");
                Ok(ConnectedAction::Disconnect)
            }
            _ => Ok(ConnectedAction::Quit),
        }
    }

    async fn import_flow(&self, result: &ConnectionResult) {
        if result.available_backups.is_empty() {
            println!("No backup file was detected in this account.");
            return;
        }

        let labels: Vec<String> = result
            .available_backups
            .iter()
            .map(|b| {
                format!(
                    "{} · {} · modified {}",
                    b.file_name,
                    b.size_label,
                    b.last_modified.format("%Y-%m-%d %H:%M")
                )
            })
            .chain(std::iter::once(BACK.to_string()))
            .collect();

        let picked = match Select::new("Backup to import", labels.clone()).prompt() {
            Ok(p) => p,
            Err(e) => {
                println!("{}", prompt_err(e));
                return;
            }
        };
        if picked == BACK {
            return;
        }
        let Some(index) = labels.iter().position(|l| *l == picked) else {
            return;
        };
        let backup = &result.available_backups[index];

        let pb = progress::spinner(format!("Importing {}...", backup.file_name));
        let outcome = self
            .importer
            .import_backup(result.state.as_deref(), backup)
            .await;
        pb.finish_and_clear();

        match outcome {
            Ok(ImportOutcome::Imported(summary)) => print_summary(&summary),
            Ok(ImportOutcome::AlreadyRunning) => {
                println!("An import for this backup is already running.")
            }
            Ok(ImportOutcome::ReauthRequired) => {
                println!(
                    "This link has no OAuth session; reconnect with Google or Apple to import backups."
                )
            }
            Err(e) => println!("{e}"),
        }
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        let mut connection: Option<ConnectionResult> = None;

        match self.resolver.restore().await {
            Ok(Restored::Connected(result)) => {
                println!("Restored the previous Dropbox connection.");
                connection = Some(result);
            }
            Ok(Restored::None) => {}
            Err(e) => println!("{e}"),
        }

        loop {
            connection = match connection {
                Some(result) => match self.connected_menu(&result).await? {
                    ConnectedAction::Stay => Some(result),
                    ConnectedAction::Disconnect => None,
                    ConnectedAction::Quit => return Ok(()),
                },
                None => match self.connect_menu().await? {
                    Some(result) => Some(result),
                    None => return Ok(()),
                },
            };
        }
    }
}

fn app_label(app: &IntegrationApp) -> String {
    let status = match app.status {
        AppStatus::Beta => "beta",
        AppStatus::Ready => "stable",
    };
    format!("{} · {}", app.name, status)
}

fn print_summary(summary: &[ImportSummaryItem]) {
    if summary.is_empty() {
        println!("Import finished; nothing new to merge.");
        return;
    }
    println!("Last import:");
    for item in summary {
        println!(
            "  {} · {} new entries, {} skipped",
            item.date, item.new_entries, item.skipped
        );
    }
}

fn prompt_err(e: inquire::InquireError) -> DomainError {
    DomainError::Prompt(e.to_string())
}

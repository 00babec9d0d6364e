//! HTTP adapter. Implements BackendPort against the integrations REST API.
//!
//! Non-2xx responses surface their body text as the error message, so backend
//! validation messages reach the user unchanged.

use crate::domain::{
    AuthProvider, AuthSession, ConnectionResult, DomainError, ImportSummaryItem, IntegrationApp,
    ManualConnectRequest,
};
use crate::ports::BackendPort;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Import endpoint envelope: `{ "summary": [...] }`.
#[derive(Debug, Deserialize)]
struct ImportEnvelope {
    summary: Vec<ImportSummaryItem>,
}

/// Backend API adapter over reqwest.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a new backend client. A trailing slash on `base_url` is trimmed
    /// so endpoint paths can be joined verbatim.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn parse<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DomainError> {
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            let message = if text.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                text
            };
            return Err(DomainError::Backend(message));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| DomainError::Backend(format!("malformed response: {}", e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, DomainError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| DomainError::Backend(format!("request failed: {}", e)))?;
        Self::parse(response).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, DomainError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::Backend(format!("request failed: {}", e)))?;
        Self::parse(response).await
    }
}

#[async_trait::async_trait]
impl BackendPort for HttpBackend {
    async fn list_apps(&self) -> Result<Vec<IntegrationApp>, DomainError> {
        self.get("/api/integrations/apps").await
    }

    async fn create_auth_session(
        &self,
        provider: AuthProvider,
    ) -> Result<AuthSession, DomainError> {
        self.post(
            "/api/integrations/dropbox/auth-session",
            &serde_json::json!({ "provider": provider }),
        )
        .await
    }

    async fn fetch_connection(&self, state: &str) -> Result<ConnectionResult, DomainError> {
        self.get(&format!("/api/integrations/dropbox/connections/{}", state))
            .await
    }

    async fn connect_with_token(
        &self,
        request: &ManualConnectRequest,
    ) -> Result<ConnectionResult, DomainError> {
        let body = serde_json::to_value(request)
            .map_err(|e| DomainError::Backend(e.to_string()))?;
        self.post("/api/integrations/dropbox/connect", &body).await
    }

    async fn import_backup(
        &self,
        state: &str,
        path: &str,
    ) -> Result<Vec<ImportSummaryItem>, DomainError> {
        let envelope: ImportEnvelope = self
            .post(
                "/api/integrations/dropbox/import",
                &serde_json::json!({ "state": state, "path": path }),
            )
            .await?;
        Ok(envelope.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_from_the_base_url() {
        let backend = HttpBackend::new("http://localhost:3000/");
        assert_eq!(
            backend.url("/api/integrations/apps"),
            "http://localhost:3000/api/integrations/apps"
        );
    }

    #[test]
    fn import_envelope_parses_the_summary_list() {
        let envelope: ImportEnvelope = serde_json::from_str(
            r#"{ "summary": [{ "date": "2024-01-10", "newEntries": 3, "skipped": 1 }] }"#,
        )
        .unwrap();
        assert_eq!(envelope.summary.len(), 1);
        assert_eq!(envelope.summary[0].new_entries, 3);
        assert_eq!(envelope.summary[0].skipped, 1);
    }
}

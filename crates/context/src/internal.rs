//! Internal knowledge base source.
//!
//! The retrieval index itself lives behind a service; this module only knows
//! how to ask it for passages.

use crate::error::InternalProviderError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use wayfinder_core::config::InternalConfig;

/// Trait for internal context providers.
#[async_trait::async_trait]
pub trait InternalContextProvider: Send + Sync {
    /// Get the provider name.
    fn provider_name(&self) -> &str;

    /// Fetch context text for `query`, optionally scoped to a workspace.
    async fn fetch(
        &self,
        query: &str,
        workspace_id: Option<&str>,
    ) -> Result<String, InternalProviderError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    workspace_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct RetrievalResponse {
    #[serde(default)]
    passages: Vec<Passage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Passage {
    title: Option<String>,
    url: Option<String>,
    text: String,
}

/// Render passages as numbered blocks separated by blank lines.
fn format_passages(passages: &[Passage]) -> String {
    passages
        .iter()
        .filter(|p| !p.text.trim().is_empty())
        .enumerate()
        .map(|(i, passage)| {
            let mut block = format!("[{}]", i + 1);
            if let Some(title) = passage.title.as_deref().filter(|t| !t.is_empty()) {
                block.push(' ');
                block.push_str(title);
            }
            if let Some(url) = passage.url.as_deref().filter(|u| !u.is_empty()) {
                block.push_str(&format!(" ({})", url));
            }
            block.push('\n');
            block.push_str(passage.text.trim());
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Retrieval service reached over HTTP.
///
/// POSTs `{"query", "workspaceId"}` and expects
/// `{"passages": [{"title", "url", "text"}]}`.
pub struct HttpInternalProvider {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpInternalProvider {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, InternalProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InternalProviderError::Failed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl InternalContextProvider for HttpInternalProvider {
    fn provider_name(&self) -> &str {
        "http"
    }

    async fn fetch(
        &self,
        query: &str,
        workspace_id: Option<&str>,
    ) -> Result<String, InternalProviderError> {
        tracing::debug!("Querying internal retrieval service at {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&RetrievalRequest {
                query,
                workspace_id,
            })
            .send()
            .await
            .map_err(|e| InternalProviderError::Unavailable(format!("{}: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(InternalProviderError::Failed(format!(
                "retrieval service error ({}): {}",
                status,
                error_text.trim()
            )));
        }

        let body: RetrievalResponse = response
            .json()
            .await
            .map_err(|e| InternalProviderError::Failed(format!("Failed to parse response: {}", e)))?;

        tracing::debug!("Internal retrieval returned {} passages", body.passages.len());
        Ok(format_passages(&body.passages))
    }
}

/// Placeholder for deployments without an internal index.
///
/// Always fails with [`InternalProviderError::NotWired`] so an unconfigured
/// source is never mistaken for one that found nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnwiredInternalProvider;

#[async_trait::async_trait]
impl InternalContextProvider for UnwiredInternalProvider {
    fn provider_name(&self) -> &str {
        "unwired"
    }

    async fn fetch(
        &self,
        _query: &str,
        _workspace_id: Option<&str>,
    ) -> Result<String, InternalProviderError> {
        Err(InternalProviderError::NotWired)
    }
}

/// Build the internal provider described by `config`.
pub fn create_internal_provider(
    config: &InternalConfig,
) -> Result<Arc<dyn InternalContextProvider>, InternalProviderError> {
    match config.endpoint.as_deref().map(str::trim) {
        Some(endpoint) if !endpoint.is_empty() => {
            Ok(Arc::new(HttpInternalProvider::new(endpoint, config.timeout())?))
        }
        _ => {
            tracing::debug!("No internal retrieval endpoint configured");
            Ok(Arc::new(UnwiredInternalProvider))
        }
    }
}

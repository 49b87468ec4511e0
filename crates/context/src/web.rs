//! Web search source for context fusion.
//!
//! Two dispatch styles are supported: through the durable pipeline (submit,
//! then wait for a worker) or a direct provider call in-process.

use crate::error::WebSearchError;
use std::sync::Arc;
use std::time::Duration;
use wayfinder_pipeline::{AwaitError, SearchRequest, WebSearchPipeline};
use wayfinder_search::{format_snippets, SearchProviderClient, SecretStore};

/// Trait for sources of web context text.
#[async_trait::async_trait]
pub trait WebContextSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Search the web for `query` and return formatted snippets.
    async fn fetch(&self, query: &str) -> Result<String, WebSearchError>;
}

/// Web source backed by the asynchronous search pipeline.
pub struct QueuedWebSource {
    pipeline: WebSearchPipeline,
    timeout: Duration,
    top_k: u32,
}

impl QueuedWebSource {
    pub fn new(pipeline: WebSearchPipeline, timeout: Duration, top_k: u32) -> Self {
        Self {
            pipeline,
            timeout,
            top_k: top_k.max(1),
        }
    }
}

#[async_trait::async_trait]
impl WebContextSource for QueuedWebSource {
    fn source_name(&self) -> &str {
        "queued"
    }

    async fn fetch(&self, query: &str) -> Result<String, WebSearchError> {
        let job_id = self
            .pipeline
            .submit_request(SearchRequest::new(query).with_top_k(self.top_k))
            .map_err(|e| WebSearchError::Queue(e.to_string()))?;

        tracing::debug!(job_id = %job_id, "Waiting for queued web search");

        match self.pipeline.wait_for(&job_id, self.timeout).await {
            Ok(result) => Ok(format_snippets(&result.snippets, self.top_k as usize)),
            Err(AwaitError::Failed(failed)) => Err(WebSearchError::Failed(failed.reason)),
            Err(AwaitError::TimedOut { waited, .. }) => Err(WebSearchError::TimedOut(waited)),
            Err(e @ AwaitError::Unknown(_)) => Err(WebSearchError::Queue(e.to_string())),
            Err(AwaitError::Queue(e)) => Err(WebSearchError::Queue(e.to_string())),
        }
    }
}

/// Web source that calls the provider directly.
pub struct DirectWebSource {
    client: Arc<dyn SearchProviderClient>,
    secrets: Arc<dyn SecretStore>,
    secret_name: String,
    timeout: Duration,
    top_k: u32,
}

impl DirectWebSource {
    pub fn new(
        client: Arc<dyn SearchProviderClient>,
        secrets: Arc<dyn SecretStore>,
        secret_name: impl Into<String>,
        timeout: Duration,
        top_k: u32,
    ) -> Self {
        Self {
            client,
            secrets,
            secret_name: secret_name.into(),
            timeout,
            top_k: top_k.max(1),
        }
    }
}

#[async_trait::async_trait]
impl WebContextSource for DirectWebSource {
    fn source_name(&self) -> &str {
        "direct"
    }

    async fn fetch(&self, query: &str) -> Result<String, WebSearchError> {
        let credential = self
            .secrets
            .get_secret(&self.secret_name)
            .await
            .map_err(|e| WebSearchError::Failed(e.to_string()))?;

        let search = self.client.search(query, &credential, self.top_k);
        let snippets = tokio::time::timeout(self.timeout, search)
            .await
            .map_err(|_| WebSearchError::TimedOut(self.timeout))?
            .map_err(|e| WebSearchError::Failed(e.to_string()))?;

        Ok(format_snippets(&snippets, self.top_k as usize))
    }
}

/// Placeholder for deployments without web search.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnwiredWebSource;

#[async_trait::async_trait]
impl WebContextSource for UnwiredWebSource {
    fn source_name(&self) -> &str {
        "unwired"
    }

    async fn fetch(&self, _query: &str) -> Result<String, WebSearchError> {
        Err(WebSearchError::NotWired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfinder_search::{Credential, ProviderError, SecretError, Snippet};

    struct FixedClient(Result<Vec<Snippet>, ProviderError>);

    #[async_trait::async_trait]
    impl SearchProviderClient for FixedClient {
        fn provider_name(&self) -> &str {
            "fixed"
        }

        async fn search(
            &self,
            _query: &str,
            _credential: &Credential,
            _max_results: u32,
        ) -> Result<Vec<Snippet>, ProviderError> {
            self.0.clone()
        }
    }

    struct KeySecrets;

    #[async_trait::async_trait]
    impl SecretStore for KeySecrets {
        async fn get_secret(&self, name: &str) -> Result<Credential, SecretError> {
            if name == "KEY" {
                Ok(Credential::new("k"))
            } else {
                Err(SecretError::NotFound(name.to_string()))
            }
        }
    }

    fn direct(result: Result<Vec<Snippet>, ProviderError>, secret: &str) -> DirectWebSource {
        DirectWebSource::new(
            Arc::new(FixedClient(result)),
            Arc::new(KeySecrets),
            secret,
            Duration::from_secs(1),
            2,
        )
    }

    #[tokio::test]
    async fn test_direct_formats_top_k() {
        let snippets = vec![
            Snippet::new("One", "https://one", "first"),
            Snippet::new("Two", "https://two", "second"),
            Snippet::new("Three", "https://three", "third"),
        ];
        let text = direct(Ok(snippets), "KEY").fetch("q").await.unwrap();

        assert_eq!(text, "- One\n  first\n  https://one\n\n- Two\n  second\n  https://two");
    }

    #[tokio::test]
    async fn test_direct_reports_provider_failure() {
        let err = direct(Err(ProviderError::Permanent("bad query".to_string())), "KEY")
            .fetch("q")
            .await
            .unwrap_err();
        assert!(matches!(err, WebSearchError::Failed(_)));
    }

    #[tokio::test]
    async fn test_direct_reports_missing_secret() {
        let err = direct(Ok(Vec::new()), "OTHER").fetch("q").await.unwrap_err();
        assert!(matches!(err, WebSearchError::Failed(msg) if msg.contains("OTHER")));
    }

    #[tokio::test]
    async fn test_unwired_source() {
        assert_eq!(
            UnwiredWebSource.fetch("q").await.unwrap_err(),
            WebSearchError::NotWired
        );
    }
}

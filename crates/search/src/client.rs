//! Search provider abstraction and result types.
//!
//! This module defines the core abstractions for interacting with web search providers.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wayfinder_core::AppError;

use crate::secrets::Credential;

/// A single ranked search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Page title
    pub title: String,

    /// Page URL
    pub url: String,

    /// Short excerpt of the page content
    pub excerpt: String,
}

impl Snippet {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        excerpt: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            excerpt: excerpt.into(),
        }
    }
}

/// Failure reported by a search provider.
///
/// Transient failures are retried through queue redelivery; permanent
/// failures dead-letter the job immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Network error, rate limit, timeout or provider-side outage
    #[error("transient provider error: {0}")]
    Transient(String),

    /// Malformed query or a non-retryable provider rejection
    #[error("permanent provider error: {0}")]
    Permanent(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }

    /// Classify a non-success HTTP status.
    ///
    /// 408, 429 and every 5xx are transient; all other statuses are permanent.
    pub fn from_status(provider: &str, status: u16, body: &str) -> Self {
        let message = format!("{} API error ({}): {}", provider, status, body.trim());
        if status == 408 || status == 429 || (500..600).contains(&status) {
            ProviderError::Transient(message)
        } else {
            ProviderError::Permanent(message)
        }
    }

    /// Classify a transport-level failure from the HTTP client.
    pub fn from_transport(provider: &str, err: &reqwest::Error) -> Self {
        if err.is_builder() {
            ProviderError::Permanent(format!("{} request could not be built: {}", provider, err))
        } else {
            ProviderError::Transient(format!("Failed to reach {}: {}", provider, err))
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Search(err.to_string())
    }
}

/// Trait for web search providers.
///
/// Implementations must be safe to call repeatedly with the same query: a job
/// can be delivered to different workers across attempts.
#[async_trait::async_trait]
pub trait SearchProviderClient: Send + Sync {
    /// Get the provider name (e.g., "bing", "brave").
    fn provider_name(&self) -> &str;

    /// Run a search and return up to `max_results` ranked snippets, best first.
    ///
    /// Providers with a lower per-request cap return at most their cap.
    async fn search(
        &self,
        query: &str,
        credential: &Credential,
        max_results: u32,
    ) -> Result<Vec<Snippet>, ProviderError>;
}

/// Reject queries no provider can answer before spending a request on them.
pub(crate) fn check_query(query: &str) -> Result<&str, ProviderError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::Permanent("malformed query: empty".to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(ProviderError::from_status("bing", 429, "slow down").is_transient());
        assert!(ProviderError::from_status("bing", 408, "").is_transient());
        assert!(ProviderError::from_status("bing", 500, "").is_transient());
        assert!(ProviderError::from_status("bing", 503, "").is_transient());

        assert!(!ProviderError::from_status("bing", 400, "bad query").is_transient());
        assert!(!ProviderError::from_status("bing", 401, "").is_transient());
        assert!(!ProviderError::from_status("bing", 403, "").is_transient());
    }

    #[test]
    fn test_status_message_includes_provider() {
        let err = ProviderError::from_status("brave", 401, "invalid token\n");
        assert_eq!(
            err.to_string(),
            "permanent provider error: brave API error (401): invalid token"
        );
    }

    #[test]
    fn test_check_query() {
        assert_eq!(check_query("  rust  ").unwrap(), "rust");
        assert!(matches!(
            check_query("   "),
            Err(ProviderError::Permanent(_))
        ));
    }

    #[test]
    fn test_into_app_error() {
        let err: AppError = ProviderError::Transient("timeout".to_string()).into();
        assert!(matches!(err, AppError::Search(_)));
    }
}

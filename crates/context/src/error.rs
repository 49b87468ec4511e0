//! Error types for routing and context resolution.

use crate::fusion::FusedContext;
use std::time::Duration;
use thiserror::Error;
use wayfinder_core::AppError;

/// A request the router refuses to decide on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("invalid retrieval mode '{0}' (expected internal, web or hybrid)")]
    InvalidMode(String),

    #[error("query must not be empty")]
    EmptyQuery,
}

/// Failure of the internal knowledge source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalProviderError {
    /// Service unreachable or timed out
    #[error("internal provider unavailable: {0}")]
    Unavailable(String),

    /// Service answered with an error or an unreadable body
    #[error("internal provider failed: {0}")]
    Failed(String),

    #[error("internal provider is not configured")]
    NotWired,
}

/// Failure of the web source as seen by the fusion service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebSearchError {
    #[error("web search failed: {0}")]
    Failed(String),

    #[error("web search did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("web search is not configured")]
    NotWired,

    #[error("web search queue error: {0}")]
    Queue(String),
}

/// Every selected source failed.
///
/// Carries the (empty) context so the caller can carry on with the turn.
#[derive(Debug, Clone, Error)]
#[error("context resolution failed: {}", describe_failures(.internal, .web))]
pub struct ContextResolutionFailed {
    pub internal: Option<InternalProviderError>,
    pub web: Option<WebSearchError>,
    pub context: FusedContext,
}

fn describe_failures(
    internal: &Option<InternalProviderError>,
    web: &Option<WebSearchError>,
) -> String {
    let parts: Vec<String> = [
        internal.as_ref().map(|e| e.to_string()),
        web.as_ref().map(|e| e.to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        "no source selected".to_string()
    } else {
        parts.join("; ")
    }
}

impl From<RoutingError> for AppError {
    fn from(err: RoutingError) -> Self {
        AppError::Context(err.to_string())
    }
}

impl From<InternalProviderError> for AppError {
    fn from(err: InternalProviderError) -> Self {
        AppError::Context(err.to_string())
    }
}

impl From<WebSearchError> for AppError {
    fn from(err: WebSearchError) -> Self {
        AppError::Search(err.to_string())
    }
}

impl From<ContextResolutionFailed> for AppError {
    fn from(err: ContextResolutionFailed) -> Self {
        AppError::Context(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_failure_lists_both_sources() {
        let err = ContextResolutionFailed {
            internal: Some(InternalProviderError::Unavailable("connection refused".to_string())),
            web: Some(WebSearchError::NotWired),
            context: FusedContext::default(),
        };

        assert_eq!(
            err.to_string(),
            "context resolution failed: internal provider unavailable: connection refused; web search is not configured"
        );
    }

    #[test]
    fn test_invalid_mode_message() {
        let err = RoutingError::InvalidMode("turbo".to_string());
        assert!(err.to_string().contains("'turbo'"));
    }
}

//! Context fusion.
//!
//! Resolves a request against the sources chosen by the router, running them
//! in parallel, and merges whatever succeeded into a single context string.

use crate::error::{ContextResolutionFailed, InternalProviderError, WebSearchError};
use crate::internal::InternalContextProvider;
use crate::router::{RoutingRequest, SourceRouter};
use crate::web::WebContextSource;
use futures::future::OptionFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Separator placed between the internal and web segments.
pub const SEGMENT_SEPARATOR: &str = "\n\n";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Merged output of all consulted sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedContext {
    /// Text from the internal source, if it was consulted and succeeded
    pub internal_text: Option<String>,

    /// Text from the web source, if it was consulted and succeeded
    pub web_text: Option<String>,

    /// Internal text, a blank line, then web text; empty segments are omitted
    pub combined: String,

    /// Whether a consulted source failed
    #[serde(default)]
    pub degraded: bool,
}

impl FusedContext {
    /// Combine the two segments in fixed order.
    pub fn fuse(internal_text: Option<String>, web_text: Option<String>) -> Self {
        let combined = [internal_text.as_deref(), web_text.as_deref()]
            .into_iter()
            .flatten()
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>()
            .join(SEGMENT_SEPARATOR);

        Self {
            internal_text,
            web_text,
            combined,
            degraded: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.combined.is_empty()
    }

    fn degraded(mut self, degraded: bool) -> Self {
        self.degraded = degraded;
        self
    }
}

/// Orchestrates the internal and web sources for a request.
pub struct ContextFusionService {
    internal: Arc<dyn InternalContextProvider>,
    web: Arc<dyn WebContextSource>,
    internal_timeout: Duration,
    web_timeout: Duration,
}

impl ContextFusionService {
    pub fn new(internal: Arc<dyn InternalContextProvider>, web: Arc<dyn WebContextSource>) -> Self {
        Self {
            internal,
            web,
            internal_timeout: DEFAULT_TIMEOUT,
            web_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound each source call; an expired call counts as a failure of that source.
    pub fn with_timeouts(mut self, internal: Duration, web: Duration) -> Self {
        self.internal_timeout = internal;
        self.web_timeout = web;
        self
    }

    /// Resolve `request` into a fused context.
    ///
    /// A failing source is dropped from the result as long as another selected
    /// source succeeded. When every selected source fails, the error carries an
    /// empty context.
    pub async fn resolve(
        &self,
        request: &RoutingRequest,
    ) -> Result<FusedContext, ContextResolutionFailed> {
        let decision = SourceRouter::decide(request);
        tracing::info!(
            mode = %request.mode(),
            use_internal = decision.use_internal,
            use_web = decision.use_web,
            reason = %decision.reason,
            "Resolving context"
        );

        let internal: OptionFuture<_> = decision
            .use_internal
            .then(|| self.fetch_internal(request))
            .into();
        let web: OptionFuture<_> = decision
            .use_web
            .then(|| self.fetch_web(request.query()))
            .into();

        // Both must settle before fusing
        let (internal, web) = tokio::join!(internal, web);

        let (internal_text, internal_error) = split(internal);
        let (web_text, web_error) = split(web);

        if let Some(e) = &internal_error {
            tracing::warn!("Internal source failed: {}", e);
        }
        if let Some(e) = &web_error {
            tracing::warn!("Web source failed: {}", e);
        }

        let degraded = internal_error.is_some() || web_error.is_some();
        if internal_text.is_none() && web_text.is_none() {
            let failure = ContextResolutionFailed {
                internal: internal_error,
                web: web_error,
                context: FusedContext::default().degraded(true),
            };
            tracing::error!("{}", failure);
            return Err(failure);
        }

        let context = FusedContext::fuse(internal_text, web_text).degraded(degraded);
        tracing::debug!(
            chars = context.combined.len(),
            degraded = context.degraded,
            "Context resolved"
        );
        Ok(context)
    }

    async fn fetch_internal(&self, request: &RoutingRequest) -> Result<String, InternalProviderError> {
        let fetch = self.internal.fetch(request.query(), request.workspace_id());
        match tokio::time::timeout(self.internal_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(InternalProviderError::Unavailable(format!(
                "{} did not respond within {:?}",
                self.internal.provider_name(),
                self.internal_timeout
            ))),
        }
    }

    async fn fetch_web(&self, query: &str) -> Result<String, WebSearchError> {
        match tokio::time::timeout(self.web_timeout, self.web.fetch(query)).await {
            Ok(result) => result,
            Err(_) => Err(WebSearchError::TimedOut(self.web_timeout)),
        }
    }
}

fn split<E>(outcome: Option<Result<String, E>>) -> (Option<String>, Option<E>) {
    match outcome {
        Some(Ok(text)) => (Some(text), None),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    }
}

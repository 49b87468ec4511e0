//! Source routing decision.
//!
//! Maps a retrieval mode and the user's web preference to the set of sources
//! to consult. The decision is a pure function of the request; its `reason`
//! strings are stable and safe to use in audit logs.

use crate::error::RoutingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User-selected retrieval strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    Internal,
    Web,
    Hybrid,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMode::Internal => "internal",
            RetrievalMode::Web => "web",
            RetrievalMode::Hybrid => "hybrid",
        }
    }
}

impl FromStr for RetrievalMode {
    type Err = RoutingError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "internal" => Ok(RetrievalMode::Internal),
            "web" => Ok(RetrievalMode::Web),
            "hybrid" => Ok(RetrievalMode::Hybrid),
            _ => Err(RoutingError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for RetrievalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request for context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRequest {
    query: String,
    mode: RetrievalMode,
    workspace_id: Option<String>,
    user_allows_web: Option<bool>,
}

impl RoutingRequest {
    /// Create a request; the query must contain non-whitespace text.
    pub fn new(query: impl Into<String>, mode: RetrievalMode) -> Result<Self, RoutingError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(RoutingError::EmptyQuery);
        }

        Ok(Self {
            query,
            mode,
            workspace_id: None,
            user_allows_web: None,
        })
    }

    /// Create a request from a textual mode name.
    pub fn parse(query: impl Into<String>, mode: &str) -> Result<Self, RoutingError> {
        Self::new(query, mode.parse()?)
    }

    pub fn with_workspace_id(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }

    pub fn with_user_allows_web(mut self, allowed: bool) -> Self {
        self.user_allows_web = Some(allowed);
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> RetrievalMode {
        self.mode
    }

    pub fn workspace_id(&self) -> Option<&str> {
        self.workspace_id.as_deref()
    }

    pub fn user_allows_web(&self) -> Option<bool> {
        self.user_allows_web
    }
}

/// Which sources to consult, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    pub use_internal: bool,
    pub use_web: bool,
    pub reason: String,
}

impl RoutingDecision {
    fn new(use_internal: bool, use_web: bool, reason: &str) -> Self {
        Self {
            use_internal,
            use_web,
            reason: reason.to_string(),
        }
    }
}

/// Stateless router from requests to decisions.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceRouter;

impl SourceRouter {
    /// Decide which sources serve `request`.
    ///
    /// Internal and web modes ignore the user's web preference. Hybrid always
    /// uses the internal source and includes the web unless the user opted out.
    pub fn decide(request: &RoutingRequest) -> RoutingDecision {
        match request.mode {
            RetrievalMode::Internal => {
                RoutingDecision::new(true, false, "internal-only mode selected")
            }
            RetrievalMode::Web => RoutingDecision::new(false, true, "web-only mode selected"),
            RetrievalMode::Hybrid => match request.user_allows_web {
                Some(false) => RoutingDecision::new(
                    true,
                    false,
                    "hybrid mode selected: web disabled by user preference",
                ),
                Some(true) => RoutingDecision::new(
                    true,
                    true,
                    "hybrid mode selected: internal and web sources, web allowed by user preference",
                ),
                None => RoutingDecision::new(
                    true,
                    true,
                    "hybrid mode selected: internal and web sources, web enabled by default",
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [RetrievalMode; 3] = [
        RetrievalMode::Internal,
        RetrievalMode::Web,
        RetrievalMode::Hybrid,
    ];
    const PREFERENCES: [Option<bool>; 3] = [None, Some(true), Some(false)];

    fn request(mode: RetrievalMode, allows_web: Option<bool>) -> RoutingRequest {
        let request = RoutingRequest::new("weather today", mode).unwrap();
        match allows_web {
            Some(allowed) => request.with_user_allows_web(allowed),
            None => request,
        }
    }

    #[test]
    fn test_internal_never_uses_web() {
        for pref in PREFERENCES {
            let decision = SourceRouter::decide(&request(RetrievalMode::Internal, pref));
            assert!(decision.use_internal);
            assert!(!decision.use_web);
            assert_eq!(decision.reason, "internal-only mode selected");
        }
    }

    #[test]
    fn test_web_never_uses_internal() {
        for pref in PREFERENCES {
            let decision = SourceRouter::decide(&request(RetrievalMode::Web, pref));
            assert!(!decision.use_internal);
            assert!(decision.use_web);
            assert_eq!(decision.reason, "web-only mode selected");
        }
    }

    #[test]
    fn test_hybrid_defaults_to_web() {
        let decision = SourceRouter::decide(&request(RetrievalMode::Hybrid, None));
        assert!(decision.use_internal);
        assert!(decision.use_web);
    }

    #[test]
    fn test_hybrid_respects_user_opt_out() {
        let decision = SourceRouter::decide(&request(RetrievalMode::Hybrid, Some(false)));
        assert!(decision.use_internal);
        assert!(!decision.use_web);
        assert!(decision.reason.contains("disabled by user preference"));
    }

    #[test]
    fn test_decide_is_deterministic() {
        for mode in MODES {
            for pref in PREFERENCES {
                let req = request(mode, pref);
                assert_eq!(SourceRouter::decide(&req), SourceRouter::decide(&req));
            }
        }
    }

    #[test]
    fn test_every_decision_uses_a_source() {
        for mode in MODES {
            for pref in PREFERENCES {
                let decision = SourceRouter::decide(&request(mode, pref));
                assert!(decision.use_internal || decision.use_web);
            }
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(" Hybrid ".parse::<RetrievalMode>().unwrap(), RetrievalMode::Hybrid);
        assert_eq!("WEB".parse::<RetrievalMode>().unwrap(), RetrievalMode::Web);
        assert_eq!(
            "everything".parse::<RetrievalMode>(),
            Err(RoutingError::InvalidMode("everything".to_string()))
        );
        assert_eq!(RetrievalMode::Internal.as_str(), "internal");
    }

    #[test]
    fn test_request_validation() {
        assert_eq!(
            RoutingRequest::new("  ", RetrievalMode::Web),
            Err(RoutingError::EmptyQuery)
        );
        assert!(matches!(
            RoutingRequest::parse("q", "both"),
            Err(RoutingError::InvalidMode(_))
        ));

        let req = RoutingRequest::parse("q", "internal")
            .unwrap()
            .with_workspace_id("ws-1");
        assert_eq!(req.workspace_id(), Some("ws-1"));
        assert_eq!(req.user_allows_web(), None);
    }
}

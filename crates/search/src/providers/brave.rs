//! Brave Search provider implementation.
//!
//! Brave Search API: https://api.search.brave.com/app/documentation/web-search

use crate::client::{check_query, ProviderError, SearchProviderClient, Snippet};
use crate::secrets::Credential;
use serde::Deserialize;

const DEFAULT_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";

/// Brave caps `count` at 20.
const MAX_COUNT: u32 = 20;

#[derive(Debug, Deserialize)]
struct BraveResponse {
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    url: Option<String>,
    title: Option<String>,
    description: Option<String>,
}

/// Brave Search client.
pub struct BraveSearchClient {
    endpoint: String,
    client: reqwest::Client,
}

impl BraveSearchClient {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for BraveSearchClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a Brave response body into snippets, dropping results without a URL.
fn parse_response(body: &str) -> Result<Vec<Snippet>, ProviderError> {
    let parsed: BraveResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Permanent(format!("Failed to parse Brave response: {}", e)))?;

    Ok(parsed
        .web
        .map(|web| web.results)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|r| {
            let url = r.url.filter(|u| !u.trim().is_empty())?;
            Some(Snippet {
                title: r.title.unwrap_or_default(),
                url,
                excerpt: r.description.unwrap_or_default(),
            })
        })
        .collect())
}

#[async_trait::async_trait]
impl SearchProviderClient for BraveSearchClient {
    fn provider_name(&self) -> &str {
        "brave"
    }

    async fn search(
        &self,
        query: &str,
        credential: &Credential,
        max_results: u32,
    ) -> Result<Vec<Snippet>, ProviderError> {
        let query = check_query(query)?;
        tracing::debug!(provider = "brave", max_results, "Sending web search request");

        let count = max_results.clamp(1, MAX_COUNT).to_string();
        let request = self
            .client
            .get(&self.endpoint)
            .header("X-Subscription-Token", credential.expose())
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", count.as_str())]);

        let body = super::send_request("brave", request).await?;
        parse_response(&body)
    }
}

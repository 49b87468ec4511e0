//! Bing Web Search provider implementation.
//!
//! Bing Web Search API v7: https://learn.microsoft.com/en-us/bing/search-apis/bing-web-search/reference/endpoints

use crate::client::{check_query, ProviderError, SearchProviderClient, Snippet};
use crate::secrets::Credential;
use serde::Deserialize;

const DEFAULT_ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/search";

/// Largest `count` Bing accepts per request.
const MAX_COUNT: u32 = 50;

/// Bing API response format (only the fields we use).
#[derive(Debug, Deserialize)]
struct BingResponse {
    #[serde(rename = "webPages")]
    web_pages: Option<BingWebPages>,
}

#[derive(Debug, Deserialize)]
struct BingWebPages {
    #[serde(default)]
    value: Vec<BingPage>,
}

#[derive(Debug, Deserialize)]
struct BingPage {
    name: Option<String>,
    url: Option<String>,
    snippet: Option<String>,
}

/// Bing Web Search client.
pub struct BingSearchClient {
    /// Search endpoint URL
    endpoint: String,

    /// HTTP client
    client: reqwest::Client,
}

impl BingSearchClient {
    /// Create a client for the public Bing endpoint.
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Create a client against a custom endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for BingSearchClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a Bing response body into snippets, dropping hits without a URL.
fn parse_response(body: &str) -> Result<Vec<Snippet>, ProviderError> {
    let parsed: BingResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Permanent(format!("Failed to parse Bing response: {}", e)))?;

    let pages = parsed.web_pages.map(|w| w.value).unwrap_or_default();

    Ok(pages
        .into_iter()
        .filter_map(|page| {
            let url = page.url.filter(|u| !u.trim().is_empty())?;
            Some(Snippet {
                title: page.name.unwrap_or_default(),
                url,
                excerpt: page.snippet.unwrap_or_default(),
            })
        })
        .collect())
}

#[async_trait::async_trait]
impl SearchProviderClient for BingSearchClient {
    fn provider_name(&self) -> &str {
        "bing"
    }

    async fn search(
        &self,
        query: &str,
        credential: &Credential,
        max_results: u32,
    ) -> Result<Vec<Snippet>, ProviderError> {
        let query = check_query(query)?;
        tracing::debug!(provider = "bing", max_results, "Sending web search request");

        let count = max_results.clamp(1, MAX_COUNT).to_string();
        let request = self
            .client
            .get(&self.endpoint)
            .header("Ocp-Apim-Subscription-Key", credential.expose())
            .query(&[("q", query), ("count", count.as_str())]);

        let body = super::send_request("bing", request).await?;
        let snippets = parse_response(&body)?;

        tracing::debug!(provider = "bing", results = snippets.len(), "Received web search results");
        Ok(snippets)
    }
}

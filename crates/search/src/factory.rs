//! Search provider factory.
//!
//! This module creates search clients from configuration values.

use crate::client::SearchProviderClient;
use crate::providers::{BingSearchClient, BraveSearchClient};
use std::sync::Arc;
use wayfinder_core::{AppError, AppResult};

/// Create a search client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("bing", "brave")
/// * `endpoint` - Optional custom endpoint URL
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
) -> AppResult<Arc<dyn SearchProviderClient>> {
    match provider.trim().to_lowercase().as_str() {
        "bing" => {
            let client = match endpoint {
                Some(url) => BingSearchClient::with_endpoint(url),
                None => BingSearchClient::new(),
            };
            Ok(Arc::new(client))
        }
        "brave" => {
            let client = match endpoint {
                Some(url) => BraveSearchClient::with_endpoint(url),
                None => BraveSearchClient::new(),
            };
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Config(format!(
            "Unknown search provider: {}",
            provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_bing_client() {
        let client = create_client("bing", None).unwrap();
        assert_eq!(client.provider_name(), "bing");
    }

    #[test]
    fn test_create_brave_with_custom_endpoint() {
        let client = create_client(" Brave ", Some("http://localhost:8080/search")).unwrap();
        assert_eq!(client.provider_name(), "brave");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("altavista", None) {
            Err(err) => assert!(err.to_string().contains("Unknown search provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}

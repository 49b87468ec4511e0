//! Web search provider implementations.

pub mod bing;
pub mod brave;

pub use bing::BingSearchClient;
pub use brave::BraveSearchClient;

use crate::client::ProviderError;

/// Send a prepared request and return the body of a successful response.
///
/// Transport errors and non-success statuses are classified into
/// transient/permanent `ProviderError`s.
async fn send_request(
    provider: &str,
    request: reqwest::RequestBuilder,
) -> Result<String, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::from_transport(provider, &e))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ProviderError::from_status(
            provider,
            status.as_u16(),
            &error_text,
        ));
    }

    response
        .text()
        .await
        .map_err(|e| ProviderError::from_transport(provider, &e))
}

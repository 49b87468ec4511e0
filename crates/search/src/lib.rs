//! Web search integration crate for Wayfinder.
//!
//! This crate provides a provider-agnostic abstraction for querying external
//! web search APIs, plus the secret store used to obtain provider credentials.
//!
//! # Providers
//! - **Bing**: Bing Web Search v7 (default)
//! - **Brave**: Brave Search API
//!
//! # Example
//! ```no_run
//! use wayfinder_search::{EnvSecretStore, SecretStore, SearchProviderClient, providers::BingSearchClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let secrets = EnvSecretStore::new();
//! let credential = secrets.get_secret("WEB_SEARCH_BING_API_KEY").await?;
//! let client = BingSearchClient::new();
//! let snippets = client.search("rust async runtimes", &credential, 5).await?;
//! println!("{} results", snippets.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod format;
pub mod providers;
pub mod secrets;

// Re-export main types
pub use client::{ProviderError, SearchProviderClient, Snippet};
pub use factory::create_client;
pub use format::format_snippets;
pub use providers::{BingSearchClient, BraveSearchClient};
pub use secrets::{Credential, EnvSecretStore, JsonFileSecretStore, SecretError, SecretStore};

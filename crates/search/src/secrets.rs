//! Secret store for provider credentials.
//!
//! Credentials are looked up by a fixed logical name on every invocation and
//! never cached, so rotating a key only requires updating the store.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use wayfinder_core::AppError;

/// An opaque provider credential.
///
/// `Debug` is redacted and there is no `Display`, so a credential cannot end
/// up in a log line by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Raw secret, for placing into a request header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Secret lookup failure. The worker treats every variant as transient.
#[derive(Debug, Clone, Error)]
pub enum SecretError {
    #[error("secret '{0}' not found")]
    NotFound(String),

    #[error("secret store unavailable: {0}")]
    Unavailable(String),
}

impl From<SecretError> for AppError {
    fn from(err: SecretError) -> Self {
        AppError::Search(err.to_string())
    }
}

/// Trait for credential sources.
#[async_trait::async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<Credential, SecretError>;
}

/// Secret store backed by process environment variables.
///
/// The logical secret name is the variable name.
#[derive(Debug, Default, Clone)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, name: &str) -> Result<Credential, SecretError> {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(Credential::new(value.trim())),
            _ => Err(SecretError::NotFound(name.to_string())),
        }
    }
}

/// Secret store backed by a JSON object file of `{ "NAME": "value" }` pairs.
///
/// The file is re-read on every lookup.
#[derive(Debug, Clone)]
pub struct JsonFileSecretStore {
    path: PathBuf,
}

impl JsonFileSecretStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn read_bundle(&self) -> Result<HashMap<String, String>, SecretError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SecretError::Unavailable(format!("Failed to read {:?}: {}", self.path, e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            SecretError::Unavailable(format!("Failed to parse {:?}: {}", self.path, e))
        })
    }
}

#[async_trait::async_trait]
impl SecretStore for JsonFileSecretStore {
    async fn get_secret(&self, name: &str) -> Result<Credential, SecretError> {
        let bundle = self.read_bundle().await?;
        bundle
            .get(name)
            .filter(|value| !value.trim().is_empty())
            .map(|value| Credential::new(value.trim()))
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}

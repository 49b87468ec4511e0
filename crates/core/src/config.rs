//! Configuration management for Wayfinder.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (.wayfinder/config.yaml)
//! - Environment variables
//! - Command-line flags
//!
//! Later sources win. All state lives under the workspace's `.wayfinder/` directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Retrieval modes accepted by the router.
pub const KNOWN_MODES: [&str; 3] = ["internal", "web", "hybrid"];

/// Web search providers with a client implementation.
pub const KNOWN_SEARCH_PROVIDERS: [&str; 2] = ["bing", "brave"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .wayfinder/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub routing: RoutingConfig,

    pub pipeline: PipelineConfig,

    pub search: SearchConfig,

    pub internal: InternalConfig,
}

/// Source routing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingConfig {
    /// Mode used when a caller does not pick one
    #[serde(default = "default_mode")]
    pub default_mode: String,
}

/// How the fusion service reaches the web search provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebDispatch {
    /// Submit to the durable queue and await the worker's result
    Queued,
    /// Call the provider in-process
    Direct,
}

/// Web search queue and worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// SQLite queue database, relative to the workspace unless absolute
    #[serde(default = "default_queue_path")]
    pub queue_path: PathBuf,

    /// Seconds a claimed job stays hidden from other workers
    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: u64,

    /// Deliveries allowed before a job is dead-lettered
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Name recorded on dead-lettered jobs
    #[serde(default = "default_dead_letter_name")]
    pub dead_letter_name: String,

    /// Size of the worker pool
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Sleep between polls of an empty queue
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_dispatch")]
    pub dispatch: WebDispatch,
}

/// Web search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    /// Provider identifier ("bing", "brave")
    #[serde(default = "default_search_provider")]
    pub provider: String,

    /// Custom endpoint URL
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Logical name of the credential in the secret store
    #[serde(default = "default_secret_name")]
    pub secret_name: String,

    /// JSON file holding named secrets; environment is used when unset
    #[serde(default)]
    pub secrets_file: Option<PathBuf>,

    /// Number of snippets kept per search
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Per-call timeout for the web path
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Internal retrieval service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalConfig {
    /// URL of the internal retrieval service; unwired when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_mode() -> String {
    "internal".to_string()
}

fn default_queue_path() -> PathBuf {
    PathBuf::from(".wayfinder/queue.sqlite")
}

fn default_visibility_timeout_secs() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    3
}

fn default_dead_letter_name() -> String {
    "web-search-dlq".to_string()
}

fn default_workers() -> usize {
    2
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_dispatch() -> WebDispatch {
    WebDispatch::Queued
}

fn default_search_provider() -> String {
    "bing".to_string()
}

fn default_secret_name() -> String {
    "WEB_SEARCH_BING_API_KEY".to_string()
}

fn default_top_k() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_mode: default_mode(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_path: default_queue_path(),
            visibility_timeout_secs: default_visibility_timeout_secs(),
            max_attempts: default_max_attempts(),
            dead_letter_name: default_dead_letter_name(),
            workers: default_workers(),
            poll_interval_ms: default_poll_interval_ms(),
            dispatch: default_dispatch(),
        }
    }
}

impl PipelineConfig {
    pub fn visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.visibility_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            endpoint: None,
            secret_name: default_secret_name(),
            secrets_file: None,
            top_k: default_top_k(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for InternalConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl InternalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    routing: Option<RoutingConfig>,
    pipeline: Option<PipelineConfig>,
    search: Option<SearchConfig>,
    internal: Option<InternalConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            routing: RoutingConfig::default(),
            pipeline: PipelineConfig::default(),
            search: SearchConfig::default(),
            internal: InternalConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and environment variables.
    ///
    /// Environment variables:
    /// - `WAYFINDER_WORKSPACE`: Override workspace path
    /// - `WAYFINDER_CONFIG`: Path to config file
    /// - `WAYFINDER_MODE`: Default retrieval mode
    /// - `WAYFINDER_SEARCH_PROVIDER`: Web search provider
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use wayfinder_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Queue: {:?}", config.queue_path());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], with an explicit workspace and config file
    /// taking precedence over the environment.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace =
            workspace.or_else(|| std::env::var("WAYFINDER_WORKSPACE").ok().map(PathBuf::from));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        let config_file =
            config_file.or_else(|| std::env::var("WAYFINDER_CONFIG").ok().map(PathBuf::from));
        if let Some(config_file) = config_file {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.wayfinder_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(mode) = std::env::var("WAYFINDER_MODE") {
            config.routing.default_mode = mode;
        }

        if let Ok(provider) = std::env::var("WAYFINDER_SEARCH_PROVIDER") {
            config.search.provider = provider;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents).map_err(|e| match e {
            AppError::Config(msg) => {
                AppError::Config(format!("Failed to parse config file {:?}: {}", path, msg))
            }
            other => other,
        })
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile =
            serde_yaml::from_str(contents).map_err(|e| AppError::Config(e.to_string()))?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(routing) = config_file.routing {
            result.routing = routing;
        }
        if let Some(pipeline) = config_file.pipeline {
            result.pipeline = pipeline;
        }
        if let Some(search) = config_file.search {
            result.search = search;
        }
        if let Some(internal) = config_file.internal {
            result.internal = internal;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the file and environment.
    /// Workspace and config file are applied earlier, by [`AppConfig::load_with`].
    pub fn with_overrides(mut self, log_level: Option<String>, verbose: bool, no_color: bool) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .wayfinder directory.
    pub fn wayfinder_dir(&self) -> PathBuf {
        self.workspace.join(".wayfinder")
    }

    /// Ensure the .wayfinder directory exists.
    pub fn ensure_wayfinder_dir(&self) -> AppResult<()> {
        let dir = self.wayfinder_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .wayfinder directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Queue database path resolved against the workspace.
    pub fn queue_path(&self) -> PathBuf {
        if self.pipeline.queue_path.is_absolute() {
            self.pipeline.queue_path.clone()
        } else {
            self.workspace.join(&self.pipeline.queue_path)
        }
    }

    /// Secrets file path resolved against the workspace.
    pub fn secrets_file(&self) -> Option<PathBuf> {
        self.search.secrets_file.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                self.workspace.join(path)
            }
        })
    }

    /// Validate the configuration before any component is built from it.
    pub fn validate(&self) -> AppResult<()> {
        let mode = self.routing.default_mode.trim().to_lowercase();
        if !KNOWN_MODES.contains(&mode.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown retrieval mode: {}. Supported: {}",
                self.routing.default_mode,
                KNOWN_MODES.join(", ")
            )));
        }

        let provider = self.search.provider.to_lowercase();
        if !KNOWN_SEARCH_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown search provider: {}. Supported: {}",
                self.search.provider,
                KNOWN_SEARCH_PROVIDERS.join(", ")
            )));
        }

        if self.search.secret_name.trim().is_empty() {
            return Err(AppError::Config(
                "search.secretName must not be empty".to_string(),
            ));
        }

        if self.pipeline.max_attempts == 0 {
            return Err(AppError::Config(
                "pipeline.maxAttempts must be at least 1".to_string(),
            ));
        }

        if self.pipeline.visibility_timeout_secs == 0 {
            return Err(AppError::Config(
                "pipeline.visibilityTimeoutSecs must be at least 1".to_string(),
            ));
        }

        if self.pipeline.workers == 0 {
            return Err(AppError::Config(
                "pipeline.workers must be at least 1".to_string(),
            ));
        }

        if self.pipeline.dead_letter_name.trim().is_empty() {
            return Err(AppError::Config(
                "pipeline.deadLetterName must not be empty".to_string(),
            ));
        }

        if self.search.timeout_secs == 0 || self.internal.timeout_secs == 0 {
            return Err(AppError::Config(
                "Provider timeouts must be at least 1 second".to_string(),
            ));
        }

        Ok(())
    }
}

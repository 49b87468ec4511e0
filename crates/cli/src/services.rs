//! Construction of pipeline and context components from configuration.
//!
//! Every component receives its collaborators explicitly; nothing here is
//! global.

use std::sync::Arc;
use wayfinder_context::{
    create_internal_provider, ContextFusionService, DirectWebSource, QueuedWebSource,
    WebContextSource,
};
use wayfinder_core::config::{AppConfig, WebDispatch};
use wayfinder_core::AppResult;
use wayfinder_pipeline::{
    Clock, QueuePolicy, SearchWorker, SqliteJobQueue, SystemClock, WebSearchPipeline,
    WorkerSettings,
};
use wayfinder_search::{EnvSecretStore, JsonFileSecretStore, SearchProviderClient, SecretStore};

/// Open the durable queue configured for the workspace.
pub fn open_queue(config: &AppConfig) -> AppResult<Arc<SqliteJobQueue>> {
    let queue = SqliteJobQueue::open(&config.queue_path(), QueuePolicy::from_config(&config.pipeline))?;
    Ok(Arc::new(queue))
}

pub fn clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

pub fn pipeline(config: &AppConfig, queue: Arc<SqliteJobQueue>) -> WebSearchPipeline {
    WebSearchPipeline::new(queue, clock())
        .with_poll_interval(config.pipeline.poll_interval())
        .with_default_top_k(config.search.top_k)
}

/// Secret store: the JSON secrets file when configured, the environment otherwise.
pub fn secret_store(config: &AppConfig) -> Arc<dyn SecretStore> {
    match config.secrets_file() {
        Some(path) => {
            tracing::debug!("Reading secrets from {:?}", path);
            Arc::new(JsonFileSecretStore::new(path))
        }
        None => Arc::new(EnvSecretStore::new()),
    }
}

pub fn search_client(config: &AppConfig) -> AppResult<Arc<dyn SearchProviderClient>> {
    wayfinder_search::create_client(
        &config.search.provider,
        config.search.endpoint.as_deref(),
    )
}

pub fn worker(config: &AppConfig, queue: Arc<SqliteJobQueue>) -> AppResult<SearchWorker> {
    Ok(SearchWorker::new(
        queue,
        search_client(config)?,
        secret_store(config),
        clock(),
        WorkerSettings::from_config(config),
    ))
}

/// Web source selected by `pipeline.dispatch`.
pub fn web_source(config: &AppConfig) -> AppResult<Arc<dyn WebContextSource>> {
    let source: Arc<dyn WebContextSource> = match config.pipeline.dispatch {
        WebDispatch::Queued => {
            let queue = open_queue(config)?;
            Arc::new(QueuedWebSource::new(
                pipeline(config, queue),
                config.search.timeout(),
                config.search.top_k,
            ))
        }
        WebDispatch::Direct => Arc::new(DirectWebSource::new(
            search_client(config)?,
            secret_store(config),
            config.search.secret_name.clone(),
            config.search.timeout(),
            config.search.top_k,
        )),
    };

    tracing::debug!("Web dispatch: {}", source.source_name());
    Ok(source)
}

pub fn fusion_service(config: &AppConfig) -> AppResult<ContextFusionService> {
    let internal = create_internal_provider(&config.internal)?;
    Ok(ContextFusionService::new(internal, web_source(config)?)
        .with_timeouts(config.internal.timeout(), config.search.timeout()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.workspace = dir.path().to_path_buf();
        config
    }

    #[test]
    fn test_queue_created_under_workspace() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        open_queue(&config).unwrap();
        assert!(config.queue_path().exists());
    }

    #[test]
    fn test_secret_store_prefers_file() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.search.secrets_file = Some("secrets.json".into());

        // Selecting the store does not read the file
        secret_store(&config);
        assert_eq!(config.secrets_file(), Some(dir.path().join("secrets.json")));
    }

    #[test]
    fn test_fusion_service_builds_for_both_dispatch_modes() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);

        assert!(fusion_service(&config).is_ok());
        config.pipeline.dispatch = WebDispatch::Direct;
        assert!(fusion_service(&config).is_ok());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.search.provider = "altavista".to_string();

        assert!(search_client(&config).is_err());
    }
}

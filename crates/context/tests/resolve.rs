//! End-to-end context resolution with stub sources and a live worker pool.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use wayfinder_context::{
    ContextFusionService, InternalContextProvider, InternalProviderError, QueuedWebSource,
    RetrievalMode, RoutingRequest, UnwiredWebSource, WebContextSource, WebSearchError,
};
use wayfinder_pipeline::{
    QueuePolicy, SearchWorker, SqliteJobQueue, SystemClock, WebSearchPipeline, WorkerPool,
    WorkerSettings,
};
use wayfinder_search::{
    Credential, ProviderError, SearchProviderClient, SecretError, SecretStore, Snippet,
};

struct StubInternal {
    response: Result<String, InternalProviderError>,
    delay: Duration,
    seen: Mutex<Vec<(String, Option<String>)>>,
}

impl StubInternal {
    fn returning(text: &str) -> Arc<Self> {
        Self::with(Ok(text.to_string()), Duration::ZERO)
    }

    fn failing() -> Arc<Self> {
        Self::with(
            Err(InternalProviderError::Unavailable("connection refused".to_string())),
            Duration::ZERO,
        )
    }

    fn with(response: Result<String, InternalProviderError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            response,
            delay,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl InternalContextProvider for StubInternal {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn fetch(
        &self,
        query: &str,
        workspace_id: Option<&str>,
    ) -> Result<String, InternalProviderError> {
        self.seen
            .lock()
            .unwrap()
            .push((query.to_string(), workspace_id.map(str::to_string)));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.clone()
    }
}

struct StubWeb {
    response: Result<String, WebSearchError>,
    delay: Duration,
    calls: Mutex<usize>,
}

impl StubWeb {
    fn returning(text: &str) -> Arc<Self> {
        Self::with(Ok(text.to_string()), Duration::ZERO)
    }

    fn failing() -> Arc<Self> {
        Self::with(
            Err(WebSearchError::Failed("provider rejected query".to_string())),
            Duration::ZERO,
        )
    }

    fn with(response: Result<String, WebSearchError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            response,
            delay,
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl WebContextSource for StubWeb {
    fn source_name(&self) -> &str {
        "stub"
    }

    async fn fetch(&self, _query: &str) -> Result<String, WebSearchError> {
        *self.calls.lock().unwrap() += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.clone()
    }
}

#[tokio::test]
async fn test_internal_mode_uses_only_internal() {
    let internal = StubInternal::returning("sunny");
    let web = StubWeb::returning("unused");
    let service = ContextFusionService::new(internal.clone(), web.clone());

    let request = RoutingRequest::new("weather today", RetrievalMode::Internal)
        .unwrap()
        .with_workspace_id("ws-42");
    let context = service.resolve(&request).await.unwrap();

    assert_eq!(context.combined, "sunny");
    assert!(!context.degraded);
    assert_eq!(web.calls(), 0);
    assert_eq!(
        internal.seen.lock().unwrap()[0],
        ("weather today".to_string(), Some("ws-42".to_string()))
    );
}

#[tokio::test]
async fn test_hybrid_with_web_allowed_joins_both() {
    let service = ContextFusionService::new(StubInternal::returning("A"), StubWeb::returning("B"));

    let request = RoutingRequest::new("q", RetrievalMode::Hybrid)
        .unwrap()
        .with_user_allows_web(true);
    let context = service.resolve(&request).await.unwrap();

    assert_eq!(context.combined, "A\n\nB");
    assert_eq!(context.internal_text.as_deref(), Some("A"));
    assert_eq!(context.web_text.as_deref(), Some("B"));
}

#[tokio::test]
async fn test_hybrid_with_web_disabled_skips_web() {
    let web = StubWeb::returning("B");
    let service = ContextFusionService::new(StubInternal::returning("A"), web.clone());

    let request = RoutingRequest::new("q", RetrievalMode::Hybrid)
        .unwrap()
        .with_user_allows_web(false);
    let context = service.resolve(&request).await.unwrap();

    assert_eq!(context.combined, "A");
    assert_eq!(context.web_text, None);
    assert_eq!(web.calls(), 0);
}

#[tokio::test]
async fn test_web_failure_degrades_to_internal() {
    let service = ContextFusionService::new(StubInternal::returning("A"), StubWeb::failing());

    let request = RoutingRequest::new("q", RetrievalMode::Hybrid).unwrap();
    let context = service.resolve(&request).await.unwrap();

    assert_eq!(context.combined, "A");
    assert!(context.degraded);
}

#[tokio::test]
async fn test_internal_failure_degrades_to_web() {
    let service = ContextFusionService::new(StubInternal::failing(), StubWeb::returning("B"));

    let request = RoutingRequest::new("q", RetrievalMode::Hybrid).unwrap();
    let context = service.resolve(&request).await.unwrap();

    assert_eq!(context.combined, "B");
    assert!(context.degraded);
}

#[tokio::test]
async fn test_both_sources_failing_returns_empty_context() {
    let service = ContextFusionService::new(StubInternal::failing(), StubWeb::failing());

    let request = RoutingRequest::new("q", RetrievalMode::Hybrid).unwrap();
    let failure = service.resolve(&request).await.unwrap_err();

    assert!(failure.internal.is_some());
    assert!(failure.web.is_some());
    assert_eq!(failure.context.combined, "");
}

#[tokio::test]
async fn test_slow_web_source_is_bounded() {
    let web = StubWeb::with(Ok("late".to_string()), Duration::from_secs(5));
    let service = ContextFusionService::new(StubInternal::returning("A"), web)
        .with_timeouts(Duration::from_secs(1), Duration::from_millis(50));

    let request = RoutingRequest::new("q", RetrievalMode::Hybrid).unwrap();
    let context = service.resolve(&request).await.unwrap();

    assert_eq!(context.combined, "A");
    assert!(context.degraded);
}

#[tokio::test]
async fn test_hybrid_sources_run_concurrently() {
    let delay = Duration::from_millis(200);
    let internal = StubInternal::with(Ok("A".to_string()), delay);
    let web = StubWeb::with(Ok("B".to_string()), delay);
    let service = ContextFusionService::new(internal, web);

    let request = RoutingRequest::new("q", RetrievalMode::Hybrid).unwrap();
    let started = std::time::Instant::now();
    let context = service.resolve(&request).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(context.combined, "A\n\nB");
    assert!(elapsed >= delay, "returned before both sources finished: {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(350), "sources ran one after another: {:?}", elapsed);
}

#[tokio::test]
async fn test_unwired_web_is_distinguishable_from_empty() {
    let service = ContextFusionService::new(StubInternal::failing(), Arc::new(UnwiredWebSource));

    let request = RoutingRequest::new("q", RetrievalMode::Web).unwrap();
    let failure = service.resolve(&request).await.unwrap_err();

    assert_eq!(failure.web, Some(WebSearchError::NotWired));
    assert!(failure.internal.is_none());
}

/// Provider used behind the real queue and worker pool.
struct FixedProvider(Result<Vec<Snippet>, ProviderError>);

#[async_trait::async_trait]
impl SearchProviderClient for FixedProvider {
    fn provider_name(&self) -> &str {
        "fixed"
    }

    async fn search(
        &self,
        _query: &str,
        _credential: &Credential,
        _max_results: u32,
    ) -> Result<Vec<Snippet>, ProviderError> {
        self.0.clone()
    }
}

struct StaticSecrets;

#[async_trait::async_trait]
impl SecretStore for StaticSecrets {
    async fn get_secret(&self, _name: &str) -> Result<Credential, SecretError> {
        Ok(Credential::new("test-key"))
    }
}

fn queued_stack(provider: FixedProvider) -> (QueuedWebSource, WorkerPool) {
    let queue = Arc::new(SqliteJobQueue::open_in_memory(QueuePolicy::default()).unwrap());
    let clock = Arc::new(SystemClock);
    let pipeline = WebSearchPipeline::new(queue.clone(), clock.clone())
        .with_poll_interval(Duration::from_millis(10));

    let settings = WorkerSettings {
        poll_interval: Duration::from_millis(10),
        ..WorkerSettings::default()
    };
    let worker = SearchWorker::new(
        queue,
        Arc::new(provider),
        Arc::new(StaticSecrets),
        clock,
        settings,
    );
    let pool = WorkerPool::spawn(2, worker);

    (QueuedWebSource::new(pipeline, Duration::from_secs(5), 5), pool)
}

#[tokio::test]
async fn test_hybrid_through_queue_and_workers() {
    let (web, pool) = queued_stack(FixedProvider(Ok(vec![Snippet::new(
        "Forecast",
        "https://weather.example/today",
        "Sunny, 24C",
    )])));
    let service = ContextFusionService::new(StubInternal::returning("A"), Arc::new(web));

    let request = RoutingRequest::new("weather today", RetrievalMode::Hybrid).unwrap();
    let context = service.resolve(&request).await.unwrap();
    pool.shutdown().await;

    assert_eq!(
        context.combined,
        "A\n\n- Forecast\n  Sunny, 24C\n  https://weather.example/today"
    );
}

#[tokio::test]
async fn test_permanent_web_failure_through_queue_keeps_internal() {
    let (web, pool) = queued_stack(FixedProvider(Err(ProviderError::Permanent(
        "malformed query".to_string(),
    ))));
    let service = ContextFusionService::new(StubInternal::returning("A"), Arc::new(web));

    let request = RoutingRequest::new("q", RetrievalMode::Hybrid).unwrap();
    let context = service.resolve(&request).await.unwrap();
    pool.shutdown().await;

    assert_eq!(context.combined, "A");
    assert!(context.degraded);
    assert_eq!(context.web_text, None);
}

//! Provider configuration loader — load `llm-config.json` once, serve it forever.
//!
//! State machine: `NOT_LOADED → LOADING → LOADED`. `LOADED` is terminal
//! regardless of whether the fetch succeeded; a failed load stores the
//! fallback snapshot and is never retried.
//!
//! The first [`ConfigLoader::ensure_loaded`] spawns the load as its own task
//! and every caller waits on a [`tokio::sync::watch`] channel for the result.
//! The fetch is owned by that task, not by a caller, so cancelling a caller
//! (abort, `timeout`, losing a `select!`) never drops it or triggers another.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use insights_core::config::{parse_document, ConfigSnapshot};
use insights_core::error::{ConfigError, Result};
use insights_core::LoaderSettings;

use crate::fetcher::{ConfigFetcher, HttpConfigFetcher};

/// Loads the provider configuration at most once and hands out shared snapshots.
pub struct ConfigLoader {
    /// `None` for preloaded loaders, which never fetch.
    fetcher: Option<Arc<dyn ConfigFetcher>>,
    timeout: Duration,
    /// Set by the first `ensure_loaded`; guards the single spawn.
    started: AtomicBool,
    /// `None` until the load task publishes its snapshot.
    state: Arc<watch::Sender<Option<Arc<ConfigSnapshot>>>>,
    /// Served by `configuration()` until the load completes.
    empty: Arc<ConfigSnapshot>,
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("source", &self.fetcher.as_ref().map(|fetcher| fetcher.describe()))
            .field("timeout", &self.timeout)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl ConfigLoader {
    /// Create a loader around any fetcher. Nothing is fetched until
    /// [`ensure_loaded`](Self::ensure_loaded) is called.
    pub fn new(fetcher: Arc<dyn ConfigFetcher>, timeout: Duration) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            fetcher: Some(fetcher),
            timeout,
            started: AtomicBool::new(false),
            state: Arc::new(state),
            empty: Arc::new(ConfigSnapshot::empty()),
        }
    }

    /// Create a loader that fetches over HTTP according to `settings`.
    pub fn from_settings(settings: &LoaderSettings) -> Result<Self> {
        let fetcher = HttpConfigFetcher::from_settings(settings)?;
        Ok(Self::new(Arc::new(fetcher), settings.timeout))
    }

    /// Create an already-loaded loader (e.g. from [`ConfigSnapshot::builtin`]).
    pub fn preloaded(snapshot: ConfigSnapshot) -> Self {
        let (state, _) = watch::channel(Some(Arc::new(snapshot)));
        Self {
            fetcher: None,
            timeout: Duration::ZERO,
            started: AtomicBool::new(true),
            state: Arc::new(state),
            empty: Arc::new(ConfigSnapshot::empty()),
        }
    }

    /// Current snapshot. Never blocks; empty until a load has completed.
    pub fn configuration(&self) -> Arc<ConfigSnapshot> {
        let current = self.state.borrow().clone();
        current.unwrap_or_else(|| Arc::clone(&self.empty))
    }

    /// Whether a load (successful or not) has completed.
    pub fn is_loaded(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Load the configuration if nobody has yet, then return it.
    ///
    /// Never fails: any error is logged and replaced by
    /// [`ConfigSnapshot::fallback`]. Must be called within a tokio runtime.
    pub async fn ensure_loaded(&self) -> Arc<ConfigSnapshot> {
        let mut rx = self.state.subscribe();
        self.start();

        let loaded = rx
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|state| (*state).clone());
        // The sender lives as long as `self`, so the wait only ends with a value.
        loaded.unwrap_or_else(|| Arc::new(ConfigSnapshot::fallback()))
    }

    /// Spawn the load task, once.
    fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(fetcher) = self.fetcher.clone() else {
            return;
        };
        let timeout = self.timeout;
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            let snapshot = load(fetcher, timeout).await;
            state.send_replace(Some(Arc::new(snapshot)));
        });
    }
}

async fn load(fetcher: Arc<dyn ConfigFetcher>, timeout: Duration) -> ConfigSnapshot {
    let source = fetcher.describe();
    debug!(source = %source, "loading llm config");

    match fetch_and_parse(fetcher.as_ref(), timeout).await {
        Ok(snapshot) => {
            info!(
                source = %source,
                providers = snapshot.providers.len(),
                endpoint = %snapshot.api_endpoint,
                "llm config loaded"
            );
            snapshot
        }
        Err(e) => {
            warn!(source = %source, error = %e, "failed to load llm config, using fallback");
            ConfigSnapshot::fallback()
        }
    }
}

async fn fetch_and_parse(fetcher: &dyn ConfigFetcher, timeout: Duration) -> Result<ConfigSnapshot> {
    let body = tokio::time::timeout(timeout, fetcher.fetch())
        .await
        .map_err(|_| ConfigError::Timeout(timeout))??;
    parse_document(&body)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use insights_core::config::{SnapshotSource, DEFAULT_API_ENDPOINT};
    use insights_core::ProviderDescriptor;

    enum Reply {
        Body(&'static str),
        Status(u16),
        Network,
    }

    /// In-memory fetcher that counts calls and can stall before answering.
    struct FakeFetcher {
        reply: Reply,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn new(reply: Reply) -> Arc<Self> {
            Self::slow(reply, Duration::ZERO)
        }

        fn slow(reply: Reply, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                reply,
                delay,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConfigFetcher for FakeFetcher {
        async fn fetch(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.reply {
                Reply::Body(b) => Ok(b.to_string()),
                Reply::Status(code) => Err(ConfigError::Status(*code)),
                Reply::Network => Err(ConfigError::Http("connection refused".into())),
            }
        }

        fn describe(&self) -> String {
            "fake".into()
        }
    }

    fn loader(fetcher: &Arc<FakeFetcher>) -> ConfigLoader {
        ConfigLoader::new(fetcher.clone(), Duration::from_secs(5))
    }

    const GEMINI_DOC: &str = r#"{"llms":[{"id":"gemini","name":"Gemini","cacheKey":"geminiInsightsCache","defaultModel":"gemini-pro","requiresApiKey":"GEMINI_API_KEY"}],"apiEndpoint":"/api/insights/analyze"}"#;

    fn assert_is_fallback(snap: &ConfigSnapshot) {
        assert_eq!(snap.source, SnapshotSource::Fallback);
        assert_eq!(snap.providers, ConfigSnapshot::fallback().providers);
        assert_eq!(snap.providers[0].default_model, "gemini-1.5-flash");
        assert_eq!(snap.api_endpoint, DEFAULT_API_ENDPOINT);
    }

    #[tokio::test]
    async fn test_configuration_empty_before_load() {
        let fetcher = FakeFetcher::new(Reply::Body(GEMINI_DOC));
        let loader = loader(&fetcher);

        let snap = loader.configuration();
        assert!(snap.providers.is_empty());
        assert_eq!(snap.api_endpoint, DEFAULT_API_ENDPOINT);
        assert_eq!(snap.source, SnapshotSource::Empty);
        assert!(!loader.is_loaded());
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_load_gemini_document_round_trip() {
        let fetcher = FakeFetcher::new(Reply::Body(GEMINI_DOC));
        let loader = loader(&fetcher);

        loader.ensure_loaded().await;
        let snap = loader.configuration();
        assert!(loader.is_loaded());
        assert_eq!(snap.source, SnapshotSource::Remote);
        assert_eq!(snap.api_endpoint, "/api/insights/analyze");
        assert_eq!(
            snap.providers,
            vec![ProviderDescriptor::new("gemini", "Gemini", "geminiInsightsCache", "gemini-pro")
                .with_api_key("GEMINI_API_KEY")]
        );
    }

    #[tokio::test]
    async fn test_load_missing_llms() {
        let fetcher = FakeFetcher::new(Reply::Body(r#"{"apiEndpoint": "/custom"}"#));
        let loader = loader(&fetcher);

        let snap = loader.ensure_loaded().await;
        assert!(snap.providers.is_empty());
        assert_eq!(snap.api_endpoint, "/custom");
    }

    #[tokio::test]
    async fn test_load_missing_endpoint() {
        let fetcher = FakeFetcher::new(Reply::Body(
            r#"{"llms": [{"id": "openai", "name": "OpenAI", "cacheKey": "openaiInsightsCache", "defaultModel": "gpt-4o"}]}"#,
        ));
        let loader = loader(&fetcher);

        let snap = loader.ensure_loaded().await;
        assert_eq!(snap.providers.len(), 1);
        assert_eq!(snap.api_endpoint, DEFAULT_API_ENDPOINT);
    }

    #[tokio::test]
    async fn test_server_error_uses_fallback() {
        let fetcher = FakeFetcher::new(Reply::Status(500));
        let loader = loader(&fetcher);

        loader.ensure_loaded().await;
        assert!(loader.is_loaded());
        assert_is_fallback(&*loader.configuration());
    }

    #[tokio::test]
    async fn test_network_error_uses_fallback() {
        let fetcher = FakeFetcher::new(Reply::Network);
        let loader = loader(&fetcher);

        assert_is_fallback(&*loader.ensure_loaded().await);
    }

    #[tokio::test]
    async fn test_malformed_json_uses_fallback() {
        let fetcher = FakeFetcher::new(Reply::Body("<html>not json</html>"));
        let loader = loader(&fetcher);

        assert_is_fallback(&*loader.ensure_loaded().await);
    }

    #[tokio::test]
    async fn test_duplicate_ids_use_fallback() {
        let fetcher = FakeFetcher::new(Reply::Body(
            r#"{"llms": [
                {"id": "a", "name": "A", "cacheKey": "a1", "defaultModel": "m"},
                {"id": "a", "name": "B", "cacheKey": "a2", "defaultModel": "m"}
            ]}"#,
        ));
        let loader = loader(&fetcher);

        assert_is_fallback(&*loader.ensure_loaded().await);
    }

    #[tokio::test]
    async fn test_timeout_uses_fallback() {
        let fetcher = FakeFetcher::slow(Reply::Body(GEMINI_DOC), Duration::from_secs(5));
        let loader = ConfigLoader::new(fetcher.clone(), Duration::from_millis(50));

        assert_is_fallback(&*loader.ensure_loaded().await);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_sequential_calls_fetch_once() {
        let fetcher = FakeFetcher::new(Reply::Body(GEMINI_DOC));
        let loader = loader(&fetcher);

        let first = loader.ensure_loaded().await;
        let second = loader.ensure_loaded().await;
        assert_eq!(fetcher.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_failed_load_is_not_retried() {
        let fetcher = FakeFetcher::new(Reply::Status(503));
        let loader = loader(&fetcher);

        loader.ensure_loaded().await;
        loader.ensure_loaded().await;
        loader.ensure_loaded().await;
        assert_eq!(fetcher.calls(), 1);
        assert_is_fallback(&*loader.configuration());
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_share_one_fetch() {
        let fetcher = FakeFetcher::slow(Reply::Body(GEMINI_DOC), Duration::from_millis(50));
        let loader = Arc::new(loader(&fetcher));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let loader = Arc::clone(&loader);
            handles.push(tokio::spawn(async move { loader.ensure_loaded().await }));
        }

        // While the fetch is in flight, readers still see the empty snapshot.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(loader.configuration().providers.is_empty());

        for handle in handles {
            let snap = handle.await.unwrap();
            assert_eq!(snap.providers[0].id, "gemini");
        }
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_callers_do_not_refetch() {
        let fetcher = FakeFetcher::slow(Reply::Body(GEMINI_DOC), Duration::from_millis(200));
        let loader = Arc::new(loader(&fetcher));

        let first = {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.ensure_loaded().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        first.abort();

        let second =
            tokio::time::timeout(Duration::from_millis(20), loader.ensure_loaded()).await;
        assert!(second.is_err());
        assert!(!loader.is_loaded());

        let snap = loader.ensure_loaded().await;
        assert_eq!(snap.source, SnapshotSource::Remote);
        assert_eq!(snap.providers[0].id, "gemini");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_preloaded_never_fetches() {
        let loader = ConfigLoader::preloaded(ConfigSnapshot::builtin());
        assert!(loader.is_loaded());
        assert_eq!(loader.configuration().providers.len(), 3);

        let snap = loader.ensure_loaded().await;
        assert_eq!(snap.source, SnapshotSource::Builtin);
        assert_eq!(snap.find("claude").unwrap().default_model, "claude-sonnet-4-5");
    }

    // ── over HTTP ──

    mod http {
        use super::*;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn settings_for(server: &MockServer) -> LoaderSettings {
            LoaderSettings {
                base_url: server.uri(),
                ..Default::default()
            }
        }

        #[tokio::test]
        async fn test_http_load_issues_one_request() {
            let mock_server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/llm-config.json"))
                .respond_with(ResponseTemplate::new(200).set_body_string(GEMINI_DOC))
                .expect(1)
                .mount(&mock_server)
                .await;

            let loader = ConfigLoader::from_settings(&settings_for(&mock_server)).unwrap();
            loader.ensure_loaded().await;
            loader.ensure_loaded().await;

            let snap = loader.configuration();
            assert_eq!(snap.source, SnapshotSource::Remote);
            assert_eq!(snap.providers[0].default_model, "gemini-pro");
            // `expect(1)` is verified when the server drops
        }

        #[tokio::test]
        async fn test_http_500_uses_fallback() {
            let mock_server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/llm-config.json"))
                .respond_with(ResponseTemplate::new(500))
                .expect(1)
                .mount(&mock_server)
                .await;

            let loader = ConfigLoader::from_settings(&settings_for(&mock_server)).unwrap();
            assert_is_fallback(&*loader.ensure_loaded().await);
            assert_is_fallback(&*loader.ensure_loaded().await);
        }

        #[tokio::test]
        async fn test_http_unreachable_uses_fallback() {
            let settings = LoaderSettings {
                base_url: "http://127.0.0.1:1".into(),
                ..Default::default()
            };
            let loader = ConfigLoader::from_settings(&settings).unwrap();
            assert_is_fallback(&*loader.ensure_loaded().await);
        }
    }
}

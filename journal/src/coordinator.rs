//! Journal coordinator.
//!
//! The sole entry point the gateway calls after a successful upstream
//! lookup. `record` encodes the entry, resolves its dataset, and hands the
//! configured sink(s) to detached background tasks; the caller gets
//! control back before any backend I/O starts and never observes a sink
//! outcome. Sink failures end here: they are logged and counted, nothing
//! more.

use crate::appender::BlobAppender;
use crate::config::{JournalConfig, JournalProfile};
use crate::datasets::DatasetTable;
use crate::entry::JournalEntry;
use crate::errors::{SinkError, SinkResult};
use crate::kv_sink::KeyValueSink;
use crate::log_sink::LogSink;
use crate::metrics_defs::{
    ALL_METRICS, JOURNAL_RECORD, SINK_CONFLICT, SINK_DURATION, SINK_FAILURE, SINK_SUCCESS,
};
use content_store::{ContentStore, GithubStore};
use indexmap::IndexMap;
use serde_json::Value;
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

#[derive(Clone)]
pub struct JournalCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    profile: JournalProfile,
    datasets: DatasetTable,
    appender: Option<BlobAppender>,
    log_sink: Option<LogSink>,
    kv_sink: Option<KeyValueSink>,
    sink_timeout: Duration,
}

impl JournalCoordinator {
    /// Build the coordinator for the configured deployment profile,
    /// backed by the GitHub content store when the profile appends blobs.
    pub fn new(mut config: JournalConfig) -> Self {
        let store = config
            .blob_store
            .take()
            .map(|store_config| Arc::new(GithubStore::new(store_config)) as Arc<dyn ContentStore>);
        Self::build(config, store)
    }

    /// Build the coordinator over an explicit content store. Backend
    /// transports are swappable without touching journal semantics.
    pub fn with_content_store(mut config: JournalConfig, store: Arc<dyn ContentStore>) -> Self {
        config.blob_store = None;
        Self::build(config, Some(store))
    }

    fn build(config: JournalConfig, store: Option<Arc<dyn ContentStore>>) -> Self {
        shared::metrics_defs::describe_all(ALL_METRICS);

        let profile = config.profile;

        let appender = match profile {
            JournalProfile::BlobAppend => store.map(BlobAppender::new),
            _ => None,
        };
        let log_sink = match profile {
            JournalProfile::LogPost | JournalProfile::LogAndKeyValue => config
                .log_endpoint
                .map(|endpoint| LogSink::new(endpoint.url)),
            _ => None,
        };
        let kv_sink = match profile {
            JournalProfile::LogAndKeyValue => config
                .key_value_endpoint
                .map(|endpoint| KeyValueSink::new(endpoint.base_url)),
            _ => None,
        };

        // A backend the active profile needs but the config does not
        // provide degrades that sink to a no-op, reported once here.
        if profile == JournalProfile::BlobAppend && appender.is_none() {
            tracing::warn!("no blob store configured, blob append sink disabled");
        }
        if matches!(
            profile,
            JournalProfile::LogPost | JournalProfile::LogAndKeyValue
        ) && log_sink.is_none()
        {
            tracing::warn!("no log endpoint configured, log sink disabled");
        }
        if profile == JournalProfile::LogAndKeyValue && kv_sink.is_none() {
            tracing::warn!("no key-value endpoint configured, key-value sink disabled");
        }

        JournalCoordinator {
            inner: Arc::new(CoordinatorInner {
                profile,
                datasets: DatasetTable::new(&config.datasets),
                appender,
                log_sink,
                kv_sink,
                sink_timeout: Duration::from_secs(config.sink_timeout_secs),
            }),
        }
    }

    /// Journal one resolved query. Returns immediately: persistence runs
    /// on detached tasks and its outcome never reaches this caller.
    pub fn record(&self, route: &str, parameters: IndexMap<String, String>, result: Value) {
        counter!(JOURNAL_RECORD).increment(1);

        let entry = JournalEntry::encode(route, parameters, result);
        let descriptor = self.inner.datasets.resolve(route).clone();

        match self.inner.profile {
            JournalProfile::BlobAppend => {
                let inner = self.inner.clone();
                let dataset_id = descriptor.dataset_id;
                tokio::spawn(async move {
                    let Some(appender) = &inner.appender else {
                        return;
                    };
                    let started = Instant::now();
                    let result =
                        bounded(inner.sink_timeout, appender.append(&dataset_id, &entry)).await;
                    report("blob_append", &entry.timestamp, started, result);
                });
            }
            JournalProfile::LogPost => {
                self.spawn_log_task(entry);
            }
            JournalProfile::LogAndKeyValue => {
                // Two independent tasks: one sink failing must not affect
                // the other.
                self.spawn_log_task(entry.clone());

                let inner = self.inner.clone();
                let kind = descriptor.kind;
                tokio::spawn(async move {
                    let Some(kv_sink) = &inner.kv_sink else {
                        return;
                    };
                    let started = Instant::now();
                    let result =
                        bounded(inner.sink_timeout, kv_sink.send(&kind, &entry.result)).await;
                    report("key_value", &entry.timestamp, started, result);
                });
            }
        }
    }

    fn spawn_log_task(&self, entry: JournalEntry) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let Some(log_sink) = &inner.log_sink else {
                return;
            };
            let started = Instant::now();
            let result = bounded(inner.sink_timeout, log_sink.send(&entry)).await;
            report("log_post", &entry.timestamp, started, result);
        });
    }
}

async fn bounded<F>(limit: Duration, call: F) -> SinkResult
where
    F: Future<Output = SinkResult>,
{
    match timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(SinkError::Timeout(limit)),
    }
}

/// Terminal handling for a sink outcome: counted and logged, never
/// propagated.
fn report(sink: &'static str, entry_timestamp: &str, started: Instant, result: SinkResult) {
    histogram!(SINK_DURATION, "sink" => sink).record(started.elapsed().as_secs_f64());

    match &result {
        Ok(()) => {
            counter!(SINK_SUCCESS, "sink" => sink).increment(1);
            tracing::debug!(sink, "journal entry persisted");
        }
        Err(SinkError::Conflict { dataset }) => {
            counter!(SINK_CONFLICT).increment(1);
            counter!(SINK_FAILURE, "sink" => sink).increment(1);
            tracing::warn!(
                dataset = %dataset,
                timestamp = entry_timestamp,
                "journal entry lost to a concurrent writer"
            );
        }
        Err(err) => {
            counter!(SINK_FAILURE, "sink" => sink).increment(1);
            tracing::warn!(sink, error = %err, "journal sink failed, entry lost");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeyValueEndpointConfig, LogEndpointConfig};
    use content_store::MemoryStore;
    use serde_json::json;
    use std::collections::HashMap;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(profile: JournalProfile) -> JournalConfig {
        JournalConfig {
            profile,
            sink_timeout_secs: 5,
            blob_store: None,
            log_endpoint: None,
            key_value_endpoint: None,
            datasets: HashMap::new(),
        }
    }

    fn params(dni: &str) -> IndexMap<String, String> {
        IndexMap::from([("dni".to_string(), dni.to_string())])
    }

    async fn requests_seen(server: &MockServer, at_least: usize) -> usize {
        for _ in 0..250 {
            let count = server.received_requests().await.unwrap().len();
            if count >= at_least {
                return count;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        server.received_requests().await.unwrap().len()
    }

    #[tokio::test]
    async fn test_record_returns_before_backend_io_completes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(1)))
            .mount(&server)
            .await;

        let mut cfg = config(JournalProfile::LogPost);
        cfg.log_endpoint = Some(LogEndpointConfig {
            url: Url::parse(&server.uri()).unwrap(),
        });
        let coordinator = JournalCoordinator::new(cfg);

        let started = Instant::now();
        coordinator.record("/reniec", params("1"), json!({"ok": true}));
        // Bounded independently of the backend's one-second delay.
        assert!(started.elapsed() < Duration::from_millis(250));

        // The write itself still happens.
        assert_eq!(requests_seen(&server, 1).await, 1);
    }

    #[tokio::test]
    async fn test_log_failure_does_not_suppress_key_value_sink() {
        let log_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&log_server)
            .await;

        let kv_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dni"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&kv_server)
            .await;

        let mut cfg = config(JournalProfile::LogAndKeyValue);
        cfg.log_endpoint = Some(LogEndpointConfig {
            url: Url::parse(&log_server.uri()).unwrap(),
        });
        cfg.key_value_endpoint = Some(KeyValueEndpointConfig {
            base_url: Url::parse(&kv_server.uri()).unwrap(),
        });
        let coordinator = JournalCoordinator::new(cfg);

        coordinator.record("/reniec", params("2"), json!({"nombre": "ana"}));

        assert_eq!(requests_seen(&kv_server, 1).await, 1);
        assert_eq!(requests_seen(&log_server, 1).await, 1);
    }

    #[tokio::test]
    async fn test_blob_profile_appends_through_injected_store() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = JournalCoordinator::with_content_store(
            config(JournalProfile::BlobAppend),
            store.clone(),
        );

        coordinator.record("/reniec", params("3"), json!({"nombre": "luis"}));

        let mut stored = None;
        for _ in 0..250 {
            stored = store.contents("dni.json");
            if stored.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let collection = stored.expect("entry persisted");
        let entries = collection.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["route"], json!("/reniec"));
        assert_eq!(entries[0]["parameters"], json!({"dni": "3"}));
    }

    #[tokio::test]
    async fn test_unmapped_route_is_still_persisted() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = JournalCoordinator::with_content_store(
            config(JournalProfile::BlobAppend),
            store.clone(),
        );

        coordinator.record("/mystery", params("4"), json!({}));

        let mut stored = None;
        for _ in 0..250 {
            stored = store.contents("unclassified.json");
            if stored.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_missing_backend_degrades_to_noop() {
        // blob_append profile with no store at all: record must neither
        // panic nor block.
        let coordinator = JournalCoordinator::new(config(JournalProfile::BlobAppend));
        coordinator.record("/reniec", params("5"), json!({}));
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

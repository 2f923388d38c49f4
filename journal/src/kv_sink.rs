//! Dynamic key-value sink.
//!
//! Serializes a flat record into a percent-encoded query string and issues
//! a read-style GET against the endpoint for the dataset kind. Issuing a
//! read to persist data is a backend-compatibility choice: the remote side
//! treats the request as a write trigger, and nothing in the response body
//! is interpreted beyond success or failure.

use crate::errors::{SinkError, SinkResult};
use serde_json::{Map, Value};
use url::Url;

pub struct KeyValueSink {
    client: reqwest::Client,
    base_url: Url,
}

impl KeyValueSink {
    pub fn new(base_url: Url) -> Self {
        KeyValueSink {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Persist one result under the dataset kind. Results that cannot be
    /// reduced to a flat record are skipped (with a warning) and no
    /// request is issued; a skip is not a failure.
    pub async fn send(&self, dataset_kind: &str, result: &Value) -> SinkResult {
        let Some(record) = reduce(dataset_kind, result) else {
            return Ok(());
        };

        let mut url = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            dataset_kind
        );
        let query = encode_query(record);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SinkError::Transport(format!(
                "key-value endpoint returned status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Reduce an upstream result to the flat record this sink can encode.
/// Objects pass through. Arrays are cut down to their first element; the
/// discarded remainder is logged so the loss is observable. Anything else
/// has no key-value representation and is skipped.
fn reduce<'a>(dataset_kind: &str, result: &'a Value) -> Option<&'a Map<String, Value>> {
    match result {
        Value::Object(record) => Some(record),
        Value::Array(items) => match items.first() {
            Some(Value::Object(record)) => {
                if items.len() > 1 {
                    tracing::warn!(
                        dataset = dataset_kind,
                        discarded = items.len() - 1,
                        "array result reduced to its first element"
                    );
                }
                Some(record)
            }
            _ => {
                tracing::warn!(
                    dataset = dataset_kind,
                    "result array holds no leading object, skipping key-value write"
                );
                None
            }
        },
        _ => {
            tracing::warn!(
                dataset = dataset_kind,
                "result has no key-value representation, skipping key-value write"
            );
            None
        }
    }
}

/// Percent-encode each key and value independently and join pairs with
/// `&`, in map insertion order. String values are encoded verbatim; other
/// values use their JSON rendering.
fn encode_query(record: &Map<String, Value>) -> String {
    record
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&rendered)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink_for(server: &MockServer) -> KeyValueSink {
        KeyValueSink::new(Url::parse(&server.uri()).unwrap())
    }

    #[tokio::test]
    async fn test_query_is_percent_encoded_in_insertion_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dni"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = sink_for(&server);
        sink.send("dni", &json!({"a": "1", "b": "x y"})).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), Some("a=1&b=x%20y"));
    }

    #[tokio::test]
    async fn test_empty_record_hits_bare_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/consumos"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = sink_for(&server);
        sink.send("consumos", &json!({})).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), None);
    }

    #[tokio::test]
    async fn test_array_result_reduces_to_first_element() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trabajos"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = sink_for(&server);
        sink.send(
            "trabajos",
            &json!([{"empresa": "acme"}, {"empresa": "other"}]),
        )
        .await
        .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), Some("empresa=acme"));
    }

    #[tokio::test]
    async fn test_unreducible_shapes_skip_without_request() {
        let server = MockServer::start().await;
        // No mock mounted: a request reaching the server would show up in
        // received_requests.

        let sink = sink_for(&server);
        sink.send("dni", &json!("just a string")).await.unwrap();
        sink.send("dni", &json!(42)).await.unwrap();
        sink.send("dni", &json!([])).await.unwrap();
        sink.send("dni", &json!([1, 2, 3])).await.unwrap();

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_string_values_use_json_rendering() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let sink = sink_for(&server);
        sink.send("sueldos", &json!({"monto": 2500, "activo": true}))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), Some("monto=2500&activo=true"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let sink = sink_for(&server);
        let err = sink.send("dni", &json!({"a": "1"})).await.unwrap_err();
        assert!(matches!(err, SinkError::Transport(_)));
    }
}

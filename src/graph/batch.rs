//! JSON batching through the Graph `$batch` endpoint.
//!
//! One POST carries every sub-request. Failures never propagate: callers get
//! an empty response list and treat every item as absent.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::graph::{GraphResult, GraphTransport};

/// Number of sub-requests Graph accepts in one batch.
///
/// Larger batches are not split; Graph rejects them and the executor
/// degrades to an empty result.
pub const MAX_BATCH_REQUESTS: usize = 20;

/// One logical request to multiplex into a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchItem {
    /// Correlation id echoed back in the response.
    pub id: String,
    /// URL relative to the versioned Graph endpoint.
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl BatchItem {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    id: &'a str,
    method: &'a str,
    url: &'a str,
    headers: &'a BTreeMap<String, String>,
    body: Value,
}

/// One sub-response of a batch.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BatchResponse {
    pub id: String,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub body: Value,
}

impl BatchResponse {
    /// Missing statuses count as success.
    pub fn is_success(&self) -> bool {
        self.status.is_none_or(|status| (200..300).contains(&status))
    }

    /// Body of a successful response carrying a string payload.
    pub fn text_body(&self) -> Option<&str> {
        if !self.is_success() {
            return None;
        }
        self.body.as_str()
    }
}

#[derive(Deserialize)]
struct BatchEnvelope {
    #[serde(default)]
    responses: Vec<BatchResponse>,
}

/// Sends batches through a [`GraphTransport`].
pub struct BatchExecutor {
    transport: Arc<dyn GraphTransport>,
    batch_url: String,
}

impl BatchExecutor {
    pub fn new(transport: Arc<dyn GraphTransport>, graph_url: &str) -> Self {
        Self {
            transport,
            batch_url: format!("{}/$batch", graph_url.trim_end_matches('/')),
        }
    }

    /// Executes every item with the same `method`.
    ///
    /// Returns the sub-responses in the order Graph produced them, or an
    /// empty list when the batch as a whole failed.
    pub async fn execute(&self, method: &str, items: &[BatchItem]) -> Vec<BatchResponse> {
        if items.is_empty() {
            return Vec::new();
        }

        if items.len() > MAX_BATCH_REQUESTS {
            log::warn!(
                "Submitting {} batch requests, Graph accepts at most {MAX_BATCH_REQUESTS}",
                items.len()
            );
        }

        match self.send(method, items).await {
            Ok(responses) => responses,
            Err(err) => {
                log::error!("Batch request failed: {err}");
                Vec::new()
            }
        }
    }

    async fn send(&self, method: &str, items: &[BatchItem]) -> GraphResult<Vec<BatchResponse>> {
        let requests = items
            .iter()
            .map(|item| BatchRequest {
                id: &item.id,
                method,
                url: &item.url,
                headers: &item.headers,
                body: item.body.clone().unwrap_or_else(|| json!({})),
            })
            .collect::<Vec<_>>();

        let body = json!({ "requests": requests });
        let value = self.transport.post(&self.batch_url, body).await?;
        let envelope: BatchEnvelope = serde_json::from_value(value)?;

        Ok(envelope.responses)
    }
}

/// Indexes successful string payloads by request id.
pub fn text_lookup(responses: &[BatchResponse]) -> HashMap<&str, &str> {
    responses
        .iter()
        .filter_map(|response| {
            response
                .text_body()
                .map(|body| (response.id.as_str(), body))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GRAPH_URL, GraphError, MockGraphTransport};

    fn photo_items(ids: &[&str]) -> Vec<BatchItem> {
        ids.iter()
            .map(|id| BatchItem::new(*id, format!("/users/{id}/photo/$value")))
            .collect()
    }

    #[tokio::test]
    async fn posts_one_batch_with_uniform_method() {
        let mut transport = MockGraphTransport::new();
        transport
            .expect_post()
            .withf(|url: &str, body: &Value| {
                url == "https://graph.microsoft.com/v1.0/$batch"
                    && body["requests"].as_array().map(Vec::len) == Some(2)
                    && body["requests"][0]["id"] == "u1"
                    && body["requests"][0]["method"] == "GET"
                    && body["requests"][0]["url"] == "/users/u1/photo/$value"
                    && body["requests"][1]["headers"] == json!({})
                    && body["requests"][1]["body"] == json!({})
            })
            .times(1)
            .returning(|_, _| {
                Ok(json!({
                    "responses": [
                        {"id": "u2", "status": 200, "body": "Y"},
                        {"id": "u1", "status": 200, "body": "X"}
                    ]
                }))
            });

        let executor = BatchExecutor::new(Arc::new(transport), GRAPH_URL);
        let responses = executor.execute("GET", &photo_items(&["u1", "u2"])).await;

        assert_eq!(responses.len(), 2);
        let lookup = text_lookup(&responses);
        assert_eq!(lookup.get("u1"), Some(&"X"));
        assert_eq!(lookup.get("u2"), Some(&"Y"));
    }

    #[tokio::test]
    async fn empty_input_skips_the_request() {
        let mut transport = MockGraphTransport::new();
        transport.expect_post().times(0);

        let executor = BatchExecutor::new(Arc::new(transport), GRAPH_URL);
        assert!(executor.execute("GET", &[]).await.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_degrades_to_empty() {
        let mut transport = MockGraphTransport::new();
        transport.expect_post().times(1).returning(|_, _| {
            Err(GraphError::Api {
                status: 503,
                code: "serviceNotAvailable".to_string(),
                message: "try later".to_string(),
            })
        });

        let executor = BatchExecutor::new(Arc::new(transport), GRAPH_URL);
        assert!(executor.execute("GET", &photo_items(&["u1"])).await.is_empty());
    }

    #[tokio::test]
    async fn malformed_envelope_degrades_to_empty() {
        let mut transport = MockGraphTransport::new();
        transport
            .expect_post()
            .times(1)
            .returning(|_, _| Ok(json!({"responses": "nope"})));

        let executor = BatchExecutor::new(Arc::new(transport), GRAPH_URL);
        assert!(executor.execute("GET", &photo_items(&["u1"])).await.is_empty());
    }

    #[test]
    fn lookup_skips_failed_and_non_text_responses() {
        let responses: Vec<BatchResponse> = serde_json::from_value(json!([
            {"id": "u1", "body": "X"},
            {"id": "u2", "status": 404, "body": {"error": {"code": "ImageNotFound"}}},
            {"id": "u3", "status": 200, "body": {"unexpected": true}}
        ]))
        .expect("valid responses");

        let lookup = text_lookup(&responses);
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.get("u1"), Some(&"X"));
    }
}

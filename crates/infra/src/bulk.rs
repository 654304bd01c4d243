//! Bulk fan-out over the multiplexer
//!
//! A batch is validated as a whole before anything is sent: one bad item
//! rejects the batch and no request goes out.

use std::collections::HashMap;
use std::time::Duration;

use airalo_domain::constants::{BULK_ORDER_LIMIT, DEFAULT_POLL_INTERVAL_MS};
use airalo_domain::{AiraloError, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::http::{HttpExecutor, RawResponse, RequestMultiplexer, RequestSpec, TagCollisionPolicy};

/// Decoded response for one bulk item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkEntry {
    /// `0` when the item produced no response.
    pub status: u16,
    /// JSON body; a non-JSON body is kept as a string, an empty one as null.
    pub body: Value,
}

impl BulkEntry {
    fn decode(raw: &RawResponse) -> Self {
        let body = if raw.body().is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(raw.body()).unwrap_or_else(|_| Value::String(raw.text()))
        };
        Self { status: raw.status(), body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Per-item results of a bulk call, keyed by item key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkResults {
    entries: HashMap<String, BulkEntry>,
    abandoned: Vec<String>,
}

impl BulkResults {
    pub fn get(&self, key: &str) -> Option<&BulkEntry> {
        self.entries.get(key)
    }

    pub fn entries(&self) -> &HashMap<String, BulkEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys that never completed because the run was cut short.
    pub fn abandoned(&self) -> &[String] {
        &self.abandoned
    }

    pub fn is_complete(&self) -> bool {
        self.abandoned.is_empty()
    }

    pub fn into_entries(self) -> HashMap<String, BulkEntry> {
        self.entries
    }
}

/// Validates a batch, fans it out and decodes the results.
#[derive(Debug, Clone)]
pub struct BulkOrchestrator {
    executor: HttpExecutor,
    max_batch: usize,
    window: Option<usize>,
    poll_interval: Duration,
}

impl BulkOrchestrator {
    pub fn new(executor: HttpExecutor) -> Self {
        Self {
            executor,
            max_batch: BULK_ORDER_LIMIT,
            window: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch;
        self
    }

    /// Requested multiplexer window; out-of-range values use the default.
    pub fn with_window(mut self, window: Option<usize>) -> Self {
        self.window = window;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build one keyed request per item with `build`, then run them all.
    ///
    /// Returns `Ok(None)` for an empty batch.
    ///
    /// # Errors
    /// - `AiraloError::BatchTooLarge` when `items` exceeds the batch limit
    /// - whatever `build` returns for the first invalid item
    /// - `AiraloError::Validation` when two items share a key
    ///
    /// No request is sent in any of these cases.
    pub async fn dispatch<T, F>(&self, items: &[T], build: F) -> Result<Option<BulkResults>>
    where
        F: Fn(&T) -> Result<(String, RequestSpec)>,
    {
        if items.is_empty() {
            return Ok(None);
        }

        if items.len() > self.max_batch {
            return Err(AiraloError::BatchTooLarge { size: items.len(), max: self.max_batch });
        }

        let specs = items.iter().map(build).collect::<Result<Vec<_>>>()?;

        let mut mux = RequestMultiplexer::new(self.executor.clone())
            .with_collision_policy(TagCollisionPolicy::Reject)
            .with_poll_interval(self.poll_interval);
        for (key, spec) in specs {
            mux.add(Some(&key), spec).map_err(|err| match err {
                AiraloError::DuplicateTag(key) => {
                    AiraloError::Validation(format!("Duplicate item key `{key}` in batch"))
                }
                other => other,
            })?;
        }

        debug!(items = items.len(), "bulk batch validated");
        let Some(outcome) = mux.run(self.window).await else {
            return Ok(None);
        };

        let (responses, abandoned) = outcome.into_parts();
        if !abandoned.is_empty() {
            warn!(abandoned = abandoned.len(), "bulk run ended before every item completed");
        }

        let entries: HashMap<String, BulkEntry> =
            responses.iter().map(|(key, raw)| (key.clone(), BulkEntry::decode(raw))).collect();
        info!(completed = entries.len(), "bulk run finished");

        Ok(Some(BulkResults { entries, abandoned }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::http::testing::{Reply, ScriptedTransport};

    fn orchestrator(transport: &Arc<ScriptedTransport>) -> BulkOrchestrator {
        BulkOrchestrator::new(HttpExecutor::new(transport.clone()))
            .with_poll_interval(Duration::from_millis(10))
    }

    fn build(item: &(&str, u32)) -> Result<(String, RequestSpec)> {
        let (key, quantity) = *item;
        if quantity == 0 {
            return Err(AiraloError::Validation(format!("The quantity is required for `{key}`")));
        }
        Ok((key.to_string(), RequestSpec::post(format!("https://api.test/{key}")).json(json!({ "quantity": quantity }))))
    }

    #[tokio::test]
    async fn empty_batch_sends_nothing() {
        let transport = ScriptedTransport::ok("{}");
        let result = orchestrator(&transport).dispatch(&[] as &[(&str, u32)], build).await.unwrap();
        assert!(result.is_none());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn oversized_batch_is_rejected_before_io() {
        let transport = ScriptedTransport::ok("{}");
        let items: Vec<(&str, u32)> = vec![("k", 1); BULK_ORDER_LIMIT + 1];
        let err = orchestrator(&transport).dispatch(&items, build).await.unwrap_err();
        assert_eq!(err, AiraloError::BatchTooLarge { size: 51, max: 50 });
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn one_invalid_item_rejects_the_whole_batch() {
        let transport = ScriptedTransport::ok("{}");
        let items = [("a", 1), ("b", 0), ("c", 2)];
        let err = orchestrator(&transport).dispatch(&items, build).await.unwrap_err();
        match err {
            AiraloError::Validation(msg) => assert!(msg.contains("`b`")),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn duplicate_keys_are_a_validation_error() {
        let transport = ScriptedTransport::ok("{}");
        let items = [("a", 1), ("a", 2)];
        let err = orchestrator(&transport).dispatch(&items, build).await.unwrap_err();
        assert!(matches!(err, AiraloError::Validation(msg) if msg.contains("`a`")));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn results_are_decoded_per_key() {
        let transport = ScriptedTransport::new(|request| match request.url().path() {
            "/ok" => Reply::json(200, &json!({ "data": { "id": 1 } })),
            "/rejected" => Reply::json(422, &json!({ "meta": { "message": "invalid" } })),
            "/html" => Reply::status(502, "<html>bad gateway</html>"),
            _ => Reply::io("connection reset"),
        });
        let items = [("ok", 1), ("rejected", 1), ("html", 1), ("down", 1)];

        let results = orchestrator(&transport).dispatch(&items, build).await.unwrap().unwrap();
        assert!(results.is_complete());
        assert_eq!(results.len(), 4);
        assert_eq!(results.get("ok").unwrap().body["data"]["id"], 1);
        assert!(results.get("ok").unwrap().is_success());
        assert_eq!(results.get("rejected").unwrap().status, 422);
        assert_eq!(results.get("html").unwrap().body, json!("<html>bad gateway</html>"));
        let down = results.get("down").unwrap();
        assert_eq!((down.status, &down.body), (0, &Value::Null));
    }
}

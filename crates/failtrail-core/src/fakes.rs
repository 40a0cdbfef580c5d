//! In-memory fake for the history capability (testing only)
//!
//! `MemoryHistoryClient` serves canned responses keyed by exact path and
//! records every request so tests can assert which calls were made.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::history::HistoryClient;

/// History client backed by `HashMap<path, response>`.
///
/// Paths without a registered response answer `None`, which is how the
/// real client reports a failed request.
#[derive(Debug, Default)]
pub struct MemoryHistoryClient {
    json: HashMap<String, Value>,
    raw: HashMap<String, String>,
    json_requests: Mutex<Vec<String>>,
    raw_requests: Mutex<Vec<String>>,
}

impl MemoryHistoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `fetch_json(path)`.
    pub fn with_json(mut self, path: impl Into<String>, body: Value) -> Self {
        self.json.insert(path.into(), body);
        self
    }

    /// Serve `body` for `fetch_raw(path)`.
    pub fn with_raw(mut self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.raw.insert(path.into(), body.into());
        self
    }

    /// Paths requested through `fetch_json`, in call order.
    pub fn json_requests(&self) -> Vec<String> {
        self.json_requests.lock().unwrap().clone()
    }

    /// Paths requested through `fetch_raw`, in call order.
    pub fn raw_requests(&self) -> Vec<String> {
        self.raw_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistoryClient for MemoryHistoryClient {
    async fn fetch_json(&self, path: &str) -> Option<Value> {
        self.json_requests.lock().unwrap().push(path.to_string());
        self.json.get(path).cloned()
    }

    async fn fetch_raw(&self, path: &str) -> Option<String> {
        self.raw_requests.lock().unwrap().push(path.to_string());
        self.raw.get(path).cloned()
    }
}

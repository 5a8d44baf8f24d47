//! In-memory `ApiClient` for unit tests

use crate::error::{Error, Result};
use crate::http::ApiClient;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Serves queued JSON bodies by URL path and records every request
#[derive(Debug)]
pub struct ScriptedClient {
    base_url: String,
    responses: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            responses: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a body for the next GET of `path` (relative to the base URL)
    pub fn respond(&self, path: &str, body: Value) -> &Self {
        self.push(path, Ok(body))
    }

    /// Queue an error for the next GET of `path`
    pub fn fail(&self, path: &str, error: Error) -> &Self {
        self.push(path, Err(error))
    }

    fn push(&self, path: &str, response: Result<Value>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(path.trim_start_matches('/').to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Full URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Requested URLs whose path equals `path`
    pub fn requests_for(&self, path: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|url| self.relative_path(url) == path)
            .collect()
    }

    fn relative_path(&self, url: &str) -> String {
        let without_query = url.split('?').next().unwrap_or(url);
        without_query
            .strip_prefix(&self.base_url)
            .unwrap_or(without_query)
            .trim_start_matches('/')
            .to_string()
    }
}

#[async_trait]
impl ApiClient for ScriptedClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, url: &str, _endpoint: &str) -> Result<Value> {
        self.requests.lock().unwrap().push(url.to_string());
        let path = self.relative_path(url);
        self.responses
            .lock()
            .unwrap()
            .get_mut(&path)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(Value::Object(Default::default())))
    }

    async fn post(&self, url: &str, endpoint: &str, _body: Value) -> Result<Value> {
        self.get(url, endpoint).await
    }
}

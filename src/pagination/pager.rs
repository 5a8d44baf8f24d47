//! Page-by-page fetch driver

use super::next_link::NextLinkPaginator;
use super::types::{NextPage, PaginationState, Paginator};
use crate::error::{Error, Result};
use crate::http::ApiClient;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

const SUCCESS: &str = "SUCCESS";

/// Lazily fetches the pages of one request chain
///
/// Each call to [`Pager::next_page`] issues at most one GET. The chain ends
/// when the server stops returning a next link, when a page carries no
/// records, or on the first error.
pub struct Pager {
    client: Arc<dyn ApiClient>,
    stream: String,
    array_key: String,
    paginator: NextLinkPaginator,
    next_url: Option<String>,
    state: PaginationState,
}

impl Pager {
    /// Start a chain at `url`
    ///
    /// `stream` names the endpoint for logging and errors; `array_key` is the
    /// top-level array holding the page's records.
    pub fn new(
        client: Arc<dyn ApiClient>,
        url: impl Into<String>,
        stream: impl Into<String>,
        array_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            stream: stream.into(),
            array_key: array_key.into(),
            paginator: NextLinkPaginator::new(),
            next_url: Some(url.into()),
            state: PaginationState::new(),
        }
    }

    /// Fetch the next page, or `None` once the chain is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Value>> {
        if self.state.done {
            return Ok(None);
        }
        let Some(url) = self.next_url.take() else {
            self.state.mark_done();
            return Ok(None);
        };

        let body = self.client.get(&url, &self.stream).await?;
        self.accept(body)
    }

    /// Validate a fetched body and advance the chain
    ///
    /// Also used for synthesized pages that bypass the list endpoint.
    pub fn accept(&mut self, body: Value) -> Result<Option<Value>> {
        if is_empty_body(&body) {
            debug!(stream = %self.stream, "No data results returned");
            self.state.mark_done();
            return Ok(None);
        }

        let status = body
            .get("request_status")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if status != SUCCESS {
            self.state.mark_done();
            return Err(Error::RequestFailed {
                stream: self.stream.clone(),
                status: status.to_string(),
                payload: body,
            });
        }

        let records_count = body
            .get(&self.array_key)
            .and_then(Value::as_array)
            .map_or(0, Vec::len);

        if records_count == 0 {
            debug!(stream = %self.stream, page = self.state.page, "Empty page, stopping");
            self.state.mark_done();
            return Ok(None);
        }

        match self
            .paginator
            .process_response(&body, records_count, &mut self.state)
        {
            NextPage::Continue { url } => self.next_url = Some(url),
            NextPage::Done => self.next_url = None,
        }

        debug!(
            stream = %self.stream,
            records = records_count,
            total = self.state.total_fetched,
            more = self.next_url.is_some(),
            "Fetched page"
        );
        Ok(Some(body))
    }
}

impl std::fmt::Debug for Pager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("stream", &self.stream)
            .field("next_url", &self.next_url)
            .field("state", &self.state)
            .finish()
    }
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

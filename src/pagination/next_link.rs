//! Server-driven `paging.next_link` pagination

use super::types::{NextPage, PaginationState, Paginator};
use serde_json::Value;

/// Follows the absolute URL the API returns under `paging.next_link`
#[derive(Debug, Clone, Default)]
pub struct NextLinkPaginator;

impl NextLinkPaginator {
    pub fn new() -> Self {
        Self
    }

    /// Next link carried by a response body, if any
    pub fn next_link(body: &Value) -> Option<&str> {
        body.get("paging")
            .and_then(|paging| paging.get("next_link"))
            .and_then(Value::as_str)
            .filter(|link| !link.is_empty())
    }
}

impl Paginator for NextLinkPaginator {
    fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.add_fetched(records_count as u64);

        if let Some(next_url) = Self::next_link(body) {
            state.next_page();
            return NextPage::with_url(next_url);
        }

        state.mark_done();
        NextPage::Done
    }
}

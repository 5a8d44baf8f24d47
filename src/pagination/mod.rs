//! Pagination module
//!
//! # Overview
//!
//! The Snapchat API pages list endpoints by returning an absolute
//! `paging.next_link` URL. [`Pager`] drives that chain one GET at a time,
//! checking the top-level `request_status` of every page, while
//! [`NextLinkPaginator`] decides from a response body whether another page
//! follows.

mod next_link;
mod pager;
mod types;

pub use next_link::NextLinkPaginator;
pub use pager::Pager;
pub use types::{NextPage, PaginationState, Paginator};

#[cfg(test)]
mod tests;

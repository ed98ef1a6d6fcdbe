//! The remote page/block source abstraction.
//!
//! [`RemoteStore`] is the seam between the engine and the remote content
//! store: the query layer, tree fetcher, and citation resolver only ever talk
//! to this trait. Production code uses [`crate::http::HttpStore`]; tests
//! supply in-memory implementations with scripted pages and call counters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{Block, Page};
use crate::Result;

/// One page of a paginated remote listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items of this page, in the store's native order.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    /// Opaque continuation cursor for the next page, if any.
    #[serde(default)]
    pub next_cursor: Option<String>,
    /// Whether more pages follow.
    #[serde(default)]
    pub has_more: bool,
}

impl<T> Paginated<T> {
    /// A single-page result with no continuation. Fixture helper.
    #[must_use]
    pub fn single(results: Vec<T>) -> Self {
        Self {
            results,
            next_cursor: None,
            has_more: false,
        }
    }
}

/// Read-only interface to the remote block-structured content store.
///
/// Every method is one request/response round trip. No retries happen at this
/// level; a failed call is failure, full stop.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Resolves the queryable data-source id for a stable collection id.
    ///
    /// Called once per collection and memoized by the engine for the life of
    /// the process, since the mapping rarely changes.
    async fn data_source_id(&self, collection_id: &str) -> Result<String>;

    /// Lists one page of the pages in a data source.
    async fn query_data_source(
        &self,
        data_source_id: &str,
        cursor: Option<&str>,
    ) -> Result<Paginated<Page>>;

    /// Fetches a single page by id.
    async fn get_page(&self, page_id: &str) -> Result<Page>;

    /// Lists one page of the direct children of a block or page.
    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<Paginated<Block>>;

    /// Runs the store's native free-text search over pages, capped to `limit`
    /// results.
    async fn search_pages(&self, query: &str, limit: usize) -> Result<Vec<Page>>;
}

/// Drains a paginated listing into a single ordered vector.
///
/// Pagination is strictly sequential: each request's cursor comes from the
/// prior response. Concatenation preserves the store's native order across
/// page boundaries.
pub async fn drain_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<Paginated<T>>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let batch = fetch(cursor.take()).await?;
        items.extend(batch.results);
        if !batch.has_more {
            break;
        }
        match batch.next_cursor {
            Some(next) => cursor = Some(next),
            // has_more without a cursor would loop forever; treat as end.
            None => break,
        }
    }
    Ok(items)
}

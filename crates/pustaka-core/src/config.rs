//! Configuration for the remote store client, the query engine, and the
//! revalidation cache.
//!
//! All knobs are plain structs with `Default` impls carrying the fixed
//! constants; callers override fields as needed at construction time. Nothing
//! here reads the environment or touches disk.

use std::time::Duration;

/// Configuration for the HTTP remote-store client.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the remote block store, without a trailing slash.
    pub base_url: String,
    /// Optional bearer token forwarded on every request. Credential
    /// management itself is the caller's concern.
    pub token: Option<String>,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
    /// Page size requested from paginated endpoints.
    pub page_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.notion.com".to_string(),
            token: None,
            timeout: Duration::from_secs(30),
            page_size: 100,
        }
    }
}

/// Configuration for the query engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Stable id of the content collection holding all documents.
    pub collection_id: String,
    /// Category value that marks a document as an archive entry.
    pub archive_category: String,
    /// Maximum number of hits returned by free-text search.
    pub search_limit: usize,
    /// Cap on concurrently in-flight sibling subtree fetches during block
    /// tree assembly.
    pub subtree_concurrency: usize,
}

impl EngineConfig {
    /// Creates a config for the given collection id with default limits.
    #[must_use]
    pub fn new(collection_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            collection_id: String::new(),
            archive_category: "arsip".to_string(),
            search_limit: 5,
            subtree_concurrency: 4,
        }
    }
}

/// Configuration for the revalidation cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time span during which a cached list result is served without
    /// re-querying the remote store.
    pub revalidate_after: Duration,
    /// Absolute staleness ceiling: when a refresh fails, a previously cached
    /// value older than this is no longer served and the error propagates.
    pub max_stale: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let revalidate_after = Duration::from_secs(300);
        Self {
            revalidate_after,
            max_stale: revalidate_after * 4,
        }
    }
}

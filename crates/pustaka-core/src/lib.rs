//! # pustaka-core
//!
//! Hierarchical content retrieval and cross-document citation engine over a
//! remote block-structured content store.
//!
//! The crate sits between the store's paginated API and a rendering layer:
//! it assembles documents as trees of typed blocks, projects free-form page
//! properties into typed metadata, indexes author-written anchor tags into
//! addressable block groups, resolves `block://` and `cite://` references
//! across documents, and caches the expensive listings with time-based
//! revalidation and tag-based invalidation.
//!
//! ## Architecture
//!
//! Data flows one direction:
//!
//! ```text
//! RemoteStore -> tree fetcher -> (property projector, anchor map) -> Engine -> CachedEngine
//! ```
//!
//! - **[`source`]**: the [`RemoteStore`] trait and pagination envelope
//! - **[`http`]**: the HTTP client implementing it
//! - **[`tree`]**: recursive block tree assembly
//! - **[`props`]**: property bag projection with documented defaults
//! - **[`anchor`]**: anchor tag grammar, anchor maps, link references
//! - **[`cite`]**: citation resolution with distinguishable misses
//! - **[`query`]**: list / get-by-slug / archive / search operations
//! - **[`cache`]**: revalidation window, tag invalidation, request scopes
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use pustaka_core::{
//!     CacheConfig, CachedEngine, Engine, EngineConfig, HttpStore, StoreConfig,
//! };
//!
//! # async fn run() -> pustaka_core::Result<()> {
//! let store = Arc::new(HttpStore::new(StoreConfig {
//!     token: std::env::var("STORE_TOKEN").ok(),
//!     ..StoreConfig::default()
//! })?);
//! let engine = Engine::new(store, EngineConfig::new("my-collection-id"));
//! let content = CachedEngine::new(engine, CacheConfig::default());
//!
//! let docs = content.fetch_all_docs().await?;
//! println!("{} published documents", docs.len());
//!
//! if let Some(citation) = content.resolve_citation("anggaran-dasar", "scope").await? {
//!     println!("cited {} blocks from {}", citation.blocks.len(), citation.source_title);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error handling
//!
//! Absence is not an error: missing documents, anchors, and archive entries
//! come back as `None`/empty. [`Error`] covers transport failures, remote API
//! rejections, and malformed envelopes; malformed page *properties* never
//! error and instead degrade to documented defaults.

/// Anchor tags, anchor maps, and the link grammar
pub mod anchor;
/// Revalidation cache and request-scoped memoization
pub mod cache;
/// Citation resolution across documents
pub mod cite;
/// Client, engine, and cache configuration
pub mod config;
/// Error types and result alias
pub mod error;
/// HTTP client for the remote store
pub mod http;
/// Property bag projection into typed metadata
pub mod props;
/// Query layer: list, lookup, archive, search
pub mod query;
/// Remote store trait and pagination envelope
pub mod source;
/// Recursive block tree assembly
pub mod tree;
/// Core data types: pages, blocks, rich text, metadata
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use anchor::{build_anchor_map, strip_anchor_tags, AnchorMap, AnchorTag, LinkRef};
pub use cache::{CachedEngine, Clock, RequestScope, SystemClock, TAG_ARCHIVES, TAG_DOCS};
pub use cite::{resolve_citation, CitationOutcome};
pub use config::{CacheConfig, EngineConfig, StoreConfig};
pub use error::{Error, Result};
pub use http::HttpStore;
pub use props::{project_archive_entry, project_meta};
pub use query::Engine;
pub use source::{Paginated, RemoteStore};
pub use tree::fetch_block_tree;
pub use types::*;

//! Time-boxed revalidation cache over the expensive list queries.
//!
//! [`CachedEngine`] wraps [`Engine`] and serves the document and archive
//! listings from memory within a fixed revalidation window, keyed by logical
//! tags that external "content changed" triggers can invalidate immediately.
//! Point lookups (slug, id) and search are deliberately not covered by the
//! window; for those, [`RequestScope`] offers request-scoped memoization that
//! dedupes repeated lookups within one logical request without becoming a
//! standing cache.
//!
//! Stale policy: when a refresh past the window fails but a previous value
//! exists and is younger than the absolute staleness ceiling, the stale value
//! is served and a warning logged; with no usable value the error propagates.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::cite::{self, CitationOutcome};
use crate::config::CacheConfig;
use crate::query::{normalize_slug, Engine};
use crate::types::{ArchiveDocument, ArchiveEntry, Citation, DocMeta, Document, SearchResult};
use crate::Result;

/// Invalidation tag covering the document listing.
pub const TAG_DOCS: &str = "docs";
/// Invalidation tag covering all archive listings.
pub const TAG_ARCHIVES: &str = "archives";

/// Injectable time source so tests can control the revalidation window.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// Wall-clock [`Clock`] used outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    computed_at: Instant,
}

/// The cached read surface consumed by the rendering layer.
pub struct CachedEngine {
    engine: Engine,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    docs: RwLock<Option<Entry<Vec<DocMeta>>>>,
    archives: RwLock<HashMap<String, Entry<Vec<ArchiveEntry>>>>,
}

impl CachedEngine {
    /// Wraps an engine with the wall clock.
    #[must_use]
    pub fn new(engine: Engine, config: CacheConfig) -> Self {
        Self::with_clock(engine, config, Arc::new(SystemClock))
    }

    /// Wraps an engine with an injected clock.
    #[must_use]
    pub fn with_clock(engine: Engine, config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine,
            clock,
            config,
            docs: RwLock::new(None),
            archives: RwLock::new(HashMap::new()),
        }
    }

    /// The wrapped engine, for uncached access.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Cached document listing. See [`Engine::fetch_all_docs`].
    pub async fn fetch_all_docs(&self) -> Result<Vec<DocMeta>> {
        if let Some(value) = self.fresh(&self.docs).await {
            return Ok(value);
        }
        match self.engine.fetch_all_docs().await {
            Ok(value) => {
                *self.docs.write().await = Some(self.entry(value.clone()));
                Ok(value)
            },
            Err(err) => self.stale_or(&self.docs, err).await,
        }
    }

    /// Cached archive listing per tag filter. See [`Engine::fetch_archives`].
    pub async fn fetch_archives(&self, tag: Option<&str>) -> Result<Vec<ArchiveEntry>> {
        let key = tag.map(str::to_lowercase).unwrap_or_default();
        let now = self.clock.now();
        {
            let guard = self.archives.read().await;
            if let Some(entry) = guard.get(&key) {
                if now.duration_since(entry.computed_at) < self.config.revalidate_after {
                    return Ok(entry.value.clone());
                }
            }
        }
        match self.engine.fetch_archives(tag).await {
            Ok(value) => {
                self.archives
                    .write()
                    .await
                    .insert(key, self.entry(value.clone()));
                Ok(value)
            },
            Err(err) => {
                let guard = self.archives.read().await;
                if let Some(entry) = guard.get(&key) {
                    if self.within_stale_ceiling(entry) {
                        warn!(error = %err, tag = %key, "archive refresh failed; serving stale");
                        return Ok(entry.value.clone());
                    }
                }
                Err(err)
            },
        }
    }

    /// Uncached pass-through. See [`Engine::fetch_doc_by_slug`].
    pub async fn fetch_doc_by_slug(&self, slug: &str) -> Result<Option<Document>> {
        self.engine.fetch_doc_by_slug(slug).await
    }

    /// Uncached pass-through. See [`Engine::fetch_archive_by_id`].
    pub async fn fetch_archive_by_id(&self, id: &str) -> Result<Option<ArchiveDocument>> {
        self.engine.fetch_archive_by_id(id).await
    }

    /// Uncached pass-through. See [`Engine::search_docs`].
    pub async fn search_docs(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.engine.search_docs(query).await
    }

    /// Resolves a citation, collapsing the miss reason to `None`. The
    /// detailed outcome is available via [`cite::resolve_citation`] on the
    /// wrapped engine.
    pub async fn resolve_citation(
        &self,
        slug: &str,
        anchor_id: &str,
    ) -> Result<Option<Citation>> {
        Ok(cite::resolve_citation(&self.engine, slug, anchor_id)
            .await?
            .into_option())
    }

    /// Starts a request-scoped memoization handle.
    #[must_use]
    pub fn request(&self) -> RequestScope<'_> {
        RequestScope {
            cached: self,
            docs: Mutex::new(HashMap::new()),
        }
    }

    /// Clears the cache for one logical tag immediately, regardless of
    /// remaining window.
    pub async fn invalidate(&self, tag: &str) {
        match tag {
            TAG_DOCS => {
                *self.docs.write().await = None;
                debug!(tag, "cache invalidated");
            },
            TAG_ARCHIVES => {
                self.archives.write().await.clear();
                debug!(tag, "cache invalidated");
            },
            other => debug!(tag = other, "ignoring unknown invalidation tag"),
        }
    }

    /// Clears every cached listing.
    pub async fn invalidate_all(&self) {
        self.invalidate(TAG_DOCS).await;
        self.invalidate(TAG_ARCHIVES).await;
    }

    fn entry<T>(&self, value: T) -> Entry<T> {
        Entry {
            value,
            computed_at: self.clock.now(),
        }
    }

    fn within_stale_ceiling<T>(&self, entry: &Entry<T>) -> bool {
        self.clock.now().duration_since(entry.computed_at) < self.config.max_stale
    }

    async fn fresh<T: Clone>(&self, slot: &RwLock<Option<Entry<T>>>) -> Option<T> {
        let guard = slot.read().await;
        let entry = guard.as_ref()?;
        let age = self.clock.now().duration_since(entry.computed_at);
        (age < self.config.revalidate_after).then(|| entry.value.clone())
    }

    async fn stale_or<T: Clone>(
        &self,
        slot: &RwLock<Option<Entry<T>>>,
        err: crate::Error,
    ) -> Result<T> {
        let guard = slot.read().await;
        if let Some(entry) = guard.as_ref() {
            if self.within_stale_ceiling(entry) {
                warn!(error = %err, "refresh failed; serving stale cached value");
                return Ok(entry.value.clone());
            }
        }
        Err(err)
    }
}

/// Request-scoped memoization of per-call lookups.
///
/// Safe for deduplicating repeated lookups within one logical request; drop
/// the scope when the request ends. This never outlives the window semantics
/// of the standing cache because it holds its own memo only.
pub struct RequestScope<'a> {
    cached: &'a CachedEngine,
    docs: Mutex<HashMap<String, Option<Document>>>,
}

impl RequestScope<'_> {
    /// Slug lookup, memoized within this scope (including misses). Errors
    /// are not memoized.
    pub async fn doc_by_slug(&self, slug: &str) -> Result<Option<Document>> {
        let key = normalize_slug(slug);
        let mut memo = self.docs.lock().await;
        if let Some(hit) = memo.get(&key) {
            return Ok(hit.clone());
        }
        let result = self.cached.fetch_doc_by_slug(slug).await?;
        memo.insert(key, result.clone());
        Ok(result)
    }

    /// Citation resolution reusing this scope's memoized documents, so
    /// several citations into the same document cost one fetch.
    pub async fn resolve_citation(
        &self,
        slug: &str,
        anchor_id: &str,
    ) -> Result<Option<Citation>> {
        let Some(document) = self.doc_by_slug(slug).await? else {
            return Ok(CitationOutcome::UnknownDocument.into_option());
        };
        let mut map = crate::anchor::build_anchor_map(&document.blocks);
        Ok(map.remove(anchor_id).map(|blocks| Citation {
            blocks,
            source_slug: document.meta.slug,
            source_title: document.meta.title,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::testing::{paragraph, MockStore, PageFixture};
    use std::sync::atomic::Ordering;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    /// Deterministic clock advanced by hand.
    struct ManualClock {
        origin: Instant,
        offset: StdMutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: StdMutex::new(Duration::ZERO),
            }
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.origin + *self.offset.lock().unwrap()
        }
    }

    fn fixture() -> (Arc<MockStore>, Arc<ManualClock>, CachedEngine) {
        let store = Arc::new(
            MockStore::new()
                .with_pages(vec![
                    PageFixture::new("p1", "Beranda").slug("beranda").build(),
                    PageFixture::new("a1", "Lomba")
                        .category("arsip")
                        .date("2025-05-01")
                        .build(),
                ])
                .with_children("p1", vec![paragraph("b1", "selamat datang [#intro]")]),
        );
        let clock = Arc::new(ManualClock::new());
        let engine = Engine::new(
            Arc::clone(&store) as Arc<dyn crate::source::RemoteStore>,
            EngineConfig::new("col"),
        );
        let cached = CachedEngine::with_clock(
            engine,
            CacheConfig {
                revalidate_after: Duration::from_secs(300),
                max_stale: Duration::from_secs(1200),
            },
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        (store, clock, cached)
    }

    #[tokio::test]
    async fn serves_from_cache_within_window() -> anyhow::Result<()> {
        let (store, clock, cached) = fixture();

        cached.fetch_all_docs().await?;
        clock.advance(Duration::from_secs(299));
        cached.fetch_all_docs().await?;
        assert_eq!(
            store.calls.query.load(Ordering::SeqCst),
            1,
            "second call within the window must not hit the remote store"
        );
        Ok(())
    }

    #[tokio::test]
    async fn refreshes_after_window_elapses() -> anyhow::Result<()> {
        let (store, clock, cached) = fixture();

        cached.fetch_all_docs().await?;
        clock.advance(Duration::from_secs(301));
        cached.fetch_all_docs().await?;
        assert_eq!(
            store.calls.query.load(Ordering::SeqCst),
            2,
            "a call past the window issues exactly one more fetch"
        );
        Ok(())
    }

    #[tokio::test]
    async fn explicit_invalidation_forces_recompute() -> anyhow::Result<()> {
        let (store, _clock, cached) = fixture();

        cached.fetch_all_docs().await?;
        cached.invalidate(TAG_DOCS).await;
        cached.fetch_all_docs().await?;
        assert_eq!(store.calls.query.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn archive_cache_is_keyed_by_tag_filter() -> anyhow::Result<()> {
        let (store, _clock, cached) = fixture();

        cached.fetch_archives(None).await?;
        cached.fetch_archives(Some("lomba")).await?;
        cached.fetch_archives(None).await?;
        cached.fetch_archives(Some("Lomba")).await?;
        assert_eq!(
            store.calls.query.load(Ordering::SeqCst),
            2,
            "each tag key computes once; the filter key is case-folded"
        );
        Ok(())
    }

    #[tokio::test]
    async fn serves_stale_on_refresh_failure_within_ceiling() -> anyhow::Result<()> {
        let (store, clock, cached) = fixture();

        let first = cached.fetch_all_docs().await?;
        store.fail_queries.store(true, Ordering::SeqCst);
        clock.advance(Duration::from_secs(600));

        let stale = cached.fetch_all_docs().await?;
        assert_eq!(stale, first, "stale value served while under the ceiling");
        Ok(())
    }

    #[tokio::test]
    async fn propagates_error_past_staleness_ceiling() -> anyhow::Result<()> {
        let (store, clock, cached) = fixture();

        cached.fetch_all_docs().await?;
        store.fail_queries.store(true, Ordering::SeqCst);
        clock.advance(Duration::from_secs(1300));

        assert!(
            cached.fetch_all_docs().await.is_err(),
            "past max_stale the failure must surface"
        );
        Ok(())
    }

    #[tokio::test]
    async fn error_with_no_cached_value_propagates() {
        let (store, _clock, cached) = fixture();
        store.fail_queries.store(true, Ordering::SeqCst);
        assert!(cached.fetch_all_docs().await.is_err());
    }

    #[tokio::test]
    async fn request_scope_dedupes_slug_lookups() -> anyhow::Result<()> {
        let (store, _clock, cached) = fixture();

        let scope = cached.request();
        let first = scope.doc_by_slug("beranda").await?.expect("doc exists");
        let citation = scope
            .resolve_citation("beranda", "intro")
            .await?
            .expect("anchor resolves");
        assert_eq!(citation.source_slug, first.meta.slug);
        assert_eq!(
            store.calls.query.load(Ordering::SeqCst),
            1,
            "the citation reuses the memoized document"
        );

        // A fresh scope is a fresh memo: this is not a standing cache.
        let second_scope = cached.request();
        second_scope.doc_by_slug("beranda").await?;
        assert_eq!(store.calls.query.load(Ordering::SeqCst), 2);
        Ok(())
    }
}

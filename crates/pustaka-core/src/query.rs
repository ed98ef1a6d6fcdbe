//! High-level read operations over the remote collection.
//!
//! [`Engine`] combines the remote store, the tree fetcher, and the property
//! projector into the read paths consumed by the rendering layer: list all
//! documents, get one by slug, list archive entries, point-lookup an archive
//! entry, and free-text search. Construction takes the store as a trait
//! object so tests can script remote behavior; nothing here touches global
//! state.
//!
//! The data-source id for the configured collection is resolved on first use
//! and memoized for the life of the engine, since the mapping rarely changes.

use std::cmp::Ordering;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::props::{category_of, project_archive_entry, project_meta};
use crate::source::{RemoteStore, drain_pages};
use crate::tree::fetch_block_tree;
use crate::types::{ArchiveDocument, ArchiveEntry, DocMeta, Document, SearchResult};
use crate::Result;

/// The document/archive/search query layer.
pub struct Engine {
    store: Arc<dyn RemoteStore>,
    config: EngineConfig,
    data_source: OnceCell<String>,
}

impl Engine {
    /// Creates an engine over the given store and configuration.
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            data_source: OnceCell::new(),
        }
    }

    /// The engine's configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn data_source_id(&self) -> Result<&str> {
        self.data_source
            .get_or_try_init(|| self.store.data_source_id(&self.config.collection_id))
            .await
            .map(String::as_str)
    }

    /// Lists every published document, sorted by explicit order, then
    /// category, then title (both case-insensitive). Ties keep their scan
    /// order.
    pub async fn fetch_all_docs(&self) -> Result<Vec<DocMeta>> {
        let data_source = self.data_source_id().await?;
        let pages = drain_pages(|cursor| async move {
            self.store
                .query_data_source(data_source, cursor.as_deref())
                .await
        })
        .await?;

        let mut docs: Vec<DocMeta> = pages
            .iter()
            .map(project_meta)
            .filter(|meta| meta.published)
            .collect();
        docs.sort_by(compare_docs);
        info!(count = docs.len(), "listed published documents");
        Ok(docs)
    }

    /// Finds the first published document whose slug matches
    /// (case-insensitive, trimmed) and fetches its full block tree.
    ///
    /// The paginated scan short-circuits on the first hit. Returns `None`
    /// when the scan exhausts the collection without a match.
    ///
    /// Slug uniqueness is not enforced by the remote store; on duplicates,
    /// "first match in scan order" wins, which depends on upstream ordering.
    pub async fn fetch_doc_by_slug(&self, slug: &str) -> Result<Option<Document>> {
        let wanted = normalize_slug(slug);
        let data_source = self.data_source_id().await?;

        let mut cursor: Option<String> = None;
        loop {
            let batch = self
                .store
                .query_data_source(data_source, cursor.as_deref())
                .await?;
            for page in &batch.results {
                let meta = project_meta(page);
                if meta.published && normalize_slug(&meta.slug) == wanted {
                    debug!(page_id = %meta.id, slug = %meta.slug, "slug scan hit");
                    let blocks = fetch_block_tree(
                        self.store.as_ref(),
                        &meta.id,
                        self.config.subtree_concurrency,
                    )
                    .await?;
                    return Ok(Some(Document { meta, blocks }));
                }
            }
            if !batch.has_more {
                break;
            }
            match batch.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        debug!(slug = %wanted, "slug scan exhausted without a match");
        Ok(None)
    }

    /// Lists published archive entries, optionally filtered to entries with a
    /// tag containing `tag` (case-insensitive), sorted by date descending.
    /// Entries without a date sort last, stably among themselves.
    pub async fn fetch_archives(&self, tag: Option<&str>) -> Result<Vec<ArchiveEntry>> {
        let data_source = self.data_source_id().await?;
        let pages = drain_pages(|cursor| async move {
            self.store
                .query_data_source(data_source, cursor.as_deref())
                .await
        })
        .await?;

        let needle = tag.map(str::to_lowercase);
        let mut entries: Vec<ArchiveEntry> = pages
            .iter()
            .filter(|page| {
                category_of(page).as_deref() == Some(self.config.archive_category.as_str())
            })
            .map(project_archive_entry)
            .filter(|entry| entry.published)
            .filter(|entry| match &needle {
                Some(needle) => entry
                    .tags
                    .iter()
                    .any(|t| t.to_lowercase().contains(needle)),
                None => true,
            })
            .collect();
        entries.sort_by(|a, b| match (a.date, b.date) {
            (Some(da), Some(db)) => db.cmp(&da),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Ok(entries)
    }

    /// Point lookup of one archive entry by page id, with its block tree.
    ///
    /// Best-effort by contract: remote errors, a non-archive category, and an
    /// unpublished page all resolve to `None`.
    pub async fn fetch_archive_by_id(&self, id: &str) -> Result<Option<ArchiveDocument>> {
        let page = match self.store.get_page(id).await {
            Ok(page) => page,
            Err(err) => {
                debug!(page_id = id, error = %err, "archive point lookup failed");
                return Ok(None);
            },
        };
        if category_of(&page).as_deref() != Some(self.config.archive_category.as_str()) {
            return Ok(None);
        }
        let entry = project_archive_entry(&page);
        if !entry.published {
            return Ok(None);
        }
        let blocks = match fetch_block_tree(
            self.store.as_ref(),
            &page.id,
            self.config.subtree_concurrency,
        )
        .await
        {
            Ok(blocks) => blocks,
            Err(err) => {
                debug!(page_id = id, error = %err, "archive tree fetch failed");
                return Ok(None);
            },
        };
        Ok(Some(ArchiveDocument { entry, blocks }))
    }

    /// Free-text search delegated to the remote store, capped to the
    /// configured limit and re-projected into compact results.
    ///
    /// Best-effort by contract: a remote failure yields an empty list.
    pub async fn search_docs(&self, query: &str) -> Result<Vec<SearchResult>> {
        let pages = match self
            .store
            .search_pages(query, self.config.search_limit)
            .await
        {
            Ok(pages) => pages,
            Err(err) => {
                warn!(query, error = %err, "remote search failed; returning no hits");
                return Ok(Vec::new());
            },
        };
        Ok(pages
            .iter()
            .map(project_meta)
            .filter(|meta| meta.published)
            .map(|meta| SearchResult {
                id: meta.id,
                highlight: meta.title.clone(),
                title: meta.title,
                slug: meta.slug,
                category: meta.category,
            })
            .collect())
    }
}

/// Slug normalization used for all lookups: trimmed, lowercased.
#[must_use]
pub fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}

fn compare_docs(a: &DocMeta, b: &DocMeta) -> Ordering {
    a.order
        .cmp(&b.order)
        .then_with(|| a.category.to_lowercase().cmp(&b.category.to_lowercase()))
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
}

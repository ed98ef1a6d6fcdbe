//! Cross-document citation resolution.
//!
//! A citation names a `(document slug, anchor id)` pair. Resolution locates
//! the target document among published documents, builds its full anchor map,
//! and returns the matching block group with source attribution — or a
//! distinguishable miss. There are no partial results: a resolved citation
//! always carries a non-empty block list.

use tracing::debug;

use crate::anchor::build_anchor_map;
use crate::query::Engine;
use crate::types::Citation;
use crate::Result;

/// Outcome of a citation resolution, keeping the two miss reasons apart so
/// callers can render them differently.
#[derive(Debug, Clone, PartialEq)]
pub enum CitationOutcome {
    /// The cited block group, with attribution.
    Found(Citation),
    /// No published document has the slug.
    UnknownDocument,
    /// The document exists but defines no group under the anchor id.
    UnknownAnchor,
}

impl CitationOutcome {
    /// Collapses the outcome to the citation, dropping the miss reason.
    #[must_use]
    pub fn into_option(self) -> Option<Citation> {
        match self {
            Self::Found(citation) => Some(citation),
            Self::UnknownDocument | Self::UnknownAnchor => None,
        }
    }
}

/// Resolves `anchor_id` within the published document whose slug matches
/// `slug` (case-insensitive, trimmed).
///
/// Slugless `block://` links must be defaulted to the current document's slug
/// by the caller before invoking this; `cite://` links always carry one.
pub async fn resolve_citation(
    engine: &Engine,
    slug: &str,
    anchor_id: &str,
) -> Result<CitationOutcome> {
    let Some(document) = engine.fetch_doc_by_slug(slug).await? else {
        debug!(slug, anchor_id, "citation target document not found");
        return Ok(CitationOutcome::UnknownDocument);
    };

    let mut map = build_anchor_map(&document.blocks);
    match map.remove(anchor_id) {
        Some(blocks) => {
            debug!(
                slug = %document.meta.slug,
                anchor_id,
                blocks = blocks.len(),
                "citation resolved"
            );
            Ok(CitationOutcome::Found(Citation {
                blocks,
                source_slug: document.meta.slug,
                source_title: document.meta.title,
            }))
        },
        None => {
            debug!(slug = %document.meta.slug, anchor_id, "anchor not present in document");
            Ok(CitationOutcome::UnknownAnchor)
        },
    }
}

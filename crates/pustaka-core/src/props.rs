//! Projection of raw page property bags into typed metadata.
//!
//! Everything here is pure and total: a property that is missing or has the
//! wrong shape degrades to its documented default, never an error. Note the
//! publish flag is opt-out — a page with no `Published` checkbox at all is
//! visible. Unpublishing requires the checkbox to exist and be unchecked.

use tracing::trace;

use crate::anchor::strip_anchor_tags;
use crate::types::{ArchiveEntry, DocMeta, Icon, Page, PropertyValue, RichTextSpan, UNORDERED};

/// Property bag names the projector reads.
const PROP_SLUG: &str = "Slug";
const PROP_CATEGORY: &str = "Category";
const PROP_ORDER: &str = "Order";
const PROP_PUBLISHED: &str = "Published";
const PROP_SUMMARY: &str = "Summary";
const PROP_DATE: &str = "Date";
const PROP_TAGS: &str = "Tags";

/// Concatenates the literal text of rich text runs.
#[must_use]
pub fn plain_text(spans: &[RichTextSpan]) -> String {
    spans.iter().map(|span| span.plain_text.as_str()).collect()
}

/// Projects a page to its typed metadata, applying defaults for missing or
/// malformed properties.
#[must_use]
pub fn project_meta(page: &Page) -> DocMeta {
    let slug = slug_of(page).unwrap_or_else(|| page.id.clone());
    trace!(page_id = %page.id, %slug, "projecting page metadata");
    DocMeta {
        id: page.id.clone(),
        slug,
        title: title_of(page),
        category: category_of(page).unwrap_or_default(),
        icon: page.icon.as_ref().and_then(Icon::glyph).map(str::to_string),
        order: order_of(page),
        last_edited: page.last_edited_time,
        published: published(page),
    }
}

/// Projects a page to an archive entry, applying the archive-specific
/// defaults (summary falls back to the slug, the date to the creation day).
#[must_use]
pub fn project_archive_entry(page: &Page) -> ArchiveEntry {
    let summary = text_prop(page, PROP_SUMMARY)
        .or_else(|| slug_of(page))
        .unwrap_or_default();
    let date = page
        .properties
        .get(PROP_DATE)
        .and_then(PropertyValue::as_date)
        .or_else(|| Some(page.created_time.date_naive()));
    ArchiveEntry {
        id: page.id.clone(),
        title: title_of(page),
        summary,
        date,
        tags: page
            .properties
            .get(PROP_TAGS)
            .and_then(PropertyValue::as_multi_select)
            .map(|tags| tags.into_iter().map(str::to_string).collect())
            .unwrap_or_default(),
        published: published(page),
    }
}

/// The page's visibility. Defaults to `true` when the `Published` checkbox is
/// absent or has the wrong shape.
#[must_use]
pub fn published(page: &Page) -> bool {
    page.properties
        .get(PROP_PUBLISHED)
        .and_then(PropertyValue::as_checkbox)
        .unwrap_or(true)
}

/// The page's category, when the select property is present and set.
#[must_use]
pub fn category_of(page: &Page) -> Option<String> {
    page.properties
        .get(PROP_CATEGORY)
        .and_then(PropertyValue::as_select)
        .map(str::to_string)
}

fn title_of(page: &Page) -> String {
    // The title property's name varies per collection; there is at most one
    // title-typed property per page, so match by shape.
    let title = page
        .properties
        .values()
        .find_map(PropertyValue::as_title)
        .map(|spans| strip_anchor_tags(&plain_text(spans)))
        .unwrap_or_default();
    if title.is_empty() {
        "Untitled".to_string()
    } else {
        title
    }
}

fn slug_of(page: &Page) -> Option<String> {
    let slug = text_prop(page, PROP_SLUG)?;
    (!slug.is_empty()).then_some(slug)
}

fn text_prop(page: &Page, name: &str) -> Option<String> {
    let spans = page.properties.get(name)?.as_rich_text()?;
    let text = strip_anchor_tags(&plain_text(spans));
    (!text.is_empty()).then_some(text)
}

fn order_of(page: &Page) -> i64 {
    page.properties
        .get(PROP_ORDER)
        .and_then(PropertyValue::as_number)
        .map_or(UNORDERED, |n| n as i64)
}

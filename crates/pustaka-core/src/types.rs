//! Core data types: pages, blocks, rich text, projected metadata.
//!
//! The wire-facing types (`Page`, `Block`, `RichTextSpan`, `PropertyValue`)
//! deserialize directly from the remote store's JSON. Page properties are a
//! free-form bag whose schema the store's authors control, so every property
//! is a tagged union inspected through narrow `as_*` accessors that return
//! `Option` instead of assuming a shape.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel order for documents without an explicit `Order` property, so they
/// sort after every explicitly ordered document.
pub const UNORDERED: i64 = i64::MAX;

/// One content document as stored remotely: an opaque id plus a free-form
/// property bag. Pages are created and edited entirely in the remote store;
/// this crate only reads snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Opaque immutable page id.
    pub id: String,
    /// The store's property bag, keyed by property name.
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
    /// Optional icon glyph (emoji).
    #[serde(default)]
    pub icon: Option<Icon>,
    /// Creation timestamp.
    pub created_time: DateTime<Utc>,
    /// Last-modified timestamp.
    pub last_edited_time: DateTime<Utc>,
}

/// Page icon as returned by the store. Only emoji icons carry a glyph; file
/// icons are kept opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Icon {
    /// An emoji glyph.
    Emoji {
        /// The glyph itself.
        emoji: String,
    },
    /// Any other icon shape the store may return.
    #[serde(other)]
    Other,
}

impl Icon {
    /// The emoji glyph, if this icon is one.
    #[must_use]
    pub fn glyph(&self) -> Option<&str> {
        match self {
            Self::Emoji { emoji } => Some(emoji),
            Self::Other => None,
        }
    }
}

/// One value in a page's property bag, tagged by property kind.
///
/// Unknown kinds deserialize to [`PropertyValue::Unknown`] rather than
/// failing, since the bag's schema is not controlled by this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    /// The page's title property.
    Title {
        /// Rich text runs making up the title.
        #[serde(default)]
        title: Vec<RichTextSpan>,
    },
    /// A free-form rich text property.
    RichText {
        /// Rich text runs.
        #[serde(default)]
        rich_text: Vec<RichTextSpan>,
    },
    /// A single-select property.
    Select {
        /// The chosen option, if any.
        #[serde(default)]
        select: Option<SelectOption>,
    },
    /// A multi-select property.
    MultiSelect {
        /// The chosen options.
        #[serde(default)]
        multi_select: Vec<SelectOption>,
    },
    /// A numeric property.
    Number {
        /// The value, if set.
        #[serde(default)]
        number: Option<f64>,
    },
    /// A checkbox property.
    Checkbox {
        /// Whether the box is checked.
        #[serde(default)]
        checkbox: bool,
    },
    /// A date property.
    Date {
        /// The date range, if set.
        #[serde(default)]
        date: Option<DateRange>,
    },
    /// Any property kind this crate does not interpret.
    #[serde(other)]
    Unknown,
}

impl PropertyValue {
    /// Title rich text, if this is a title property.
    #[must_use]
    pub fn as_title(&self) -> Option<&[RichTextSpan]> {
        match self {
            Self::Title { title } => Some(title),
            _ => None,
        }
    }

    /// Rich text runs, if this is a rich text property.
    #[must_use]
    pub fn as_rich_text(&self) -> Option<&[RichTextSpan]> {
        match self {
            Self::RichText { rich_text } => Some(rich_text),
            _ => None,
        }
    }

    /// The selected option name, if this is a select property with a value.
    #[must_use]
    pub fn as_select(&self) -> Option<&str> {
        match self {
            Self::Select { select } => select.as_ref().map(|o| o.name.as_str()),
            _ => None,
        }
    }

    /// Selected option names, if this is a multi-select property.
    #[must_use]
    pub fn as_multi_select(&self) -> Option<Vec<&str>> {
        match self {
            Self::MultiSelect { multi_select } => {
                Some(multi_select.iter().map(|o| o.name.as_str()).collect())
            },
            _ => None,
        }
    }

    /// The numeric value, if this is a number property with a value.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number { number } => *number,
            _ => None,
        }
    }

    /// The checkbox state, if this is a checkbox property.
    #[must_use]
    pub fn as_checkbox(&self) -> Option<bool> {
        match self {
            Self::Checkbox { checkbox } => Some(*checkbox),
            _ => None,
        }
    }

    /// The start date truncated to the day, if this is a date property with a
    /// parseable value.
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date { date } => date.as_ref().and_then(DateRange::start_day),
            _ => None,
        }
    }
}

/// One option of a select/multi-select property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// The option's display name.
    pub name: String,
}

/// A date property value: an ISO-8601 start, optionally an end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start date or datetime, ISO-8601.
    pub start: String,
    /// Optional end date or datetime.
    #[serde(default)]
    pub end: Option<String>,
}

impl DateRange {
    /// The start parsed as a calendar day. Datetime values are truncated to
    /// their date component; unparseable values yield `None`.
    #[must_use]
    pub fn start_day(&self) -> Option<NaiveDate> {
        let day = self.start.get(..10)?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}

/// An inline run of rich text with formatting annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextSpan {
    /// Display type of the run (`text`, `mention`, `equation`).
    #[serde(rename = "type", default = "default_span_kind")]
    pub kind: String,
    /// The literal text.
    #[serde(default)]
    pub plain_text: String,
    /// Optional hyperlink target.
    #[serde(default)]
    pub href: Option<String>,
    /// Formatting annotations.
    #[serde(default)]
    pub annotations: Annotations,
}

fn default_span_kind() -> String {
    "text".to_string()
}

impl RichTextSpan {
    /// A plain text run with default annotations. Test and fixture helper.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: default_span_kind(),
            plain_text: content.into(),
            href: None,
            annotations: Annotations::default(),
        }
    }
}

/// Mutually independent formatting flags on a rich text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotations {
    /// Bold.
    pub bold: bool,
    /// Italic.
    pub italic: bool,
    /// Strikethrough.
    pub strikethrough: bool,
    /// Underline.
    pub underline: bool,
    /// Inline code.
    pub code: bool,
    /// Text color name.
    pub color: String,
}

impl Default for Annotations {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            strikethrough: false,
            underline: false,
            code: false,
            color: "default".to_string(),
        }
    }
}

/// One node in a page's content tree.
///
/// Blocks form a strict tree rooted at a page id: no cycles, no shared
/// children. `children` is `None` until the subtree has been fetched; the
/// tree fetcher populates it eagerly for every block whose `has_children`
/// flag is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Opaque block id.
    pub id: String,
    /// Whether the store reports nested children for this block.
    #[serde(default)]
    pub has_children: bool,
    /// The typed payload, selected by the block's kind tag.
    #[serde(flatten)]
    pub kind: BlockKind,
    /// Fully fetched child subtree, in document order. Absent until fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Block>>,
}

impl Block {
    /// The block's primary rich text field, when its kind has one.
    #[must_use]
    pub fn rich_text(&self) -> Option<&[RichTextSpan]> {
        self.kind.rich_text()
    }
}

/// Typed block payloads, tagged by block kind.
///
/// Kinds this crate does not interpret deserialize to `Unsupported` so a
/// document containing them still assembles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    /// A paragraph of rich text.
    Paragraph {
        /// Payload.
        paragraph: RichTextContent,
    },
    /// A level-1 heading.
    #[serde(rename = "heading_1")]
    Heading1 {
        /// Payload.
        heading_1: RichTextContent,
    },
    /// A level-2 heading.
    #[serde(rename = "heading_2")]
    Heading2 {
        /// Payload.
        heading_2: RichTextContent,
    },
    /// A level-3 heading.
    #[serde(rename = "heading_3")]
    Heading3 {
        /// Payload.
        heading_3: RichTextContent,
    },
    /// A bulleted list item.
    BulletedListItem {
        /// Payload.
        bulleted_list_item: RichTextContent,
    },
    /// A numbered list item.
    NumberedListItem {
        /// Payload.
        numbered_list_item: RichTextContent,
    },
    /// A to-do item with a checked state.
    ToDo {
        /// Payload.
        to_do: ToDoContent,
    },
    /// A block quote.
    Quote {
        /// Payload.
        quote: RichTextContent,
    },
    /// A callout box.
    Callout {
        /// Payload.
        callout: RichTextContent,
    },
    /// A toggle (collapsible) block.
    Toggle {
        /// Payload.
        toggle: RichTextContent,
    },
    /// A code block.
    Code {
        /// Payload.
        code: CodeContent,
    },
    /// An image.
    Image {
        /// Payload.
        image: ImageContent,
    },
    /// A table; its rows arrive as children.
    Table {
        /// Payload.
        table: TableContent,
    },
    /// One row of a table.
    TableRow {
        /// Payload.
        table_row: TableRowContent,
    },
    /// A column list container; columns arrive as children.
    ColumnList {
        /// Payload.
        column_list: EmptyContent,
    },
    /// One column of a column list.
    Column {
        /// Payload.
        column: EmptyContent,
    },
    /// A horizontal divider.
    Divider {
        /// Payload.
        divider: EmptyContent,
    },
    /// Any block kind this crate does not interpret.
    #[serde(other)]
    Unsupported,
}

impl BlockKind {
    /// The primary rich text field of this payload, when the kind has one.
    #[must_use]
    pub fn rich_text(&self) -> Option<&[RichTextSpan]> {
        match self {
            Self::Paragraph { paragraph: c }
            | Self::Heading1 { heading_1: c }
            | Self::Heading2 { heading_2: c }
            | Self::Heading3 { heading_3: c }
            | Self::BulletedListItem {
                bulleted_list_item: c,
            }
            | Self::NumberedListItem {
                numbered_list_item: c,
            }
            | Self::Quote { quote: c }
            | Self::Callout { callout: c }
            | Self::Toggle { toggle: c } => Some(&c.rich_text),
            Self::ToDo { to_do } => Some(&to_do.rich_text),
            Self::Code { code } => Some(&code.rich_text),
            Self::Image { .. }
            | Self::Table { .. }
            | Self::TableRow { .. }
            | Self::ColumnList { .. }
            | Self::Column { .. }
            | Self::Divider { .. }
            | Self::Unsupported => None,
        }
    }
}

/// Payload of block kinds whose content is a single rich text field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichTextContent {
    /// The rich text runs.
    #[serde(default)]
    pub rich_text: Vec<RichTextSpan>,
}

/// Payload of a to-do block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToDoContent {
    /// The rich text runs.
    #[serde(default)]
    pub rich_text: Vec<RichTextSpan>,
    /// Whether the item is checked.
    #[serde(default)]
    pub checked: bool,
}

/// Payload of a code block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeContent {
    /// The code text runs.
    #[serde(default)]
    pub rich_text: Vec<RichTextSpan>,
    /// Language hint.
    #[serde(default)]
    pub language: String,
}

/// Payload of an image block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Caption runs.
    #[serde(default)]
    pub caption: Vec<RichTextSpan>,
    /// Externally hosted image, if any.
    #[serde(default)]
    pub external: Option<UrlRef>,
    /// Store-hosted image, if any.
    #[serde(default)]
    pub file: Option<UrlRef>,
}

/// A wrapped URL reference inside a file-bearing payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlRef {
    /// The URL.
    #[serde(default)]
    pub url: String,
}

/// Payload of a table block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableContent {
    /// Number of columns.
    #[serde(default)]
    pub table_width: u32,
    /// Whether the first row is a header.
    #[serde(default)]
    pub has_column_header: bool,
    /// Whether the first column is a header.
    #[serde(default)]
    pub has_row_header: bool,
}

/// Payload of a table row block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRowContent {
    /// Cells, each a list of rich text runs.
    #[serde(default)]
    pub cells: Vec<Vec<RichTextSpan>>,
}

/// Payload of block kinds that carry no content of their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyContent {}

/// The projected, strongly-typed view of a page used by the query layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocMeta {
    /// Page id.
    pub id: String,
    /// URL slug; falls back to the page id when unset.
    pub slug: String,
    /// Display title; falls back to "Untitled".
    pub title: String,
    /// Free-form category; empty when unset.
    pub category: String,
    /// Icon glyph, if the page has an emoji icon.
    pub icon: Option<String>,
    /// Explicit ordering; [`UNORDERED`] when unset so unordered docs sort
    /// last.
    pub order: i64,
    /// Last-edited timestamp.
    pub last_edited: DateTime<Utc>,
    /// Visibility flag. Defaults to `true` when the underlying property is
    /// absent: a page is visible unless explicitly unpublished.
    pub published: bool,
}

/// The projected view of an archive page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Page id.
    pub id: String,
    /// Display title; falls back to "Untitled".
    pub title: String,
    /// Short summary; falls back to the slug, then to the empty string.
    pub summary: String,
    /// Entry date; falls back to the creation date truncated to the day.
    pub date: Option<NaiveDate>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Visibility flag, same opt-out semantics as [`DocMeta::published`].
    pub published: bool,
}

/// A document with its fully fetched block tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Projected metadata.
    pub meta: DocMeta,
    /// Direct children of the page, subtrees populated.
    pub blocks: Vec<Block>,
}

/// An archive entry with its fully fetched block tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveDocument {
    /// Projected entry.
    pub entry: ArchiveEntry,
    /// Direct children of the page, subtrees populated.
    pub blocks: Vec<Block>,
}

/// A compact free-text search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// URL slug.
    pub slug: String,
    /// Category.
    pub category: String,
    /// Highlight text shown alongside the hit. Currently the title; no local
    /// full-text indexing is performed.
    pub highlight: String,
}

/// A resolved citation: the cited block group plus source attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// The cited blocks, in document order. Never empty.
    pub blocks: Vec<Block>,
    /// Slug of the document the blocks came from.
    pub source_slug: String,
    /// Title of the document the blocks came from.
    pub source_title: String,
}

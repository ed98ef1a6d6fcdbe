//! Anchor tags, anchor maps, and the cross-document link grammar.
//!
//! Authors make blocks addressable by ending a block's text with a trailing
//! tag: `[#id]` names the block, `[#id+]` appends it to whatever group is
//! currently open, letting several consecutive blocks form one citable unit.
//! Other documents then reference a group with `block://[slug]#id` or
//! `cite://slug#id`.
//!
//! Malformed tags and links are never errors; text that does not match the
//! grammar is simply left alone.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::Block;

static ANCHOR_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[#([A-Za-z0-9_-]+)(\+)?\]\s*$").unwrap());

static ANCHOR_TAG_ANYWHERE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[#[A-Za-z0-9_-]+\+?\]").unwrap());

static BLOCK_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^block://([A-Za-z0-9_-]*)#([A-Za-z0-9_-]+)$").unwrap());

static CITE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cite://([A-Za-z0-9_-]+)#([A-Za-z0-9_-]+)$").unwrap());

/// A parsed trailing anchor tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorTag {
    /// The user-authored anchor name.
    pub id: String,
    /// Whether this is a continuation (`[#id+]`) tag.
    pub append: bool,
}

impl AnchorTag {
    /// Parses a trailing anchor tag from span text. The tag must sit at the
    /// very end of the text (trailing whitespace tolerated).
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let captures = ANCHOR_TAG_RE.captures(text)?;
        Some(Self {
            id: captures[1].to_string(),
            append: captures.get(2).is_some(),
        })
    }
}

/// Mapping from anchor id to the ordered, non-empty group of blocks it
/// designates.
pub type AnchorMap = HashMap<String, Vec<Block>>;

/// Removes anchor tags from display text wherever they appear.
///
/// Titles and summaries are not supposed to carry anchors, but projected
/// metadata must tolerate one.
#[must_use]
pub fn strip_anchor_tags(text: &str) -> String {
    ANCHOR_TAG_ANYWHERE_RE.replace_all(text, "").trim().to_string()
}

/// The anchor tag of a block, parsed from the trailing text of the *last*
/// span of its primary rich text field.
#[must_use]
pub fn block_anchor_tag(block: &Block) -> Option<AnchorTag> {
    let spans = block.rich_text()?;
    let last = spans.last()?;
    AnchorTag::parse(&last.plain_text)
}

/// Builds the anchor map for a block sequence, recursing into nested
/// children.
///
/// Grouping is a single pass in document order with one piece of state, the
/// currently open group:
/// - a block without a tag closes the open group and joins nothing;
/// - `[#id]` opens (or extends) the group for `id`;
/// - `[#id+]` appends to the open group whatever its id — the id in an append
///   tag is informational — or opens a fresh group under `id` when no group
///   is open, rather than being silently dropped.
///
/// Child maps are merged after the parent pass, so an anchor defined inside a
/// column or toggle is addressable from the top level. For an id present at
/// both levels, parent-level blocks come first.
#[must_use]
pub fn build_anchor_map(blocks: &[Block]) -> AnchorMap {
    let mut map = AnchorMap::new();
    let mut open_group: Option<String> = None;

    for block in blocks {
        match block_anchor_tag(block) {
            None => open_group = None,
            Some(tag) => {
                let group_id = if tag.append {
                    open_group.clone().unwrap_or(tag.id)
                } else {
                    tag.id
                };
                map.entry(group_id.clone()).or_default().push(block.clone());
                open_group = Some(group_id);
            },
        }
    }

    for block in blocks {
        if let Some(children) = block.children.as_deref() {
            for (id, mut group) in build_anchor_map(children) {
                map.entry(id).or_default().append(&mut group);
            }
        }
    }

    map
}

/// A cross-document reference decomposed into its target slug and anchor id.
///
/// Two schemes exist: `block://[slug]#anchor` where omitting the slug means
/// "this document", and `cite://slug#anchor` where the slug is mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRef {
    /// Target document slug. `None` only for slugless `block://` links.
    pub slug: Option<String>,
    /// Target anchor id.
    pub anchor: String,
}

impl LinkRef {
    /// Parses either link scheme. Anything not matching the grammar yields
    /// `None` and the link is left unresolved by callers.
    #[must_use]
    pub fn parse(href: &str) -> Option<Self> {
        if let Some(captures) = BLOCK_LINK_RE.captures(href) {
            let slug = &captures[1];
            return Some(Self {
                slug: (!slug.is_empty()).then(|| slug.to_string()),
                anchor: captures[2].to_string(),
            });
        }
        let captures = CITE_LINK_RE.captures(href)?;
        Some(Self {
            slug: Some(captures[1].to_string()),
            anchor: captures[2].to_string(),
        })
    }

    /// The target slug, defaulting to the current document's slug for
    /// slugless `block://` links.
    #[must_use]
    pub fn slug_or<'a>(&'a self, current: &'a str) -> &'a str {
        self.slug.as_deref().unwrap_or(current)
    }
}

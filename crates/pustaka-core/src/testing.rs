//! In-memory [`RemoteStore`] and fixture builders shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::source::{Paginated, RemoteStore};
use crate::types::{
    Block, BlockKind, DateRange, EmptyContent, Page, PropertyValue, RichTextContent,
    RichTextSpan, SelectOption,
};
use crate::{Error, Result};

/// Remote-call counters for cache and pagination assertions.
#[derive(Debug, Default)]
pub struct Calls {
    pub data_source: AtomicUsize,
    pub query: AtomicUsize,
    pub get_page: AtomicUsize,
    pub children: AtomicUsize,
    pub search: AtomicUsize,
}

/// Scripted in-memory store. Cursors are plain item offsets.
#[derive(Default)]
pub struct MockStore {
    pub pages: Vec<Page>,
    pub children: HashMap<String, Vec<Block>>,
    pub page_size: usize,
    pub calls: Calls,
    /// When set, `query_data_source` fails. Used by stale-on-error tests.
    pub fail_queries: AtomicBool,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            page_size: 100,
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_pages(mut self, pages: Vec<Page>) -> Self {
        self.pages = pages;
        self
    }

    pub fn with_children(mut self, parent: &str, children: Vec<Block>) -> Self {
        self.children.insert(parent.to_string(), children);
        self
    }

    fn paginate<T: Clone>(&self, items: &[T], cursor: Option<&str>) -> Result<Paginated<T>> {
        let start = match cursor {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| Error::Api {
                    status: 400,
                    message: format!("invalid cursor {cursor:?}"),
                })?,
            None => 0,
        };
        let end = (start + self.page_size).min(items.len());
        let has_more = end < items.len();
        Ok(Paginated {
            results: items[start..end].to_vec(),
            next_cursor: has_more.then(|| end.to_string()),
            has_more,
        })
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    async fn data_source_id(&self, collection_id: &str) -> Result<String> {
        self.calls.data_source.fetch_add(1, Ordering::SeqCst);
        Ok(format!("ds-{collection_id}"))
    }

    async fn query_data_source(
        &self,
        _data_source_id: &str,
        cursor: Option<&str>,
    ) -> Result<Paginated<Page>> {
        self.calls.query.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(Error::Api {
                status: 503,
                message: "scripted outage".to_string(),
            });
        }
        self.paginate(&self.pages, cursor)
    }

    async fn get_page(&self, page_id: &str) -> Result<Page> {
        self.calls.get_page.fetch_add(1, Ordering::SeqCst);
        self.pages
            .iter()
            .find(|page| page.id == page_id)
            .cloned()
            .ok_or_else(|| Error::Api {
                status: 404,
                message: format!("no page {page_id}"),
            })
    }

    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<Paginated<Block>> {
        self.calls.children.fetch_add(1, Ordering::SeqCst);
        let children = self.children.get(block_id).ok_or_else(|| Error::Api {
            status: 404,
            message: format!("no children scripted for {block_id}"),
        })?;
        self.paginate(children, cursor)
    }

    async fn search_pages(&self, query: &str, limit: usize) -> Result<Vec<Page>> {
        self.calls.search.fetch_add(1, Ordering::SeqCst);
        let needle = query.to_lowercase();
        Ok(self
            .pages
            .iter()
            .filter(|page| {
                title_of(page).to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

fn title_of(page: &Page) -> String {
    page.properties
        .values()
        .find_map(PropertyValue::as_title)
        .map(|spans| {
            spans
                .iter()
                .map(|span| span.plain_text.as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// A paragraph leaf block.
pub fn paragraph(id: &str, text: &str) -> Block {
    Block {
        id: id.to_string(),
        has_children: false,
        kind: BlockKind::Paragraph {
            paragraph: RichTextContent {
                rich_text: vec![RichTextSpan::text(text)],
            },
        },
        children: None,
    }
}

/// A container block (`toggle`, `column_list`, or `column`) flagged as having
/// children, with its subtree unfetched.
pub fn parent_block(id: &str, kind: &str) -> Block {
    let kind = match kind {
        "column_list" => BlockKind::ColumnList {
            column_list: EmptyContent {},
        },
        "column" => BlockKind::Column {
            column: EmptyContent {},
        },
        "toggle" => BlockKind::Toggle {
            toggle: RichTextContent::default(),
        },
        other => unreachable!("unscripted parent kind {other}"),
    };
    Block {
        id: id.to_string(),
        has_children: true,
        kind,
        children: None,
    }
}

/// Builder for page fixtures with the property names the projector reads.
pub struct PageFixture {
    page: Page,
}

impl PageFixture {
    pub fn new(id: &str, title: &str) -> Self {
        let mut page = Page {
            id: id.to_string(),
            properties: HashMap::new(),
            icon: None,
            created_time: ts(2025, 1, 1),
            last_edited_time: ts(2025, 1, 2),
        };
        page.properties.insert(
            "Name".to_string(),
            PropertyValue::Title {
                title: vec![RichTextSpan::text(title)],
            },
        );
        Self { page }
    }

    pub fn slug(mut self, slug: &str) -> Self {
        self.page.properties.insert(
            "Slug".to_string(),
            PropertyValue::RichText {
                rich_text: vec![RichTextSpan::text(slug)],
            },
        );
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.page.properties.insert(
            "Summary".to_string(),
            PropertyValue::RichText {
                rich_text: vec![RichTextSpan::text(summary)],
            },
        );
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.page.properties.insert(
            "Category".to_string(),
            PropertyValue::Select {
                select: Some(SelectOption {
                    name: category.to_string(),
                }),
            },
        );
        self
    }

    pub fn order(mut self, order: f64) -> Self {
        self.page.properties.insert(
            "Order".to_string(),
            PropertyValue::Number {
                number: Some(order),
            },
        );
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.page.properties.insert(
            "Published".to_string(),
            PropertyValue::Checkbox {
                checkbox: published,
            },
        );
        self
    }

    pub fn date(mut self, iso: &str) -> Self {
        self.page.properties.insert(
            "Date".to_string(),
            PropertyValue::Date {
                date: Some(DateRange {
                    start: iso.to_string(),
                    end: None,
                }),
            },
        );
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.page.properties.insert(
            "Tags".to_string(),
            PropertyValue::MultiSelect {
                multi_select: tags
                    .iter()
                    .map(|tag| SelectOption {
                        name: (*tag).to_string(),
                    })
                    .collect(),
            },
        );
        self
    }

    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.page.created_time = at;
        self
    }

    pub fn build(self) -> Page {
        self.page
    }
}

/// Midnight UTC timestamp helper.
pub fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

//! Response bodies shared by the management API and the mock surface.

use crate::store::SchemaDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Local wall-clock time as `YYYY-MM-DD HH:MM:SS`.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// A definition as returned to clients: the stored fields plus its mock endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct SchemaView {
    #[serde(flatten)]
    pub definition: SchemaDefinition,
    pub endpoint: String,
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

/// `?page=&pageSize=` on the management API. Values stay raw so bad numbers fall back to defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

impl PageQuery {
    pub fn new(page: Option<&str>, page_size: Option<&str>) -> Self {
        PageQuery {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    /// `None` when neither parameter was given (callers return the full list).
    pub fn resolve(&self) -> Option<(usize, usize)> {
        let given = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        let page = given(&self.page);
        let size = given(&self.page_size);
        if page.is_none() && size.is_none() {
            return None;
        }
        Some((
            positive_or(page.as_deref(), DEFAULT_PAGE),
            positive_or(size.as_deref(), DEFAULT_PAGE_SIZE),
        ))
    }
}

/// Parse a positive integer, falling back to `default` for anything else.
fn positive_or(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

#[derive(Debug, Serialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

/// Either everything or one page of it.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Listing<T> {
    All(Vec<T>),
    Page(Paged<T>),
}

impl<T> Listing<T> {
    pub fn build(items: Vec<T>, query: &PageQuery) -> Self {
        match query.resolve() {
            None => Listing::All(items),
            Some((page, page_size)) => Listing::Page(paginate(items, page, page_size)),
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Listing::All(items) => items,
            Listing::Page(p) => &p.data,
        }
    }
}

/// Slice `[(page-1)*size, page*size)`; pages past the end are empty, not errors.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Paged<T> {
    let total = items.len();
    let start = page.saturating_sub(1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    let data = items.into_iter().skip(start).take(end - start).collect();
    Paged {
        data,
        pagination: PageInfo {
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
        },
    }
}

/// Uniform body for successful responses on the mock surface.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub code: u16,
    pub message: &'static str,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<EnvelopePagination>,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopePagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl EnvelopePagination {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let total_pages = total_pages(total, limit);
        EnvelopePagination {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

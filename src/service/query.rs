//! Query-string grammar for listing a resource collection.
//!
//! `field=v` (repeatable, OR'ed), `field_gte`, `field_lte`, `field_ne`, `field_like`, `q`,
//! `_sort=a,b&_order=asc,desc`, `_page`/`_limit`, `_start`/`_end`/`_limit`.
//! Fields may be dot paths into nested objects.

use crate::error::AppError;
use crate::response::DEFAULT_PAGE_SIZE;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug)]
pub enum Condition {
    /// Any of the values matches the string form of the field.
    Eq(Vec<String>),
    Ne(String),
    Gte(String),
    Lte(String),
    Like(Regex),
}

#[derive(Debug)]
pub struct Filter {
    pub path: String,
    pub condition: Condition,
}

/// `_page`, `_limit`, `_start` and `_end`. A repeated key keeps its last value; an empty value
/// clears it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Window {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl Window {
    pub fn from_pairs<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> Result<Self, AppError> {
        let mut window = Window::default();
        for (key, value) in pairs {
            window.set(key.as_ref(), value.as_ref())?;
        }
        Ok(window)
    }

    /// Returns `false` when `key` is not a window parameter.
    pub fn set(&mut self, key: &str, value: &str) -> Result<bool, AppError> {
        let slot = match key {
            "_page" => &mut self.page,
            "_limit" => &mut self.limit,
            "_start" => &mut self.start,
            "_end" => &mut self.end,
            _ => return Ok(false),
        };
        *slot = parse_index(key, value)?;
        Ok(true)
    }

    pub fn is_set(&self) -> bool {
        self.page.is_some() || self.limit.is_some() || self.start.is_some() || self.end.is_some()
    }

    /// Whether the client asked for page-style pagination.
    pub fn is_paged(&self) -> bool {
        self.page.is_some() || self.limit.is_some()
    }

    pub fn page_number(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    /// Zero or missing falls back to the default page size.
    pub fn page_size(&self) -> usize {
        self.limit.filter(|n| *n > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Index range to keep from `total` filtered records.
    pub fn range(&self, total: usize) -> (usize, usize) {
        if self.page.is_some() {
            let limit = self.page_size();
            let start = (self.page_number() - 1).saturating_mul(limit).min(total);
            return (start, start.saturating_add(limit).min(total));
        }
        let start = self.start.unwrap_or(0).min(total);
        let end = match (self.end, self.limit) {
            (Some(end), _) => end,
            (None, Some(_)) => start.saturating_add(self.page_size()),
            (None, None) => total,
        };
        (start, end.clamp(start, total))
    }
}

#[derive(Debug, Default)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub search: Option<String>,
    pub sort: Vec<(String, Order)>,
    pub window: Window,
}

impl ListQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, AppError> {
        let mut query = ListQuery::default();
        let mut sort_fields: Vec<String> = Vec::new();
        let mut orders: Vec<Order> = Vec::new();

        for (key, value) in pairs {
            if query.window.set(&key, &value)? {
                continue;
            }
            match key.as_str() {
                "q" => query.search = Some(value.to_lowercase()).filter(|s| !s.is_empty()),
                "_sort" => sort_fields.extend(split_list(&value)),
                "_order" => orders.extend(split_list(&value).map(|o| parse_order(&o))),
                k if k.starts_with('_') => {
                    tracing::debug!(param = k, "ignoring unknown reserved parameter");
                }
                _ => query.push_filter(key, value)?,
            }
        }

        query.sort = sort_fields
            .into_iter()
            .enumerate()
            .map(|(i, f)| (f, orders.get(i).copied().unwrap_or(Order::Asc)))
            .collect();
        Ok(query)
    }

    fn push_filter(&mut self, key: String, value: String) -> Result<(), AppError> {
        let (path, condition) = if let Some(p) = key.strip_suffix("_gte") {
            (p, Condition::Gte(value))
        } else if let Some(p) = key.strip_suffix("_lte") {
            (p, Condition::Lte(value))
        } else if let Some(p) = key.strip_suffix("_ne") {
            (p, Condition::Ne(value))
        } else if let Some(p) = key.strip_suffix("_like") {
            let re = RegexBuilder::new(&value)
                .case_insensitive(true)
                .build()
                .map_err(|e| AppError::BadRequest(format!("invalid pattern for {}: {}", key, e)))?;
            (p, Condition::Like(re))
        } else {
            if let Some(existing) = self.filters.iter_mut().find(|f| f.path == key) {
                if let Condition::Eq(values) = &mut existing.condition {
                    values.push(value);
                    return Ok(());
                }
            }
            self.filters.push(Filter {
                path: key,
                condition: Condition::Eq(vec![value]),
            });
            return Ok(());
        };
        self.filters.push(Filter {
            path: path.to_string(),
            condition,
        });
        Ok(())
    }

    /// Whether the response carries `X-Total-Count`.
    pub fn is_windowed(&self) -> bool {
        self.window.is_set()
    }

    pub fn matches(&self, record: &Value) -> bool {
        if let Some(q) = &self.search {
            if !contains_text(record, q) {
                return false;
            }
        }
        self.filters.iter().all(|f| f.matches(record))
    }

    pub fn sort_records(&self, records: &mut [Value]) {
        if self.sort.is_empty() {
            return;
        }
        records.sort_by(|a, b| {
            for (path, order) in &self.sort {
                let ord = compare(lookup(a, path), lookup(b, path));
                let ord = if *order == Order::Desc { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
    }

    pub fn range(&self, total: usize) -> (usize, usize) {
        self.window.range(total)
    }
}

impl Filter {
    fn matches(&self, record: &Value) -> bool {
        let field = lookup(record, &self.path);
        match &self.condition {
            Condition::Eq(values) => match field {
                Some(Value::Array(items)) => items
                    .iter()
                    .any(|item| values.iter().any(|v| text(item) == *v)),
                Some(v) => values.iter().any(|want| text(v) == *want),
                None => false,
            },
            Condition::Ne(want) => field.map(|v| text(v) != *want).unwrap_or(true),
            Condition::Gte(bound) => field
                .map(|v| compare_to(v, bound) != Ordering::Less)
                .unwrap_or(false),
            Condition::Lte(bound) => field
                .map(|v| compare_to(v, bound) != Ordering::Greater)
                .unwrap_or(false),
            Condition::Like(re) => field.map(|v| re.is_match(&text(v))).unwrap_or(false),
        }
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn parse_order(raw: &str) -> Order {
    if raw.eq_ignore_ascii_case("desc") {
        Order::Desc
    } else {
        Order::Asc
    }
}

fn parse_index(key: &str, raw: &str) -> Result<Option<usize>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("{} must be a non-negative integer", key)))
}

/// Follow a dot path (`address.city`, `tags.0`).
pub fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |v, seg| match v {
        Value::Object(m) => m.get(seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// String form used for query comparisons: strings unquoted, everything else as JSON.
pub fn text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn contains_text(v: &Value, needle: &str) -> bool {
    match v {
        Value::Object(m) => m.values().any(|x| contains_text(x, needle)),
        Value::Array(items) => items.iter().any(|x| contains_text(x, needle)),
        Value::Null => false,
        other => text(other).to_lowercase().contains(needle),
    }
}

fn compare_to(v: &Value, bound: &str) -> Ordering {
    match (as_number(v), bound.trim().parse::<f64>().ok()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => text(v).as_str().cmp(bound),
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Missing and null sort first; numbers numerically; otherwise by string form.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => text(x).cmp(&text(y)),
    }
}

//! Wraps successful mock-surface responses in `{code, message, data, pagination?, timestamp}`.
//!
//! Requests may use `page`/`pageSize`; they are rewritten to `_page`/`_limit` before routing.
//! Error responses pass through untouched.

use crate::response::{timestamp, Envelope, EnvelopePagination};
use crate::service::Window;
use axum::{
    body::Body,
    extract::Request,
    http::{header, uri::PathAndQuery, HeaderMap, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// `page` feeds `_page` and `pageSize` feeds `_limit`.
const ALIASES: [(&str, &str); 2] = [("page", "_page"), ("pageSize", "_limit")];

type Pairs = Vec<(String, String)>;

/// Pagination requested by the client, after aliasing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageIntent {
    pub page: usize,
    pub limit: usize,
}

pub async fn envelope(mut req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let pairs = req.uri().query().and_then(decode_query).map(apply_aliases);
    if let Some(pairs) = &pairs {
        let rewritten = serde_urlencoded::to_string(pairs).ok();
        if let Some(uri) = rewritten.and_then(|q| with_query(req.uri(), &q)) {
            *req.uri_mut() = uri;
        }
    }
    let intent = pairs.as_deref().and_then(page_intent);

    let response = next.run(req).await;
    wrap(response, &method, intent).await
}

fn decode_query(query: &str) -> Option<Pairs> {
    serde_urlencoded::from_str(query)
        .map_err(|e| tracing::debug!(error = %e, "leaving undecodable query as is"))
        .ok()
}

/// An alias with a value replaces every explicit pair of its target; an empty alias is dropped.
fn apply_aliases(pairs: Pairs) -> Pairs {
    let overridden: Vec<&str> = ALIASES
        .iter()
        .filter(|(alias, _)| pairs.iter().any(|(k, v)| k.as_str() == *alias && !v.is_empty()))
        .map(|(_, target)| *target)
        .collect();
    pairs
        .into_iter()
        .filter_map(|(k, v)| match ALIASES.iter().find(|(alias, _)| *alias == k) {
            Some(_) if v.is_empty() => None,
            Some((_, target)) => Some((target.to_string(), v)),
            None if overridden.contains(&k.as_str()) => None,
            None => Some((k, v)),
        })
        .collect()
}

/// Present when `_page` or `_limit` carries a value. Reads the pairs exactly as listing does,
/// so a query the listing rejects yields no intent.
fn page_intent(pairs: &[(String, String)]) -> Option<PageIntent> {
    let window = Window::from_pairs(pairs).ok()?;
    window.is_paged().then(|| PageIntent {
        page: window.page_number(),
        limit: window.page_size(),
    })
}

fn with_query(uri: &Uri, query: &str) -> Option<Uri> {
    let path_and_query = if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}

pub fn success_message(method: &Method, status: StatusCode) -> &'static str {
    match status {
        StatusCode::CREATED => "create succeeded",
        StatusCode::NO_CONTENT => "delete succeeded",
        _ => match *method {
            Method::GET => "fetch succeeded",
            Method::POST => "create succeeded",
            Method::PUT | Method::PATCH => "update succeeded",
            Method::DELETE => "delete succeeded",
            _ => "operation succeeded",
        },
    }
}

async fn wrap(response: Response, method: &Method, intent: Option<PageIntent>) -> Response {
    let status = response.status();
    if !status.is_success() || !is_json(response.headers()) {
        return response;
    }
    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "could not buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let data: Value = match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };

    let pagination = match (&intent, &data) {
        (Some(intent), Value::Array(items)) => {
            let total = parts
                .headers
                .get(TOTAL_COUNT_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(items.len());
            Some(EnvelopePagination::new(intent.page, intent.limit, total))
        }
        _ => None,
    };
    let body = Envelope {
        code: status.as_u16(),
        message: success_message(method, status),
        data,
        pagination,
        timestamp: timestamp(),
    };
    let bytes = match serde_json::to_vec(&body) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "could not encode envelope");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

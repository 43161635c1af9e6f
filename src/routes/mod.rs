//! Route tables and the composition root.

mod common;
mod resource;
mod schema;

pub use common::common_routes;
pub use resource::resource_routes;
pub use schema::schema_routes;

use crate::error::ErrorBody;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// The whole service: ops routes, the management API, and the mock surface.
pub fn app(state: AppState) -> Router {
    let settings = state.settings.clone();
    let router = common_routes(state.clone());
    let router = mount(router, &settings.api_base, schema_routes(state.clone()));
    let router = mount(router, &settings.mock_base, resource_routes(state));
    layered(router, settings.body_limit)
}

/// Fallback, body limit, panic recovery, and request tracing around every route.
fn layered(router: Router, body_limit: usize) -> Router {
    router
        .fallback(not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

/// `nest` rejects an empty prefix, so a root base merges instead.
fn mount(router: Router, base: &str, routes: Router) -> Router {
    if base.is_empty() {
        router.merge(routes)
    } else {
        router.nest(base, routes)
    }
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "not found".into(),
            detail: None,
        }),
    )
        .into_response()
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "internal server error".into(),
            detail: cfg!(debug_assertions).then_some(detail),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn call(router: Router, uri: &str) -> (StatusCode, Value) {
        let resp = router
            .oneshot(axum::http::Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn handler_panic_becomes_500() {
        let router = Router::new().route(
            "/boom",
            get(|| async {
                if true {
                    panic!("kaboom");
                }
                "unreachable"
            }),
        );
        let (status, body) = call(layered(router, 1024), "/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal server error");
        if cfg!(debug_assertions) {
            assert_eq!(body["detail"], "kaboom");
        }
    }

    #[tokio::test]
    async fn unknown_path_is_json_404() {
        let (status, body) = call(layered(Router::new(), 1024), "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not found");
    }
}

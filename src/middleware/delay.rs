//! Artificial latency for the mock surface.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::time::Duration;

pub async fn delay(State(delay): State<Duration>, req: Request, next: Next) -> Response {
    tokio::time::sleep(delay).await;
    next.run(req).await
}

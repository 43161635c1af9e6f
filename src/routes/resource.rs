//! Generated resource routes, mounted under the mock base.
//! Paths are parameterized; handlers resolve the resource name against the registry, so
//! resources created or deleted at runtime need no route rebuild.

use crate::handlers::resource::{create, delete as delete_handler, list, read, replace, update};
use crate::middleware::{delay, envelope};
use crate::state::AppState;
use axum::{middleware, routing::get, Router};

pub fn resource_routes(state: AppState) -> Router {
    let pause = state.settings.delay;
    let router = Router::new()
        .route("/:resource", get(list).post(create))
        .route(
            "/:resource/:id",
            get(read).put(replace).patch(update).delete(delete_handler),
        )
        .with_state(state)
        .layer(middleware::from_fn(envelope));
    match pause {
        Some(pause) => router.layer(middleware::from_fn_with_state(pause, delay)),
        None => router,
    }
}

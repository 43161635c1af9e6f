//! Schema management routes, mounted under the API base.

use crate::handlers::schema::{create_schema, delete_schema, get_schema, list_schemas, schema_data, update_schema};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn schema_routes(state: AppState) -> Router {
    Router::new()
        .route("/schemas", get(list_schemas).post(create_schema))
        .route(
            "/schemas/:id",
            get(get_schema).put(update_schema).delete(delete_schema),
        )
        .route("/schemas/:id/data", get(schema_data))
        .with_state(state)
}

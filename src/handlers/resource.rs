//! Handlers for generated resources: `/{resource}` and `/{resource}/{id}`.
//! The resource is resolved per request from the registry, after syncing it with the store.

use crate::error::AppError;
use crate::extractors::JsonObject;
use crate::middleware::TOTAL_COUNT_HEADER;
use crate::registry::ResolvedResource;
use crate::service::{CrudService, ListQuery};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

async fn resolve(state: &AppState, name: &str) -> Result<ResolvedResource, AppError> {
    state.registry.sync(&state.resources).await;
    state
        .registry
        .resolve(name)
        .ok_or_else(|| AppError::NotFound(format!("resource not found: {}", name)))
}

fn record_not_found(resource: &ResolvedResource, id: &str) -> AppError {
    AppError::NotFound(format!("{} {} not found", resource.name, id))
}

pub async fn list(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let resource = resolve(&state, &name).await?;
    let query = ListQuery::from_pairs(params)?;
    let outcome = CrudService::list(&state.resources, &resource, &query).await?;

    let mut response = Json(outcome.records).into_response();
    if outcome.windowed {
        let headers = response.headers_mut();
        headers.insert(TOTAL_COUNT_HEADER, HeaderValue::from(outcome.total));
        headers.insert(
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static("X-Total-Count"),
        );
    }
    Ok(response)
}

pub async fn create(
    State(state): State<AppState>,
    Path(name): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let resource = resolve(&state, &name).await?;
    let record = CrudService::create(&state.resources, &resource, body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn read(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resolve(&state, &name).await?;
    let record = CrudService::read(&state.resources, &resource, &id)
        .await?
        .ok_or_else(|| record_not_found(&resource, &id))?;
    Ok(Json(record))
}

pub async fn replace(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let resource = resolve(&state, &name).await?;
    let record = CrudService::replace(&state.resources, &resource, &id, body)
        .await?
        .ok_or_else(|| record_not_found(&resource, &id))?;
    Ok(Json(record))
}

pub async fn update(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let resource = resolve(&state, &name).await?;
    let record = CrudService::patch(&state.resources, &resource, &id, body)
        .await?
        .ok_or_else(|| record_not_found(&resource, &id))?;
    Ok(Json(record))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resolve(&state, &name).await?;
    let record = CrudService::delete(&state.resources, &resource, &id)
        .await?
        .ok_or_else(|| record_not_found(&resource, &id))?;
    Ok(Json(record))
}

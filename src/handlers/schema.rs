//! Schema management handlers.

use crate::error::AppError;
use crate::extractors::JsonObject;
use crate::response::{MessageBody, PageQuery};
use crate::service::SchemaInput;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

pub async fn create_schema(
    State(state): State<AppState>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let input = SchemaInput::from_object(body)?;
    let view = state.schemas.create(input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn list_schemas(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.schemas.list(&query).await))
}

pub async fn get_schema(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.schemas.get(&id).await?))
}

pub async fn update_schema(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonObject(body): JsonObject,
) -> Result<impl IntoResponse, AppError> {
    let input = SchemaInput::from_object(body)?;
    Ok(Json(state.schemas.update(&id, input).await?))
}

pub async fn delete_schema(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.schemas.delete(&id).await?;
    Ok(Json(MessageBody {
        message: "delete succeeded",
    }))
}

pub async fn schema_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.schemas.data(&id, &query).await?))
}

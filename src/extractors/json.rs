//! JSON object request bodies with rejections rendered as `{error}`.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};

/// Body that must be a JSON object. Malformed JSON and non-object bodies are `BadRequest`.
#[derive(Clone, Debug)]
pub struct JsonObject(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(rejection.body_text()),
                _ => AppError::BadRequest(rejection.body_text()),
            })?;
        match value {
            Value::Object(map) => Ok(JsonObject(map)),
            _ => Err(AppError::BadRequest("body must be a JSON object".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header, response::IntoResponse};

    fn request(body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_objects() {
        let JsonObject(map) = JsonObject::from_request(request(r#"{"a":1}"#), &()).await.unwrap();
        assert_eq!(map.get("a"), Some(&Value::from(1)));
    }

    #[tokio::test]
    async fn rejects_arrays_and_garbage() {
        for body in ["[1,2]", "{nope", "3"] {
            let err = JsonObject::from_request(request(body), &()).await.unwrap_err();
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }
}

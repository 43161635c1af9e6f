//! Validation of schema create/update bodies.

use crate::error::AppError;
use crate::template::compile::json_kind;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Raw request body. Fields stay loose so that wrong types surface as validation errors.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInput {
    pub name: Option<Value>,
    pub resource_name: Option<Value>,
    pub schema: Option<Value>,
    pub count: Option<Value>,
}

impl SchemaInput {
    pub fn from_object(body: Map<String, Value>) -> Result<Self, AppError> {
        serde_json::from_value(Value::Object(body)).map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedSchema {
    pub name: String,
    pub resource_name: String,
    pub shape: Value,
    pub count: u32,
}

pub struct SchemaValidator;

impl SchemaValidator {
    /// All four fields are required; `count` must lie in `1..=max_count`.
    pub fn validate(input: SchemaInput, max_count: u32) -> Result<ValidatedSchema, AppError> {
        let name = required_string(input.name.as_ref());
        let resource_name = required_string(input.resource_name.as_ref());
        let shape = input.schema.filter(|v| !v.is_null());
        let count = input.count.filter(|v| !v.is_null() && !is_zero(v));

        let (name, resource_name, shape, count) = match (name, resource_name, shape, count) {
            (Some(n), Some(r), Some(s), Some(c)) => (n, r, s, c),
            _ => {
                return Err(AppError::Validation(
                    "name, resourceName, schema and count are required".into(),
                ))
            }
        };

        if !shape.is_object() {
            return Err(AppError::Validation(format!(
                "schema must be a JSON object, got {}",
                json_kind(&shape)
            )));
        }
        validate_resource_name(&resource_name)?;
        let count = parse_count(&count, max_count)?;

        Ok(ValidatedSchema {
            name,
            resource_name,
            shape,
            count,
        })
    }
}

fn required_string(v: Option<&Value>) -> Option<String> {
    match v {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn is_zero(v: &Value) -> bool {
    match v {
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.trim().is_empty() || s.trim() == "0",
        _ => false,
    }
}

/// A resource name becomes one URL path segment.
pub fn validate_resource_name(name: &str) -> Result<(), AppError> {
    let bad = name
        .chars()
        .find(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace() || c.is_control());
    if let Some(c) = bad {
        return Err(AppError::Validation(format!(
            "resourceName must be a single path segment, found {:?}",
            c
        )));
    }
    if name == "." || name == ".." {
        return Err(AppError::Validation("resourceName must be a single path segment".into()));
    }
    Ok(())
}

/// Integers or integer strings (`"5"`), within `1..=max`.
fn parse_count(v: &Value, max: u32) -> Result<u32, AppError> {
    let n: Option<i64> = match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    match n {
        Some(n) if n >= 1 && n <= i64::from(max) => Ok(n as u32),
        Some(_) => Err(AppError::Validation(format!("count must be between 1 and {}", max))),
        None => Err(AppError::Validation("count must be an integer".into())),
    }
}

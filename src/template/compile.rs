//! Shape -> template compilation.
//!
//! A shape is user JSON; the template is its typed form: every key split into field name
//! and key rule, arrays reduced to their element template (element 0 only), and an `id`
//! field prepended.

use crate::error::GenerationError;
use crate::template::rule::{split_key, KeyRule};
use serde_json::{Map, Value};

/// Nesting limit for objects and arrays inside a shape.
pub const MAX_DEPTH: usize = 64;

/// Directive used for the injected record id.
pub const ID_DIRECTIVE: &str = "@guid";

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub rule: Option<KeyRule>,
    pub node: Node,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Object(Vec<Field>),
    /// Repeat-this-element array; `None` for the empty-array literal.
    Array(Option<Box<Node>>),
    /// Literal or directive string.
    Leaf(Value),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    fields: Vec<Field>,
}

impl Template {
    pub fn compile(shape: &Value) -> Result<Template, GenerationError> {
        let map = shape
            .as_object()
            .ok_or_else(|| GenerationError::InvalidShape(json_kind(shape)))?;
        let mut fields = Vec::with_capacity(map.len() + 1);
        fields.push(Field {
            name: "id".into(),
            rule: None,
            node: Node::Leaf(Value::String(ID_DIRECTIVE.into())),
        });
        for field in compile_object(map, 1)? {
            if field.name == "id" {
                tracing::debug!("shape declares its own id; the generated id takes precedence");
                continue;
            }
            fields.push(field);
        }
        Ok(Template { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

fn compile_object(map: &Map<String, Value>, depth: usize) -> Result<Vec<Field>, GenerationError> {
    if depth > MAX_DEPTH {
        return Err(GenerationError::TooDeep(MAX_DEPTH));
    }
    map.iter()
        .map(|(key, value)| {
            let (name, rule) = split_key(key);
            Ok(Field {
                name: name.to_string(),
                rule,
                node: compile_value(value, depth)?,
            })
        })
        .collect()
}

fn compile_value(value: &Value, depth: usize) -> Result<Node, GenerationError> {
    match value {
        Value::Object(map) => Ok(Node::Object(compile_object(map, depth + 1)?)),
        Value::Array(items) => compile_array(items, depth + 1),
        other => Ok(Node::Leaf(other.clone())),
    }
}

fn compile_array(items: &[Value], depth: usize) -> Result<Node, GenerationError> {
    if depth > MAX_DEPTH {
        return Err(GenerationError::TooDeep(MAX_DEPTH));
    }
    match items.first() {
        None => Ok(Node::Array(None)),
        Some(element) => Ok(Node::Array(Some(Box::new(compile_value(element, depth)?)))),
    }
}

pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Template expansion: one pass per record, applying key rules and resolving directives.

use crate::error::GenerationError;
use crate::template::compile::{Field, Node};
use crate::template::directive::{float_value, DirectiveResolver};
use crate::template::rule::{KeyRule, MAX_REPEAT};
use rand::{Rng, RngCore};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

/// Approximate size, in bytes, one `generate` call may produce.
pub const MAX_OUTPUT_BYTES: usize = 128 * 1024 * 1024;

/// Flat charge for a number, bool, null, or container slot.
const VALUE_COST: usize = 8;

pub(crate) struct Expander<'a> {
    resolver: &'a dyn DirectiveResolver,
    rng: &'a mut dyn RngCore,
    /// Per field path, how many times an increment rule has fired in this batch.
    steps: HashMap<String, i64>,
    /// Bytes still available to this batch.
    budget: usize,
    limit: usize,
}

impl<'a> Expander<'a> {
    pub fn new(resolver: &'a dyn DirectiveResolver, rng: &'a mut dyn RngCore) -> Self {
        Self::with_budget(resolver, rng, MAX_OUTPUT_BYTES)
    }

    pub fn with_budget(resolver: &'a dyn DirectiveResolver, rng: &'a mut dyn RngCore, limit: usize) -> Self {
        Expander {
            resolver,
            rng,
            steps: HashMap::new(),
            budget: limit,
            limit,
        }
    }

    fn charge(&mut self, bytes: usize) -> Result<(), GenerationError> {
        match self.budget.checked_sub(bytes) {
            Some(left) => {
                self.budget = left;
                Ok(())
            }
            None => Err(GenerationError::TooLarge(self.limit)),
        }
    }

    fn resolve(&mut self, directive: &str) -> Result<Value, GenerationError> {
        let value = self.resolver.resolve(directive, &mut *self.rng)?;
        self.charge(weight(&value))?;
        Ok(value)
    }

    pub fn record(&mut self, fields: &[Field]) -> Result<Value, GenerationError> {
        Ok(Value::Object(self.object(fields, "")?))
    }

    fn object(&mut self, fields: &[Field], path: &str) -> Result<Map<String, Value>, GenerationError> {
        let mut out = Map::with_capacity(fields.len());
        for field in fields {
            let field_path = format!("{}.{}", path, field.name);
            self.charge(VALUE_COST + field.name.len())?;
            let value = match &field.rule {
                None => self.node(&field.node, &field_path)?,
                Some(rule) => self.ruled(&field.node, rule, &field_path)?,
            };
            out.insert(field.name.clone(), value);
        }
        Ok(out)
    }

    fn node(&mut self, node: &Node, path: &str) -> Result<Value, GenerationError> {
        match node {
            Node::Object(fields) => Ok(Value::Object(self.object(fields, path)?)),
            Node::Array(None) => Ok(Value::Array(Vec::new())),
            Node::Array(Some(element)) => {
                self.charge(VALUE_COST)?;
                Ok(Value::Array(vec![self.node(element, &format!("{}[]", path))?]))
            }
            Node::Leaf(Value::String(directive)) => self.resolve(directive),
            Node::Leaf(literal) => {
                self.charge(weight(literal))?;
                Ok(literal.clone())
            }
        }
    }

    fn repeat_count(&mut self, rule: &KeyRule) -> usize {
        rule.count(&mut *self.rng).clamp(0, MAX_REPEAT) as usize
    }

    fn next_step(&mut self, path: &str) -> i64 {
        let n = self.steps.entry(path.to_string()).or_insert(0);
        let current = *n;
        *n += 1;
        current
    }

    fn ruled(&mut self, node: &Node, rule: &KeyRule, path: &str) -> Result<Value, GenerationError> {
        match node {
            Node::Leaf(Value::String(s)) => {
                let times = self.repeat_count(rule);
                self.charge(s.len().saturating_mul(times))?;
                self.resolve(&s.repeat(times))
            }
            Node::Leaf(Value::Number(n)) => Ok(self.ruled_number(n, rule, path)),
            Node::Leaf(Value::Bool(b)) => Ok(Value::Bool(self.ruled_bool(*b, rule))),
            Node::Leaf(other) => Ok(other.clone()),
            Node::Object(fields) => {
                let take = self.repeat_count(rule).min(fields.len());
                let mut picked: Vec<usize> = rand::seq::index::sample(&mut *self.rng, fields.len(), take).into_vec();
                picked.sort_unstable();
                let chosen: Vec<Field> = picked.into_iter().map(|i| fields[i].clone()).collect();
                Ok(Value::Object(self.object(&chosen, path)?))
            }
            Node::Array(None) => Ok(Value::Array(Vec::new())),
            Node::Array(Some(element)) => {
                let element_path = format!("{}[]", path);
                if rule.step.is_some() || (rule.min == Some(1) && rule.max.is_none()) {
                    return self.node(element, &element_path);
                }
                let times = self.repeat_count(rule);
                let items = (0..times)
                    .map(|_| {
                        self.charge(VALUE_COST)?;
                        self.node(element, &element_path)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(items))
            }
        }
    }

    fn ruled_number(&mut self, n: &Number, rule: &KeyRule, path: &str) -> Value {
        if let Some(step) = rule.step {
            let index = self.next_step(path);
            return match n.as_i64() {
                Some(base) => Value::Number(base.saturating_add(step.saturating_mul(index)).into()),
                None => {
                    let base = n.as_f64().unwrap_or(0.0);
                    Number::from_f64(base + step as f64 * index as f64)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
            };
        }
        let int_part = if rule.min.is_some() {
            rule.count(&mut *self.rng)
        } else {
            n.as_f64().map(|f| f.trunc() as i64).unwrap_or(0)
        };
        match rule.decimals(&mut *self.rng) {
            Some(places) => float_value(int_part, places.min(15) as usize, &mut *self.rng),
            None => Value::Number(int_part.into()),
        }
    }

    fn ruled_bool(&mut self, literal: bool, rule: &KeyRule) -> bool {
        match (rule.min, rule.max) {
            (Some(min), Some(max)) if min >= 0 && max >= 0 && (min > 0 || max > 0) => {
                let p = min as f64 / (min as f64 + max as f64);
                if self.rng.random_bool(p) {
                    literal
                } else {
                    !literal
                }
            }
            _ => self.rng.random_bool(0.5),
        }
    }
}

/// Rough byte size of a generated value.
fn weight(v: &Value) -> usize {
    match v {
        Value::String(s) => VALUE_COST + s.len(),
        Value::Array(items) => items.iter().fold(VALUE_COST, |acc, x| acc.saturating_add(weight(x))),
        Value::Object(map) => map
            .iter()
            .fold(VALUE_COST, |acc, (k, x)| acc.saturating_add(k.len()).saturating_add(weight(x))),
        _ => VALUE_COST,
    }
}

//! Template engine: shape -> template -> generated records.
//!
//! ```text
//! shape  {"name": "@cname", "tags|2": ["@word"], "addr": {"city": "@city"}}
//! record {"id": "6f1c…", "name": "王芳", "tags": ["qzk", "mepwa"], "addr": {"city": "杭州市"}}
//! ```

pub mod compile;
pub mod data;
pub mod directive;
mod expand;
pub mod rule;

pub use compile::{Field, Node, Template, MAX_DEPTH};
pub use directive::{DirectiveResolver, MockResolver};
pub use expand::MAX_OUTPUT_BYTES;
pub use rule::{KeyRule, MAX_REPEAT};

use crate::error::GenerationError;
use expand::Expander;
use rand::RngCore;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct TemplateEngine {
    resolver: Arc<dyn DirectiveResolver>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        TemplateEngine::new(Arc::new(MockResolver::new()))
    }
}

impl std::fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateEngine").finish_non_exhaustive()
    }
}

impl TemplateEngine {
    pub fn new(resolver: Arc<dyn DirectiveResolver>) -> Self {
        TemplateEngine { resolver }
    }

    /// Generate `count` independent records from `shape`. Callers validate `count` first.
    pub fn generate(&self, shape: &Value, count: usize) -> Result<Vec<Value>, GenerationError> {
        let mut rng = rand::rng();
        self.generate_with(shape, count, &mut rng)
    }

    pub fn generate_with(
        &self,
        shape: &Value,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError> {
        let template = Template::compile(shape)?;
        self.expand(&template, count, rng)
    }

    pub fn expand(
        &self,
        template: &Template,
        count: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError> {
        let mut expander = Expander::new(self.resolver.as_ref(), rng);
        (0..count).map(|_| expander.record(template.fields())).collect()
    }
}

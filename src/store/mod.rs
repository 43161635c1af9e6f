//! Flat-file persistence: the schema document and the resource document.

pub mod document;
pub mod resources;
pub mod schemas;

pub use document::JsonDocument;
pub use resources::{Records, ResourceMap, ResourceStore};
pub use schemas::{SchemaDefinition, SchemaDocument, SchemaStore};

//! HTTP handlers for schema management and generated resources.

pub mod resource;
pub mod schema;

pub use schema::*;

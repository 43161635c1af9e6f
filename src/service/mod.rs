//! Services: schema lifecycle and generic collection CRUD.

mod crud;
pub mod query;
mod schema;
mod validation;

pub use crud::{CrudService, ListOutcome};
pub use query::{ListQuery, Window};
pub use schema::SchemaService;
pub use validation::{validate_resource_name, SchemaInput, SchemaValidator, ValidatedSchema};

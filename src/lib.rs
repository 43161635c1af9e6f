//! Mock generator: schema-driven fake data served as ad-hoc REST resources.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod registry;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;
pub mod template;

pub use config::Settings;
pub use error::{AppError, ConfigError, GenerationError, PersistenceError};
pub use registry::{ResolvedResource, ResourceRegistry};
pub use routes::{app, common_routes, resource_routes, schema_routes};
pub use service::{CrudService, SchemaService};
pub use state::AppState;
pub use store::{ResourceStore, SchemaDefinition, SchemaStore};
pub use template::{DirectiveResolver, MockResolver, TemplateEngine};

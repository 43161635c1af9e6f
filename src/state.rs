//! Shared application state for all routes. The registry is refreshed as resources change.

use crate::config::Settings;
use crate::error::PersistenceError;
use crate::registry::ResourceRegistry;
use crate::service::SchemaService;
use crate::store::{ResourceStore, SchemaStore};
use crate::template::TemplateEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub schemas: Arc<SchemaService>,
    pub resources: ResourceStore,
    /// Resource names servable on the mock surface; rebuilt from `resources` when its version moves.
    pub registry: Arc<ResourceRegistry>,
}

impl AppState {
    /// Open (or create) both documents and prime the registry.
    pub async fn open(settings: Settings) -> Result<Self, PersistenceError> {
        Self::with_engine(settings, TemplateEngine::default()).await
    }

    pub async fn with_engine(settings: Settings, engine: TemplateEngine) -> Result<Self, PersistenceError> {
        let settings = Arc::new(settings);
        let schema_store = SchemaStore::open(settings.schemas_path.clone()).await?;
        let resources = ResourceStore::open(settings.db_path.clone()).await?;
        let registry = Arc::new(ResourceRegistry::new());
        registry.sync(&resources).await;
        tracing::info!(
            schemas = schema_store.count().await,
            resources = registry.len(),
            "storage opened"
        );
        let schemas = Arc::new(SchemaService::new(
            settings.clone(),
            schema_store,
            resources.clone(),
            registry.clone(),
            engine,
        ));
        Ok(AppState {
            settings,
            schemas,
            resources,
            registry,
        })
    }
}

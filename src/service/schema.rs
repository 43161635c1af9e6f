//! Schema lifecycle: validate, generate, persist both documents, refresh the registry.

use crate::config::Settings;
use crate::error::AppError;
use crate::registry::ResourceRegistry;
use crate::response::{timestamp, Listing, PageQuery, SchemaView};
use crate::service::validation::{SchemaInput, SchemaValidator, ValidatedSchema};
use crate::store::{Records, ResourceStore, SchemaDefinition, SchemaStore};
use crate::template::TemplateEngine;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct SchemaService {
    settings: Arc<Settings>,
    schemas: SchemaStore,
    resources: ResourceStore,
    registry: Arc<ResourceRegistry>,
    engine: TemplateEngine,
    /// Serializes mutations so uniqueness checks and the two document writes happen together.
    write_lock: Mutex<()>,
}

impl SchemaService {
    pub fn new(
        settings: Arc<Settings>,
        schemas: SchemaStore,
        resources: ResourceStore,
        registry: Arc<ResourceRegistry>,
        engine: TemplateEngine,
    ) -> Self {
        SchemaService {
            settings,
            schemas,
            resources,
            registry,
            engine,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SchemaStore {
        &self.schemas
    }

    pub async fn create(&self, input: SchemaInput) -> Result<SchemaView, AppError> {
        let valid = SchemaValidator::validate(input, self.settings.max_record_count)?;
        let _guard = self.write_lock.lock().await;
        self.check_unique(&valid, None).await?;

        let records = self.engine.generate(&valid.shape, valid.count as usize)?;
        self.resources.set(&valid.resource_name, records).await?;

        let now = timestamp();
        let definition = SchemaDefinition {
            id: format!("schema_{}", uuid::Uuid::new_v4().simple()),
            name: valid.name,
            resource_name: valid.resource_name,
            shape: valid.shape,
            record_count: valid.count,
            created_at: now.clone(),
            updated_at: now,
        };
        if let Err(e) = self.schemas.insert(definition.clone()).await {
            if let Err(cleanup) = self.resources.delete(&definition.resource_name).await {
                tracing::warn!(resource = %definition.resource_name, error = %cleanup, "could not roll back generated records");
            }
            self.registry.sync(&self.resources).await;
            return Err(e.into());
        }
        self.registry.sync(&self.resources).await;
        tracing::info!(
            id = %definition.id,
            resource = %definition.resource_name,
            count = definition.record_count,
            "schema created"
        );
        Ok(self.view(definition))
    }

    pub async fn list(&self, query: &PageQuery) -> Listing<SchemaView> {
        let views = self
            .schemas
            .all()
            .await
            .into_iter()
            .map(|d| self.view(d))
            .collect();
        Listing::build(views, query)
    }

    pub async fn get(&self, id: &str) -> Result<SchemaView, AppError> {
        self.find(id).await.map(|d| self.view(d))
    }

    /// Full regeneration. Renaming the resource drops the old collection. A failed write puts
    /// both collections back as they were.
    pub async fn update(&self, id: &str, input: SchemaInput) -> Result<SchemaView, AppError> {
        let valid = SchemaValidator::validate(input, self.settings.max_record_count)?;
        let _guard = self.write_lock.lock().await;
        let existing = self.find(id).await?;
        self.check_unique(&valid, Some(id)).await?;

        let records = self.engine.generate(&valid.shape, valid.count as usize)?;
        let renamed = existing.resource_name != valid.resource_name;
        let previous = self.resources.get(&valid.resource_name).await;
        let old = if renamed {
            self.resources.get(&existing.resource_name).await
        } else {
            None
        };
        self.resources.set(&valid.resource_name, records).await?;

        let definition = SchemaDefinition {
            id: existing.id,
            name: valid.name,
            resource_name: valid.resource_name,
            shape: valid.shape,
            record_count: valid.count,
            created_at: existing.created_at,
            updated_at: timestamp(),
        };
        let committed: Result<(), AppError> = async {
            if renamed {
                self.resources.delete(&existing.resource_name).await?;
            }
            self.schemas.replace(definition.clone()).await
        }
        .await;
        if let Err(e) = committed {
            self.restore(&definition.resource_name, previous).await;
            if renamed {
                self.restore(&existing.resource_name, old).await;
            }
            self.registry.sync(&self.resources).await;
            return Err(e);
        }
        if renamed {
            tracing::info!(from = %existing.resource_name, to = %definition.resource_name, "resource renamed");
        }
        self.registry.sync(&self.resources).await;
        tracing::info!(id = %definition.id, count = definition.record_count, "schema updated");
        Ok(self.view(definition))
    }

    /// Removes the resource collection first, then the definition.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let existing = self.find(id).await?;
        self.resources.delete(&existing.resource_name).await?;
        self.schemas.remove(id).await?;
        self.registry.sync(&self.resources).await;
        tracing::info!(id, resource = %existing.resource_name, "schema deleted");
        Ok(())
    }

    /// Generated records of a schema; an absent collection reads as empty.
    pub async fn data(&self, id: &str, query: &PageQuery) -> Result<Listing<Value>, AppError> {
        let definition = self.find(id).await?;
        let records = self.resources.get(&definition.resource_name).await.unwrap_or_default();
        Ok(Listing::build(records, query))
    }

    async fn restore(&self, name: &str, records: Option<Records>) {
        let res = match records {
            Some(records) => self.resources.set(name, records).await,
            None => self.resources.delete(name).await.map(|_| ()),
        };
        if let Err(e) = res {
            tracing::warn!(resource = name, error = %e, "could not roll back resource");
        }
    }

    async fn find(&self, id: &str) -> Result<SchemaDefinition, AppError> {
        self.schemas
            .find(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("schema not found: {}", id)))
    }

    async fn check_unique(&self, valid: &ValidatedSchema, own_id: Option<&str>) -> Result<(), AppError> {
        let other = |d: &SchemaDefinition| Some(d.id.as_str()) != own_id;
        if let Some(d) = self.schemas.find_by_name(&valid.name).await.filter(|d| other(d)) {
            return Err(AppError::Conflict(format!("schema name already exists: {}", d.name)));
        }
        if let Some(d) = self
            .schemas
            .find_by_resource(&valid.resource_name)
            .await
            .filter(|d| other(d))
        {
            return Err(AppError::Conflict(format!(
                "resourceName {} is already used by schema {}",
                d.resource_name, d.name
            )));
        }
        Ok(())
    }

    fn view(&self, definition: SchemaDefinition) -> SchemaView {
        let endpoint = self.settings.endpoint_for(&definition.resource_name);
        SchemaView { definition, endpoint }
    }
}

//! Persistence for schema definitions (`{"schemas": [...]}`).

use crate::error::{AppError, PersistenceError};
use crate::store::document::JsonDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    pub id: String,
    pub name: String,
    pub resource_name: String,
    /// The shape, stored as submitted.
    #[serde(rename = "schema")]
    pub shape: Value,
    #[serde(rename = "count")]
    pub record_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub schemas: Vec<SchemaDefinition>,
}

#[derive(Clone, Debug)]
pub struct SchemaStore {
    doc: Arc<JsonDocument<SchemaDocument>>,
}

impl SchemaStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        Ok(SchemaStore {
            doc: Arc::new(JsonDocument::open(path).await?),
        })
    }

    /// All definitions in creation order.
    pub async fn all(&self) -> Vec<SchemaDefinition> {
        self.doc.read(|d| d.schemas.clone()).await
    }

    pub async fn count(&self) -> usize {
        self.doc.read(|d| d.schemas.len()).await
    }

    pub async fn find(&self, id: &str) -> Option<SchemaDefinition> {
        self.doc.read(|d| d.schemas.iter().find(|s| s.id == id).cloned()).await
    }

    pub async fn find_by_name(&self, name: &str) -> Option<SchemaDefinition> {
        self.doc.read(|d| d.schemas.iter().find(|s| s.name == name).cloned()).await
    }

    pub async fn find_by_resource(&self, resource_name: &str) -> Option<SchemaDefinition> {
        self.doc
            .read(|d| d.schemas.iter().find(|s| s.resource_name == resource_name).cloned())
            .await
    }

    pub async fn insert(&self, schema: SchemaDefinition) -> Result<(), PersistenceError> {
        self.doc
            .update(|d| {
                d.schemas.push(schema);
                Ok::<_, PersistenceError>(())
            })
            .await
    }

    /// Replace the definition with the same id.
    pub async fn replace(&self, schema: SchemaDefinition) -> Result<(), AppError> {
        self.doc
            .update(|d| {
                let slot = d
                    .schemas
                    .iter_mut()
                    .find(|s| s.id == schema.id)
                    .ok_or_else(|| AppError::NotFound(format!("schema not found: {}", schema.id)))?;
                *slot = schema;
                Ok(())
            })
            .await
    }

    pub async fn remove(&self, id: &str) -> Result<Option<SchemaDefinition>, PersistenceError> {
        self.doc
            .update(|d| {
                let removed = d.schemas.iter().position(|s| s.id == id).map(|i| d.schemas.remove(i));
                Ok::<_, PersistenceError>(removed)
            })
            .await
    }
}

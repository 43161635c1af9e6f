//! Resource collections keyed by resource name, persisted as one document
//! (`{"users": [...], "orders": [...]}`).

use crate::error::{AppError, PersistenceError};
use crate::store::document::JsonDocument;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub type Records = Vec<Value>;
pub type ResourceMap = BTreeMap<String, Records>;

/// Cheap to clone; clones share the document and the mutation version.
#[derive(Clone, Debug)]
pub struct ResourceStore {
    doc: Arc<JsonDocument<ResourceMap>>,
    version: Arc<AtomicU64>,
}

impl ResourceStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        Ok(ResourceStore {
            doc: Arc::new(JsonDocument::open(path).await?),
            version: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Bumped on every successful mutation. Readers compare it to decide whether to re-read keys.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    pub async fn keys(&self) -> Vec<String> {
        self.doc.read(|m| m.keys().cloned().collect()).await
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.doc.read(|m| m.contains_key(name)).await
    }

    pub async fn get(&self, name: &str) -> Option<Records> {
        self.doc.read(|m| m.get(name).cloned()).await
    }

    pub async fn len(&self, name: &str) -> Option<usize> {
        self.doc.read(|m| m.get(name).map(Vec::len)).await
    }

    /// Replace the whole collection under `name`.
    pub async fn set(&self, name: &str, records: Records) -> Result<(), PersistenceError> {
        self.doc
            .update(|m| {
                m.insert(name.to_string(), records);
                Ok::<_, PersistenceError>(())
            })
            .await?;
        self.bump();
        Ok(())
    }

    /// Remove the key entirely. Returns whether it existed.
    pub async fn delete(&self, name: &str) -> Result<bool, PersistenceError> {
        if !self.contains(name).await {
            return Ok(false);
        }
        let existed = self
            .doc
            .update(|m| Ok::<_, PersistenceError>(m.remove(name).is_some()))
            .await?;
        if existed {
            self.bump();
        }
        Ok(existed)
    }

    /// Read-modify-write of one existing collection. Missing keys are `NotFound`; they are
    /// never created implicitly.
    pub async fn modify<R>(&self, name: &str, f: impl FnOnce(&mut Records) -> Result<R, AppError>) -> Result<R, AppError> {
        let out = self
            .doc
            .update(|m| {
                let records = m
                    .get_mut(name)
                    .ok_or_else(|| AppError::NotFound(format!("resource not found: {}", name)))?;
                f(records)
            })
            .await?;
        self.bump();
        Ok(out)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn store() -> (tempfile::TempDir, ResourceStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ResourceStore::open(dir.path().join("db.json")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn set_get_delete() {
        let (_dir, store) = store().await;
        store.set("users", vec![json!({"id": "1"})]).await.unwrap();
        assert_eq!(store.keys().await, vec!["users".to_string()]);
        assert_eq!(store.len("users").await, Some(1));

        store.set("users", vec![json!({"id": "2"}), json!({"id": "3"})]).await.unwrap();
        assert_eq!(store.len("users").await, Some(2));

        assert!(store.delete("users").await.unwrap());
        assert!(!store.contains("users").await);
        assert!(!store.delete("users").await.unwrap());
    }

    #[tokio::test]
    async fn version_moves_on_every_mutation() {
        let (_dir, store) = store().await;
        let v0 = store.version();
        store.set("a", vec![]).await.unwrap();
        let v1 = store.version();
        assert!(v1 > v0);
        store.delete("a").await.unwrap();
        assert!(store.version() > v1);
        let v2 = store.version();
        store.delete("a").await.unwrap();
        assert_eq!(store.version(), v2);
    }

    #[tokio::test]
    async fn modify_requires_existing_key() {
        let (_dir, store) = store().await;
        let err = store.modify("ghost", |r| Ok(r.len())).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!store.contains("ghost").await);

        store.set("posts", vec![]).await.unwrap();
        store
            .modify("posts", |r| {
                r.push(json!({"id": "p1"}));
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(store.get("posts").await.unwrap(), vec![json!({"id": "p1"})]);
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        {
            let store = ResourceStore::open(&path).await.unwrap();
            store.set("books", vec![json!({"id": "b"})]).await.unwrap();
        }
        let store = ResourceStore::open(&path).await.unwrap();
        assert_eq!(store.get("books").await, Some(vec![json!({"id": "b"})]));
    }
}

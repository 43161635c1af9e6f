//! Table of servable resource names, refreshed from the resource store at runtime.

use crate::store::ResourceStore;
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

/// One servable resource. Requests work on a clone, never on the live table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedResource {
    pub name: String,
}

#[derive(Debug, Default)]
struct Table {
    version: u64,
    resources: HashMap<String, ResolvedResource>,
}

#[derive(Debug, Default)]
pub struct ResourceRegistry {
    table: RwLock<Table>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the table when the store changed since the last sync. Returns true if rebuilt.
    pub async fn sync(&self, store: &ResourceStore) -> bool {
        let version = store.version();
        if self.version() == version {
            return false;
        }
        let keys = store.keys().await;
        self.install(version, keys)
    }

    fn install(&self, version: u64, keys: Vec<String>) -> bool {
        let mut table = match self.table.write() {
            Ok(t) => t,
            Err(poisoned) => poisoned.into_inner(),
        };
        // A concurrent sync may have installed a newer table while we were reading keys.
        if table.version >= version {
            return false;
        }
        let next: HashMap<String, ResolvedResource> = keys
            .into_iter()
            .map(|name| (name.clone(), ResolvedResource { name }))
            .collect();

        let old: BTreeSet<&String> = table.resources.keys().collect();
        let new: BTreeSet<&String> = next.keys().collect();
        let added: Vec<&String> = new.difference(&old).copied().collect();
        let removed: Vec<&String> = old.difference(&new).copied().collect();
        if !added.is_empty() || !removed.is_empty() {
            tracing::info!(?added, ?removed, total = next.len(), "resource routes refreshed");
        }

        table.resources = next;
        table.version = version;
        true
    }

    pub fn version(&self) -> u64 {
        self.read(|t| t.version)
    }

    pub fn resolve(&self, name: &str) -> Option<ResolvedResource> {
        self.read(|t| t.resources.get(name).cloned())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names = self.read(|t| t.resources.keys().cloned().collect::<Vec<_>>());
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.read(|t| t.resources.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read<R>(&self, f: impl FnOnce(&Table) -> R) -> R {
        match self.table.read() {
            Ok(t) => f(&t),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn tracks_additions_and_removals() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResourceStore::open(dir.path().join("db.json")).await.unwrap();
        let registry = ResourceRegistry::new();

        assert!(registry.sync(&store).await);
        assert!(registry.is_empty());
        assert!(!registry.sync(&store).await);

        store.set("users", vec![json!({"id": "1"})]).await.unwrap();
        store.set("posts", vec![]).await.unwrap();
        assert!(registry.resolve("users").is_none());
        assert!(registry.sync(&store).await);
        assert_eq!(registry.names(), vec!["posts".to_string(), "users".to_string()]);
        assert_eq!(registry.resolve("users").map(|r| r.name), Some("users".into()));

        store.delete("users").await.unwrap();
        assert!(registry.sync(&store).await);
        assert!(registry.resolve("users").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn stale_install_is_ignored() {
        let registry = ResourceRegistry::new();
        assert!(registry.install(5, vec!["a".into()]));
        assert!(!registry.install(3, vec!["b".into()]));
        assert!(registry.resolve("a").is_some());
        assert!(registry.resolve("b").is_none());
    }
}

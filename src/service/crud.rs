//! Generic CRUD over one resource collection of the resource store.

use crate::error::AppError;
use crate::registry::ResolvedResource;
use crate::service::query::{text, ListQuery};
use crate::store::ResourceStore;
use serde_json::{Map, Value};

/// Result of a list call: the window plus the filtered total it was cut from.
#[derive(Debug)]
pub struct ListOutcome {
    pub records: Vec<Value>,
    pub total: usize,
    pub windowed: bool,
}

pub struct CrudService;

impl CrudService {
    /// Filter, search, sort, then window.
    pub async fn list(
        store: &ResourceStore,
        resource: &ResolvedResource,
        query: &ListQuery,
    ) -> Result<ListOutcome, AppError> {
        let records = Self::collection(store, resource).await?;
        let mut matched: Vec<Value> = records.into_iter().filter(|r| query.matches(r)).collect();
        query.sort_records(&mut matched);
        let total = matched.len();
        let (start, end) = query.range(total);
        tracing::debug!(resource = %resource.name, total, start, end, "list");
        let records = matched.into_iter().skip(start).take(end - start).collect();
        Ok(ListOutcome {
            records,
            total,
            windowed: query.is_windowed(),
        })
    }

    /// Fetch one record by id. `Ok(None)` when the collection exists but the id does not.
    pub async fn read(store: &ResourceStore, resource: &ResolvedResource, id: &str) -> Result<Option<Value>, AppError> {
        let records = Self::collection(store, resource).await?;
        Ok(records.into_iter().find(|r| has_id(r, id)))
    }

    /// Append a record. A missing or null `id` is assigned; an existing one must be unique.
    pub async fn create(
        store: &ResourceStore,
        resource: &ResolvedResource,
        body: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let mut body = body;
        let id = match body.remove("id") {
            None | Some(Value::Null) => Value::String(uuid::Uuid::new_v4().to_string()),
            Some(id) => id,
        };
        let record = with_id_first(id.clone(), body);
        let id_text = text(&id);
        store
            .modify(&resource.name, |records| {
                if records.iter().any(|r| has_id(r, &id_text)) {
                    return Err(AppError::Conflict(format!("duplicate id: {}", id_text)));
                }
                records.push(record.clone());
                Ok(())
            })
            .await?;
        Ok(record)
    }

    /// Full replace; the stored id is kept whatever the body says.
    pub async fn replace(
        store: &ResourceStore,
        resource: &ResolvedResource,
        id: &str,
        body: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        store
            .modify(&resource.name, |records| {
                let Some(slot) = records.iter_mut().find(|r| has_id(r, id)) else {
                    return Ok(None);
                };
                let stored_id = slot.get("id").cloned().unwrap_or(Value::Null);
                let mut body = body;
                body.remove("id");
                *slot = with_id_first(stored_id, body);
                Ok(Some(slot.clone()))
            })
            .await
    }

    /// Shallow merge of `body` into the record.
    pub async fn patch(
        store: &ResourceStore,
        resource: &ResolvedResource,
        id: &str,
        body: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        store
            .modify(&resource.name, |records| {
                let Some(slot) = records.iter_mut().find(|r| has_id(r, id)) else {
                    return Ok(None);
                };
                if let Value::Object(fields) = slot {
                    for (k, v) in body {
                        if k != "id" {
                            fields.insert(k, v);
                        }
                    }
                }
                Ok(Some(slot.clone()))
            })
            .await
    }

    /// Remove one record and return it.
    pub async fn delete(store: &ResourceStore, resource: &ResolvedResource, id: &str) -> Result<Option<Value>, AppError> {
        store
            .modify(&resource.name, |records| {
                Ok(records
                    .iter()
                    .position(|r| has_id(r, id))
                    .map(|i| records.remove(i)))
            })
            .await
    }

    async fn collection(store: &ResourceStore, resource: &ResolvedResource) -> Result<Vec<Value>, AppError> {
        store
            .get(&resource.name)
            .await
            .ok_or_else(|| AppError::NotFound(format!("resource not found: {}", resource.name)))
    }
}

fn has_id(record: &Value, id: &str) -> bool {
    record.get("id").map(|v| text(v) == id).unwrap_or(false)
}

fn with_id_first(id: Value, body: Map<String, Value>) -> Value {
    let mut record = Map::with_capacity(body.len() + 1);
    record.insert("id".to_string(), id);
    record.extend(body);
    Value::Object(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup() -> (tempfile::TempDir, ResourceStore, ResolvedResource) {
        let dir = tempfile::tempdir().unwrap();
        let store = ResourceStore::open(dir.path().join("db.json")).await.unwrap();
        let records = (1..=25)
            .map(|i| json!({"id": i.to_string(), "n": i, "even": i % 2 == 0}))
            .collect();
        store.set("items", records).await.unwrap();
        (dir, store, ResolvedResource { name: "items".into() })
    }

    fn object(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    fn q(pairs: &[(&str, &str)]) -> ListQuery {
        ListQuery::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()).unwrap()
    }

    #[tokio::test]
    async fn list_filters_then_windows() {
        let (_d, store, res) = setup().await;
        let all = CrudService::list(&store, &res, &q(&[])).await.unwrap();
        assert_eq!(all.records.len(), 25);
        assert!(!all.windowed);

        let page = CrudService::list(&store, &res, &q(&[("even", "true"), ("_page", "2"), ("_limit", "5")]))
            .await
            .unwrap();
        assert_eq!(page.total, 12);
        assert!(page.windowed);
        let ns: Vec<_> = page.records.iter().map(|r| r["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![12, 14, 16, 18, 20]);
    }

    #[tokio::test]
    async fn create_assigns_id_and_rejects_duplicates() {
        let (_d, store, res) = setup().await;
        let created = CrudService::create(&store, &res, object(json!({"n": 99}))).await.unwrap();
        let id = created["id"].as_str().unwrap().to_string();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(created.as_object().unwrap().keys().next().map(String::as_str), Some("id"));
        assert_eq!(CrudService::read(&store, &res, &id).await.unwrap(), Some(created));

        let dup = CrudService::create(&store, &res, object(json!({"id": "3"}))).await.unwrap_err();
        assert!(matches!(dup, AppError::Conflict(_)));
        assert_eq!(store.len("items").await, Some(26));
    }

    #[tokio::test]
    async fn replace_patch_delete() {
        let (_d, store, res) = setup().await;
        let replaced = CrudService::replace(&store, &res, "4", object(json!({"id": "zzz", "x": 1})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced, json!({"id": "4", "x": 1}));

        let patched = CrudService::patch(&store, &res, "5", object(json!({"n": 500, "extra": true})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(patched, json!({"id": "5", "n": 500, "even": false, "extra": true}));

        assert!(CrudService::patch(&store, &res, "nope", Map::new()).await.unwrap().is_none());

        let removed = CrudService::delete(&store, &res, "6").await.unwrap().unwrap();
        assert_eq!(removed["n"], 6);
        assert!(CrudService::read(&store, &res, "6").await.unwrap().is_none());
        assert!(CrudService::delete(&store, &res, "6").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn vanished_collection_is_not_found() {
        let (_d, store, res) = setup().await;
        store.delete("items").await.unwrap();
        let err = CrudService::list(&store, &res, &q(&[])).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

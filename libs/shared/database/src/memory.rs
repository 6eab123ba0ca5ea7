use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::document::{Document, DocumentStore, Filter, Precondition, StoreError, Write};

#[derive(Debug, Clone)]
struct StoredDoc {
    data: Value,
    revision: u64,
}

/// In-process store with the same atomicity and revision semantics as the
/// hosted backend. Backs the cell test suites and local development.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, HashMap<String, StoredDoc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn doc_path(collection: &str, id: &str) -> String {
        format!("{}/{}", collection, id)
    }

    fn merge(existing: &mut Value, patch: &Value) {
        if let (Some(target), Some(fields)) = (existing.as_object_mut(), patch.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
    }

    fn check_precondition(
        doc: Option<&StoredDoc>,
        precondition: &Option<Precondition>,
        path: &str,
    ) -> Result<(), StoreError> {
        match precondition {
            None => Ok(()),
            Some(Precondition::MustNotExist) => {
                if doc.is_some() {
                    Err(StoreError::AlreadyExists(path.to_string()))
                } else {
                    Ok(())
                }
            }
            Some(Precondition::Revision(revision)) => match doc {
                Some(stored) if stored.revision.to_string() == *revision => Ok(()),
                Some(_) => Err(StoreError::Conflict(format!(
                    "revision mismatch on {}",
                    path
                ))),
                None => Err(StoreError::NotFound(path.to_string())),
            },
        }
    }

    fn apply_writes(
        collections: &mut HashMap<String, HashMap<String, StoredDoc>>,
        writes: &[Write],
    ) -> Result<(), StoreError> {
        // Validate every precondition before touching anything, so a batch
        // is all-or-nothing.
        for write in writes {
            match write {
                Write::Create { collection, id, .. } => {
                    let doc = collections.get(collection).and_then(|c| c.get(id));
                    Self::check_precondition(
                        doc,
                        &Some(Precondition::MustNotExist),
                        &Self::doc_path(collection, id),
                    )?;
                }
                Write::Update {
                    collection,
                    id,
                    precondition,
                    ..
                } => {
                    let doc = collections.get(collection).and_then(|c| c.get(id));
                    if doc.is_none() {
                        return Err(StoreError::NotFound(Self::doc_path(collection, id)));
                    }
                    Self::check_precondition(doc, precondition, &Self::doc_path(collection, id))?;
                }
                Write::Delete { .. } => {}
            }
        }

        for write in writes {
            match write {
                Write::Create { collection, id, data } => {
                    collections
                        .entry(collection.clone())
                        .or_default()
                        .insert(
                            id.clone(),
                            StoredDoc {
                                data: data.clone(),
                                revision: 1,
                            },
                        );
                }
                Write::Update {
                    collection, id, data, ..
                } => {
                    if let Some(stored) = collections
                        .get_mut(collection)
                        .and_then(|c| c.get_mut(id))
                    {
                        Self::merge(&mut stored.data, data);
                        stored.revision += 1;
                    }
                }
                Write::Delete { collection, id } => {
                    if let Some(collection) = collections.get_mut(collection) {
                        collection.remove(id);
                    }
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.lock().unwrap();
        Ok(collections.get(collection).and_then(|c| c.get(id)).map(|stored| Document {
            id: id.to_string(),
            revision: Some(stored.revision.to_string()),
            data: stored.data.clone(),
        }))
    }

    async fn list(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.lock().unwrap();
        let docs = collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .filter(|(_, stored)| {
                        filters
                            .iter()
                            .all(|f| stored.data.get(&f.field) == Some(&f.value))
                    })
                    .map(|(id, stored)| Document {
                        id: id.clone(),
                        revision: Some(stored.revision.to_string()),
                        data: stored.data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn create(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        self.commit(vec![Write::create(collection, id, data)]).await
    }

    async fn update(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        self.commit(vec![Write::update(collection, id, data)]).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.commit(vec![Write::delete(collection, id)]).await
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        let mut collections = self.collections.lock().unwrap();
        Self::apply_writes(&mut collections, &writes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let store = MemoryStore::new();
        store
            .create("users/p1/addresses", "a1", json!({"city": "Lagos"}))
            .await
            .unwrap();

        let doc = store.get("users/p1/addresses", "a1").await.unwrap().unwrap();
        assert_eq!(doc.data["city"], "Lagos");
        assert_eq!(doc.revision.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn update_merges_and_bumps_revision() {
        let store = MemoryStore::new();
        store
            .create("users", "u1", json!({"name": "Ada", "city": "Lagos"}))
            .await
            .unwrap();
        store
            .update("users", "u1", json!({"city": "Abuja"}))
            .await
            .unwrap();

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "Ada");
        assert_eq!(doc.data["city"], "Abuja");
        assert_eq!(doc.revision.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn stale_revision_conflicts() {
        let store = MemoryStore::new();
        store.create("users", "u1", json!({"n": 0})).await.unwrap();
        let stale = store.get("users", "u1").await.unwrap().unwrap();
        store.update("users", "u1", json!({"n": 1})).await.unwrap();

        let result = store
            .commit(vec![Write::update_guarded(
                "users",
                "u1",
                json!({"n": 2}),
                stale.revision,
            )])
            .await;
        assert_matches!(result, Err(StoreError::Conflict(_)));

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.data["n"], 1);
    }

    #[tokio::test]
    async fn failed_batch_applies_nothing() {
        let store = MemoryStore::new();
        store.create("users", "u1", json!({"n": 0})).await.unwrap();

        // Second write fails its precondition, so the first must not land.
        let result = store
            .commit(vec![
                Write::update("users", "u1", json!({"n": 9})),
                Write::create("users", "u1", json!({})),
            ])
            .await;
        assert_matches!(result, Err(StoreError::AlreadyExists(_)));

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.data["n"], 0);
    }

    #[tokio::test]
    async fn list_applies_equality_filters() {
        let store = MemoryStore::new();
        store
            .create("users/p1/addresses", "a1", json!({"is_default": true}))
            .await
            .unwrap();
        store
            .create("users/p1/addresses", "a2", json!({"is_default": false}))
            .await
            .unwrap();

        let defaults = store
            .list("users/p1/addresses", &[Filter::eq("is_default", true)])
            .await
            .unwrap();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, "a1");
    }
}

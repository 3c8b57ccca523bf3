use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::DocumentStore;
use crate::errors::RepoError;

#[derive(Default)]
struct Collections {
    documents: HashMap<String, BTreeMap<String, Value>>,
    unique: HashMap<String, String>,
}

/// In-process document store for development runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_key(collection: &str, field: &str, value: &str) -> String {
    format!("{collection}:{field}:{}", value.to_lowercase())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: &str, document: &Value) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        inner
            .documents
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document.clone());
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, RepoError> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .documents
            .get_mut(collection)
            .map(|documents| documents.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn scan(&self, collection: &str) -> Result<Vec<Value>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .get(collection)
            .map(|documents| documents.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn count(&self, collection: &str) -> Result<u64, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.documents.get(collection).map(|d| d.len() as u64).unwrap_or(0))
    }

    async fn claim_unique(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        id: &str,
    ) -> Result<Option<String>, RepoError> {
        let mut inner = self.inner.write().await;
        let key = unique_key(collection, field, value);
        match inner.unique.get(&key) {
            Some(owner) if owner != id => Ok(Some(owner.clone())),
            Some(_) => Ok(None),
            None => {
                inner.unique.insert(key, id.to_string());
                Ok(None)
            }
        }
    }

    async fn release_unique(&self, collection: &str, field: &str, value: &str, id: &str) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        let key = unique_key(collection, field, value);
        if inner.unique.get(&key).is_some_and(|owner| owner == id) {
            inner.unique.remove(&key);
        }
        Ok(())
    }

    async fn lookup_unique(&self, collection: &str, field: &str, value: &str) -> Result<Option<String>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.unique.get(&unique_key(collection, field, value)).cloned())
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let store = MemoryStore::new();
        store.put("services", "a", &json!({"id": "a"})).await.unwrap();
        assert_eq!(store.count("services").await.unwrap(), 1);
        assert_eq!(store.get("services", "a").await.unwrap(), Some(json!({"id": "a"})));
        assert!(store.delete("services", "a").await.unwrap());
        assert!(!store.delete("services", "a").await.unwrap());
        assert!(store.scan("services").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unique_claims_are_owned() {
        let store = MemoryStore::new();
        assert_eq!(store.claim_unique("services", "slug", "advisory", "a").await.unwrap(), None);
        assert_eq!(store.claim_unique("services", "slug", "advisory", "a").await.unwrap(), None);
        assert_eq!(
            store.claim_unique("services", "slug", "Advisory", "b").await.unwrap(),
            Some("a".to_string())
        );
        store.release_unique("services", "slug", "advisory", "b").await.unwrap();
        assert_eq!(
            store.lookup_unique("services", "slug", "advisory").await.unwrap(),
            Some("a".to_string())
        );
        store.release_unique("services", "slug", "advisory", "a").await.unwrap();
        assert_eq!(store.lookup_unique("services", "slug", "advisory").await.unwrap(), None);
    }
}

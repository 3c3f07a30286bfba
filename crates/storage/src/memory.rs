// Path: crates/storage/src/memory.rs
use async_trait::async_trait;
use flora_api::storage::{Document, DocumentStore};
use flora_telemetry::storage_metrics;
use flora_types::error::StoreError;
use parking_lot::RwLock;
use std::collections::BTreeMap;

type Collections = BTreeMap<String, BTreeMap<String, Document>>;

/// A process-local document store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        storage_metrics().inc_document_reads(collection);
        let guard = self.collections.read();
        Ok(guard.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError> {
        storage_metrics().inc_document_writes(collection);
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        storage_metrics().inc_document_writes(collection);
        if let Some(c) = self.collections.write().get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError> {
        storage_metrics().inc_document_reads(collection);
        let guard = self.collections.read();
        Ok(guard
            .get(collection)
            .map(|c| c.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn set_replaces_whole_document() {
        let store = MemoryDocumentStore::new();
        store
            .set("parameters", "parameters", doc(json!({"a": 1, "b": 2})))
            .await
            .unwrap();
        store
            .set("parameters", "parameters", doc(json!({"c": 3})))
            .await
            .unwrap();
        let got = store.get("parameters", "parameters").await.unwrap().unwrap();
        assert_eq!(serde_json::Value::Object(got), json!({"c": 3}));
    }

    #[tokio::test]
    async fn list_is_scoped_to_collection() {
        let store = MemoryDocumentStore::new();
        store.set("users", "b", doc(json!({"n": 2}))).await.unwrap();
        store.set("users", "a", doc(json!({"n": 1}))).await.unwrap();
        store.set("tokens", "x", doc(json!({}))).await.unwrap();

        let users = store.list("users").await.unwrap();
        let ids: Vec<_> = users.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(store.list("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_absent_is_ok() {
        let store = MemoryDocumentStore::new();
        store.delete("users", "nobody").await.unwrap();
        assert!(store.get("users", "nobody").await.unwrap().is_none());
    }
}

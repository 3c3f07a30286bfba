// Path: crates/api/src/storage/mod.rs

//! API for a collection/document key-value store.
//!
//! The store is deliberately minimal: whole documents are read and written,
//! there are no partial updates, transactions or version tokens. Callers that
//! read-modify-write a document race with each other.

use async_trait::async_trait;
use crate::error::StoreError;

/// A document is a JSON object keyed by field name.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A store of JSON documents grouped into named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Fetches a document. Returns `Ok(None)` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Writes a document, replacing any previous contents entirely.
    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError>;

    /// Removes a document. Removing an absent document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Lists every document of a collection, ordered by id.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError>;
}

/// Builds the flat key used by backends that store all collections in one table.
pub fn document_key(collection: &str, id: &str) -> String {
    format!("{collection}/{id}")
}

/// Returns the key prefix shared by every document of `collection`.
pub fn collection_prefix(collection: &str) -> String {
    format!("{collection}/")
}

// Path: crates/storage/src/redb_store.rs
use async_trait::async_trait;
use flora_api::storage::{collection_prefix, document_key, Document, DocumentStore};
use flora_telemetry::storage_metrics;
use flora_types::error::StoreError;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

/// ---- Table definitions ----
/// key = "collection/id", value = JSON-encoded document
const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("DOCUMENTS");

fn backend<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn decode(bytes: &[u8]) -> Result<Document, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

/// A durable document store backed by a single redb file.
///
/// Every write is its own redb transaction. There is no multi-document
/// transaction and no compare-and-swap on top of it.
#[derive(Clone)]
pub struct RedbDocumentStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbDocumentStore").finish_non_exhaustive()
    }
}

impl RedbDocumentStore {
    /// Opens (or creates) the database file, creating parent directories and
    /// the documents table as needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db_path = path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(backend)?;
            }
        }
        let db = Database::create(db_path).map_err(backend)?;

        // Ensure the table exists so read transactions never see TableDoesNotExist.
        {
            let w = db.begin_write().map_err(backend)?;
            w.open_table(DOCUMENTS).map_err(backend)?;
            w.commit().map_err(backend)?;
        }
        tracing::info!(target: "storage", path = %db_path.display(), "opened redb document store");
        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl DocumentStore for RedbDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        storage_metrics().inc_document_reads(collection);
        let key = document_key(collection, id);
        let r = self.db.begin_read().map_err(backend)?;
        let table = r.open_table(DOCUMENTS).map_err(backend)?;
        let doc = match table.get(key.as_str()).map_err(backend)? {
            Some(guard) => Some(decode(guard.value())?),
            None => None,
        };
        Ok(doc)
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError> {
        let key = document_key(collection, id);
        let bytes = serde_json::to_vec(&doc).map_err(|e| StoreError::Encode(e.to_string()))?;
        let write_res = (|| -> Result<(), redb::Error> {
            let w = self.db.begin_write()?;
            {
                let mut table = w.open_table(DOCUMENTS)?;
                table.insert(key.as_str(), bytes.as_slice())?;
            }
            w.commit()?;
            Ok(())
        })();
        write_res.map_err(backend)?;
        storage_metrics().inc_document_writes(collection);
        storage_metrics().inc_bytes_written_total(bytes.len() as u64);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let key = document_key(collection, id);
        let write_res = (|| -> Result<(), redb::Error> {
            let w = self.db.begin_write()?;
            {
                let mut table = w.open_table(DOCUMENTS)?;
                table.remove(key.as_str())?;
            }
            w.commit()?;
            Ok(())
        })();
        write_res.map_err(backend)?;
        storage_metrics().inc_document_writes(collection);
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>, StoreError> {
        storage_metrics().inc_document_reads(collection);
        let prefix = collection_prefix(collection);
        let r = self.db.begin_read().map_err(backend)?;
        let table = r.open_table(DOCUMENTS).map_err(backend)?;
        let mut out = Vec::new();
        for entry in table.range(prefix.as_str()..).map_err(backend)? {
            let (k, v) = entry.map_err(backend)?;
            let Some(id) = k.value().strip_prefix(prefix.as_str()) else {
                break;
            };
            out.push((id.to_string(), decode(v.value())?));
        }
        Ok(out)
    }
}

// Path: crates/test_utils/src/backend/mod.rs

//! A backend client that never touches the filesystem.

use flora_storage::{BackendClient, MemoryDocumentStore, StoreIdentityProvider};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_PROJECT_ID: &str = "flora-test";

/// A fresh in-memory store and identity provider, tokens valid for an hour.
pub fn memory_backend() -> Arc<BackendClient> {
    let store = Arc::new(MemoryDocumentStore::new());
    let identity = Arc::new(StoreIdentityProvider::new(
        store.clone(),
        Duration::from_secs(3600),
    ));
    Arc::new(BackendClient::from_parts(TEST_PROJECT_ID, store, identity))
}

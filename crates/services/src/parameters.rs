// Path: crates/services/src/parameters.rs

//! Read-modify-write access to the single parameters document.
//!
//! Every mutation fetches the whole document, edits it in memory and writes
//! it back in full. There is no version check between the read and the
//! write, so two concurrent writers can lose one another's keys.

use flora_api::storage::DocumentStore;
use flora_types::error::ServiceError;
use flora_types::parameters::{ParameterMap, PARAMETERS_COLLECTION, PARAMETERS_DOCUMENT};
use flora_types::Result;
use std::sync::Arc;

pub const NOT_FOUND_DETAIL: &str = "Parameters document not found in Firestore";
pub const UPDATED_MESSAGE: &str = "Parameters updated successfully";
pub const DELETED_MESSAGE: &str = "Parameters deleted successfully";

/// How an add request was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Created,
    Merged,
}

impl AddOutcome {
    pub fn message(self) -> &'static str {
        match self {
            AddOutcome::Created => "New parameters document created successfully",
            AddOutcome::Merged => "Parameters merged successfully",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteResult {
    /// The keys the caller asked to remove, including ones that were absent.
    pub deleted: Vec<String>,
    pub remaining: ParameterMap,
}

/// Shallow merge: every incoming key overwrites the current value.
pub fn merge(current: ParameterMap, incoming: ParameterMap) -> ParameterMap {
    let mut merged = current;
    for (key, value) in incoming {
        merged.insert(key, value);
    }
    merged
}

#[derive(Debug, Clone)]
pub struct ParametersStore {
    store: Arc<dyn DocumentStore>,
}

impl ParametersStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn fetch(&self) -> Result<Option<ParameterMap>> {
        Ok(self
            .store
            .get(PARAMETERS_COLLECTION, PARAMETERS_DOCUMENT)
            .await?)
    }

    async fn persist(&self, parameters: &ParameterMap) -> Result<()> {
        self.store
            .set(PARAMETERS_COLLECTION, PARAMETERS_DOCUMENT, parameters.clone())
            .await?;
        Ok(())
    }

    pub async fn retrieve(&self) -> Result<ParameterMap> {
        self.fetch()
            .await?
            .ok_or_else(|| ServiceError::NotFound(NOT_FOUND_DETAIL.into()))
    }

    /// Merges into the document, creating it when absent.
    pub async fn add(&self, incoming: ParameterMap) -> Result<(AddOutcome, ParameterMap)> {
        let (outcome, merged) = match self.fetch().await? {
            Some(current) => (AddOutcome::Merged, merge(current, incoming)),
            None => (AddOutcome::Created, incoming),
        };
        self.persist(&merged).await?;
        tracing::info!(
            target: "parameters",
            outcome = ?outcome,
            keys = merged.len(),
            "parameters document written"
        );
        Ok((outcome, merged))
    }

    /// Merges into an existing document. Fails with `NotFound` when absent.
    pub async fn update(&self, incoming: ParameterMap) -> Result<ParameterMap> {
        let current = self.retrieve().await?;
        let merged = merge(current, incoming);
        self.persist(&merged).await?;
        tracing::info!(target: "parameters", keys = merged.len(), "parameters document updated");
        Ok(merged)
    }

    /// Removes the listed keys. Keys that are not present are skipped.
    pub async fn delete_keys(&self, keys: Vec<String>) -> Result<DeleteResult> {
        let mut remaining = self.retrieve().await?;
        for key in &keys {
            remaining.shift_remove(key);
        }
        self.persist(&remaining).await?;
        tracing::info!(
            target: "parameters",
            requested = keys.len(),
            remaining = remaining.len(),
            "parameters deleted"
        );
        Ok(DeleteResult {
            deleted: keys,
            remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flora_storage::MemoryDocumentStore;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn params(v: Value) -> ParameterMap {
        v.as_object().cloned().unwrap()
    }

    fn store() -> ParametersStore {
        ParametersStore::new(Arc::new(MemoryDocumentStore::new()))
    }

    #[tokio::test]
    async fn add_creates_then_merges() {
        let p = store();
        let (outcome, doc) = p.add(params(json!({"a": 1}))).await.unwrap();
        assert_eq!(outcome, AddOutcome::Created);
        assert_eq!(Value::Object(doc), json!({"a": 1}));

        let (outcome, doc) = p.add(params(json!({"b": 2}))).await.unwrap();
        assert_eq!(outcome, AddOutcome::Merged);
        assert_eq!(Value::Object(doc), json!({"a": 1, "b": 2}));

        let (_, doc) = p.add(params(json!({"a": 2}))).await.unwrap();
        assert_eq!(Value::Object(doc), json!({"a": 2, "b": 2}));
        assert_eq!(
            Value::Object(p.retrieve().await.unwrap()),
            json!({"a": 2, "b": 2})
        );
    }

    #[tokio::test]
    async fn update_and_delete_require_document() {
        let p = store();
        let not_found = ServiceError::NotFound(NOT_FOUND_DETAIL.into());
        assert_eq!(p.retrieve().await.unwrap_err(), not_found);
        assert_eq!(
            p.update(params(json!({"a": 1}))).await.unwrap_err(),
            not_found
        );
        assert_eq!(
            p.delete_keys(vec!["a".into()]).await.unwrap_err(),
            not_found
        );
    }

    #[tokio::test]
    async fn delete_ignores_absent_keys() {
        let p = store();
        p.add(params(json!({"n_estimators": 100, "criterion": "gini"})))
            .await
            .unwrap();
        let result = p
            .delete_keys(vec!["criterion".into(), "missing".into()])
            .await
            .unwrap();
        assert_eq!(result.deleted, vec!["criterion", "missing"]);
        assert_eq!(
            Value::Object(result.remaining),
            json!({"n_estimators": 100})
        );

        let updated = p.update(params(json!({"max_depth": 3}))).await.unwrap();
        assert_eq!(
            Value::Object(updated),
            json!({"n_estimators": 100, "max_depth": 3})
        );
    }

    #[tokio::test]
    async fn delete_keeps_remaining_key_order() {
        let p = store();
        p.add(params(json!({"a": 1, "b": 2, "c": 3, "d": 4})))
            .await
            .unwrap();
        let result = p.delete_keys(vec!["a".into()]).await.unwrap();
        let order: Vec<_> = result.remaining.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["b", "c", "d"]);

        let stored = p.retrieve().await.unwrap();
        let order: Vec<_> = stored.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["b", "c", "d"]);
    }

    fn small_map() -> impl Strategy<Value = ParameterMap> {
        prop::collection::btree_map("[a-d]", 0i64..5, 0..4).prop_map(|m| {
            m.into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn incoming_always_wins(current in small_map(), incoming in small_map()) {
            let merged = merge(current.clone(), incoming.clone());
            for (k, v) in &incoming {
                prop_assert_eq!(merged.get(k), Some(v));
            }
            for (k, v) in &current {
                if !incoming.contains_key(k) {
                    prop_assert_eq!(merged.get(k), Some(v));
                }
            }
            prop_assert!(merged.len() <= current.len() + incoming.len());
        }

        #[test]
        fn disjoint_merges_commute(a in small_map(), b in small_map()) {
            let b: ParameterMap = b.into_iter().filter(|(k, _)| !a.contains_key(k)).collect();
            let ab = merge(a.clone(), b.clone());
            let ba = merge(b, a);
            prop_assert_eq!(Value::Object(ab), Value::Object(ba));
        }
    }
}

//! In-memory event store.
//!
//! Map-backed [`EventStore`] used for local development runs without a
//! main application, and as the recording double in the test suites. Calls
//! are logged to an operation journal in completion order, which the
//! ordering tests rely on.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{EventStore, StoreError};

type EntryKey = (String, String, String);

/// One cached resource.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fields: Value,
    pub ttl_hours: u32,
}

/// A store call, recorded in the order it completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Upsert {
        grant_id: String,
        resource_type: String,
        resource_id: String,
    },
    Delete {
        grant_id: String,
        resource_type: String,
        resource_id: String,
    },
}

/// In-process event store.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<EntryKey, CacheEntry>>,
    ops: RwLock<Vec<StoreOp>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for a key, if present.
    pub async fn get(
        &self,
        grant_id: &str,
        resource_type: &str,
        resource_id: &str,
    ) -> Option<CacheEntry> {
        let key = (
            grant_id.to_string(),
            resource_type.to_string(),
            resource_id.to_string(),
        );
        self.entries.read().await.get(&key).cloned()
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// All recorded operations, in completion order.
    pub async fn operations(&self) -> Vec<StoreOp> {
        self.ops.read().await.clone()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn upsert_event(
        &self,
        grant_id: &str,
        resource_type: &str,
        resource_id: &str,
        fields: &Value,
        ttl_hours: u32,
    ) -> Result<(), StoreError> {
        let key = (
            grant_id.to_string(),
            resource_type.to_string(),
            resource_id.to_string(),
        );

        self.entries.write().await.insert(
            key,
            CacheEntry {
                fields: fields.clone(),
                ttl_hours,
            },
        );
        self.ops.write().await.push(StoreOp::Upsert {
            grant_id: grant_id.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
        });

        Ok(())
    }

    async fn delete_event(
        &self,
        grant_id: &str,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<(), StoreError> {
        let key = (
            grant_id.to_string(),
            resource_type.to_string(),
            resource_id.to_string(),
        );

        self.entries.write().await.remove(&key);
        self.ops.write().await.push(StoreOp::Delete {
            grant_id: grant_id.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_upsert_then_get() {
        let store = MemoryStore::new();
        store
            .upsert_event("g1", "message", "m1", &json!({"id": "m1"}), 24)
            .await
            .unwrap();

        let entry = store.get("g1", "message", "m1").await.unwrap();
        assert_eq!(entry.fields, json!({"id": "m1"}));
        assert_eq!(entry.ttl_hours, 24);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let store = MemoryStore::new();
        store
            .upsert_event("g1", "contact", "c1", &json!({"id": "c1"}), 24)
            .await
            .unwrap();
        store.delete_event("g1", "contact", "c1").await.unwrap();

        assert!(store.get("g1", "contact", "c1").await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_absent_entry_is_ok() {
        let store = MemoryStore::new();
        store.delete_event("g1", "event", "missing").await.unwrap();
        assert_eq!(
            store.operations().await,
            vec![StoreOp::Delete {
                grant_id: "g1".to_string(),
                resource_type: "event".to_string(),
                resource_id: "missing".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_operations_record_order() {
        let store = MemoryStore::new();
        store
            .upsert_event("g1", "event", "e1", &json!({}), 24)
            .await
            .unwrap();
        store.delete_event("g1", "event", "e1").await.unwrap();

        let ops = store.operations().await;
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], StoreOp::Upsert { .. }));
        assert!(matches!(ops[1], StoreOp::Delete { .. }));
    }
}

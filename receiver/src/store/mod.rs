//! Event cache store collaborators.
//!
//! The receiver does not own any persistence. Every delta is translated
//! into an upsert or delete against the main application's event cache,
//! reached through the [`EventStore`] trait:
//!
//! ```text
//! Batch Processor → EventStore → main app cache (HTTP) | in-memory map
//! ```

pub mod http;
pub mod memory;

pub use http::HttpEventStore;
pub use memory::{CacheEntry, MemoryStore, StoreOp};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from an event store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure reaching the backend.
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("store rejected {operation} of {resource_type}/{resource_id}: status {status}")]
    Rejected {
        operation: &'static str,
        resource_type: String,
        resource_id: String,
        status: u16,
    },

    /// The backend is not able to serve requests.
    #[error("{0}")]
    Unavailable(String),
}

/// Write interface of the main application's event cache.
///
/// Entries are keyed by (grant, resource type, resource id). The cache's
/// own concurrency discipline is the backend's concern; callers only rely
/// on each call completing independently.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Create or replace a cached resource.
    async fn upsert_event(
        &self,
        grant_id: &str,
        resource_type: &str,
        resource_id: &str,
        fields: &Value,
        ttl_hours: u32,
    ) -> Result<(), StoreError>;

    /// Remove a cached resource. Removing an absent entry is not an error.
    async fn delete_event(
        &self,
        grant_id: &str,
        resource_type: &str,
        resource_id: &str,
    ) -> Result<(), StoreError>;
}

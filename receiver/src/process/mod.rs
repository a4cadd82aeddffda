//! Batch event processing.
//!
//! The processor consumes one validated [`WebhookPayload`] per request and
//! produces a [`ProcessingResult`]. The central property is per-delta
//! isolation: a handler failure is recorded and counted, never allowed to
//! abort the rest of the batch.
//!
//! ## Concurrency
//!
//! Deltas are grouped by the resource they touch. Groups run concurrently
//! and are joined with a settle-all combinator; deltas inside one group
//! run sequentially in delivery order, so a create followed by a delete of
//! the same resource in one batch is applied in that order. Each task
//! returns its own outcome value and a single pass after the join merges
//! them, so no counters are shared across tasks.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::event::{WebhookDelta, WebhookPayload};
use crate::store::EventStore;

use handlers::handle_delta;

/// Outcome report for one batch.
///
/// `processed + failed` always equals the number of deltas in the batch;
/// every delta yields exactly one outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    /// Deltas whose handler completed (including unrecognized types).
    pub processed: usize,
    /// Deltas whose handler failed.
    pub failed: usize,
    /// One entry per failed delta, in the order failures were observed.
    pub errors: Vec<DeltaError>,
    /// Wall-clock time from batch entry to aggregation, in milliseconds.
    pub duration_ms: u64,
}

/// One failed delta.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaError {
    /// Provider event id.
    pub id: String,
    /// Wire event-type string.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Message from the underlying handler failure.
    pub message: String,
}

/// Per-delta outcome, returned from each task and merged after the join.
struct DeltaOutcome {
    id: String,
    event_type: String,
    error: Option<String>,
}

/// Processes webhook batches against an event store.
pub struct BatchProcessor {
    store: Arc<dyn EventStore>,
    ttl_hours: u32,
}

impl BatchProcessor {
    pub fn new(store: Arc<dyn EventStore>, ttl_hours: u32) -> Self {
        Self { store, ttl_hours }
    }

    /// Process every delta in the payload and aggregate the outcomes.
    pub async fn process_batch(&self, payload: &WebhookPayload) -> ProcessingResult {
        let started = Instant::now();

        info!(deltas = payload.deltas.len(), "batch_process_start");

        let groups = group_by_resource(&payload.deltas);
        let outcomes = join_all(groups.into_iter().map(|group| self.process_group(group))).await;

        let mut processed = 0usize;
        let mut failed = 0usize;
        let mut errors = Vec::new();

        for outcome in outcomes.into_iter().flatten() {
            match outcome.error {
                None => processed += 1,
                Some(message) => {
                    failed += 1;
                    errors.push(DeltaError {
                        id: outcome.id,
                        event_type: outcome.event_type,
                        message,
                    });
                }
            }
        }

        let duration_ms = started.elapsed().as_millis() as u64;

        info!(
            processed = processed,
            failed = failed,
            duration_ms = duration_ms,
            "batch_process_complete"
        );

        ProcessingResult {
            processed,
            failed,
            errors,
            duration_ms,
        }
    }

    /// Process one resource group's deltas in delivery order.
    async fn process_group(&self, group: Vec<&WebhookDelta>) -> Vec<DeltaOutcome> {
        let mut outcomes = Vec::with_capacity(group.len());
        for delta in group {
            outcomes.push(self.process_one(delta).await);
        }
        outcomes
    }

    async fn process_one(&self, delta: &WebhookDelta) -> DeltaOutcome {
        match handle_delta(self.store.as_ref(), delta, self.ttl_hours).await {
            Ok(disposition) => {
                info!(
                    delta_id = %delta.id,
                    event_type = %delta.event_type,
                    disposition = ?disposition,
                    "delta_processed"
                );
                DeltaOutcome {
                    id: delta.id.clone(),
                    event_type: delta.event_type.clone(),
                    error: None,
                }
            }
            Err(e) => {
                warn!(
                    delta_id = %delta.id,
                    event_type = %delta.event_type,
                    error = %e,
                    "delta_failed"
                );
                DeltaOutcome {
                    id: delta.id.clone(),
                    event_type: delta.event_type.clone(),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Group deltas by the resource they touch, preserving delivery order
/// inside each group. Deltas with no resolvable resource id each form
/// their own group keyed by batch position.
fn group_by_resource(deltas: &[WebhookDelta]) -> Vec<Vec<&WebhookDelta>> {
    let mut groups: Vec<Vec<&WebhookDelta>> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for (position, delta) in deltas.iter().enumerate() {
        let grant = delta.data.grant_id.clone().unwrap_or_default();
        let key = match delta.data.resource_id() {
            Some(id) => (grant, id.to_string()),
            None => (grant, format!("#{position}")),
        };

        match index.get(&key) {
            Some(&slot) => groups[slot].push(delta),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![delta]);
            }
        }
    }

    groups
}

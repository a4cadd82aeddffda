//! Per-delta handlers.
//!
//! Each handler translates one webhook delta into a cache write on the
//! event store: created/updated upsert the resource, deleted (and expired,
//! for grants) removes it. Handlers never touch deltas other than their
//! own; isolation between deltas is the processor's job.

use thiserror::Error;
use tracing::{info, warn};

use crate::event::{Change, DeltaKind, GrantChange, WebhookDelta};
use crate::store::{EventStore, StoreError};

/// Failure applying a single delta.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("delta has no grant_id")]
    MissingGrantId,

    #[error("resource object has no id")]
    MissingResourceId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What became of a delta that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The store was updated.
    Applied,
    /// Unrecognized event type; logged and skipped.
    Ignored,
}

/// Route one delta to its handler.
pub async fn handle_delta(
    store: &dyn EventStore,
    delta: &WebhookDelta,
    ttl_hours: u32,
) -> Result<Disposition, HandlerError> {
    match delta.kind() {
        DeltaKind::Calendar(change) => {
            apply_resource_change(store, delta, "calendar", change, ttl_hours).await?
        }
        DeltaKind::CalendarEvent(change) => {
            apply_resource_change(store, delta, "event", change, ttl_hours).await?
        }
        DeltaKind::Message(change) => {
            apply_resource_change(store, delta, "message", change, ttl_hours).await?
        }
        DeltaKind::Contact(change) => {
            apply_resource_change(store, delta, "contact", change, ttl_hours).await?
        }
        DeltaKind::Grant(change) => apply_grant_change(store, delta, change, ttl_hours).await?,
        DeltaKind::Unknown => {
            warn!(
                delta_id = %delta.id,
                event_type = %delta.event_type,
                "delta_unhandled"
            );
            return Ok(Disposition::Ignored);
        }
    }

    Ok(Disposition::Applied)
}

/// Apply a calendar/event/message/contact change to the cache.
async fn apply_resource_change(
    store: &dyn EventStore,
    delta: &WebhookDelta,
    resource_type: &'static str,
    change: Change,
    ttl_hours: u32,
) -> Result<(), HandlerError> {
    let grant_id = delta
        .data
        .grant_id
        .as_deref()
        .ok_or(HandlerError::MissingGrantId)?;
    let resource_id = delta
        .data
        .resource_id()
        .ok_or(HandlerError::MissingResourceId)?;

    match change {
        Change::Created | Change::Updated => {
            store
                .upsert_event(grant_id, resource_type, resource_id, &delta.data.object, ttl_hours)
                .await?;
        }
        Change::Deleted => {
            store.delete_event(grant_id, resource_type, resource_id).await?;
        }
    }

    info!(
        grant_id = grant_id,
        resource_type = resource_type,
        resource_id = resource_id,
        change = ?change,
        "delta_applied"
    );

    Ok(())
}

/// Apply a grant lifecycle change.
///
/// Grant events describe the connection itself, so the grant id doubles as
/// the resource id. Expiry removes the cached grant the same way an
/// explicit delete does.
async fn apply_grant_change(
    store: &dyn EventStore,
    delta: &WebhookDelta,
    change: GrantChange,
    ttl_hours: u32,
) -> Result<(), HandlerError> {
    let grant_id = delta
        .data
        .grant_id
        .as_deref()
        .or_else(|| delta.data.resource_id())
        .ok_or(HandlerError::MissingGrantId)?;

    match change {
        GrantChange::Created | GrantChange::Updated => {
            store
                .upsert_event(grant_id, "grant", grant_id, &delta.data.object, ttl_hours)
                .await?;
        }
        GrantChange::Deleted | GrantChange::Expired => {
            store.delete_event(grant_id, "grant", grant_id).await?;
        }
    }

    info!(grant_id = grant_id, change = ?change, "grant_delta_applied");

    Ok(())
}

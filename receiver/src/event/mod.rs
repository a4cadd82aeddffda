//! Provider event types.
//!
//! Wire types for the webhook envelope the sync provider delivers, plus
//! the parsed event-kind table used for handler dispatch.

pub mod types;

pub use types::{Change, DeltaData, DeltaKind, GrantChange, WebhookDelta, WebhookPayload};

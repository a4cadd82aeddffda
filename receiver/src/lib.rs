//! GrantSync webhook receiver.
//!
//! A thin, fast HTTP service that receives sync webhooks from Nylas
//! (calendar, event, message, contact, and grant changes), verifies their
//! HMAC signatures, and mirrors each change into the main application's
//! event cache.
//!
//! ## Architecture
//!
//! ```text
//! Provider → POST /webhooks → Signature Verifier → Batch Processor → Event Cache
//! ```
//!
//! Each delivery is fully processed within its request: the batch of
//! deltas fans out to per-type handlers with per-item failure isolation,
//! and the aggregated report goes back in the response body.

pub mod config;
pub mod event;
pub mod process;
pub mod store;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use event::{DeltaData, DeltaKind, WebhookDelta, WebhookPayload};
pub use process::{BatchProcessor, DeltaError, ProcessingResult};
pub use store::{EventStore, HttpEventStore, MemoryStore, StoreError};
pub use web::AppState;

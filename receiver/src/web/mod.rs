//! Web server module for handling inbound webhooks.
//!
//! This module provides a thin, fast web server that:
//! - Receives webhook deliveries from the sync provider
//! - Verifies the HMAC signature over the raw body
//! - Runs the delta batch through the processor within the request
//! - Answers with the aggregated batch report

pub mod handlers;
pub mod signature;

pub use handlers::{
    health, receive_webhook, test_webhook, verify_challenge, AppState, ChallengeResponse,
    HealthResponse, WebhookAck, WebhookErrorResponse,
};
pub use signature::{verify_webhook_signature, SIGNATURE_HEADER};

use axum::{
    routing::{get, post},
    Router,
};

/// Build the service router. The synthetic test route is mounted only
/// outside production.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/webhooks/verify", get(verify_challenge))
        .route("/webhooks", post(receive_webhook));

    if !state.config.is_production() {
        router = router.route("/webhooks/test", post(test_webhook));
    }

    router.with_state(state)
}

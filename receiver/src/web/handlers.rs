//! Webhook endpoint handlers.
//!
//! The webhook endpoint takes the body as raw bytes so the signature is
//! computed over the exact bytes received; JSON parsing happens only after
//! the delivery is authenticated. Per-delta failures are reported in the
//! response body under a 200, so the provider only redelivers on
//! pipeline-level failures.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::event::{DeltaData, WebhookDelta, WebhookPayload};
use crate::process::{BatchProcessor, DeltaError, ProcessingResult};
use crate::web::signature::{verify_webhook_signature, SIGNATURE_HEADER};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub processor: Arc<BatchProcessor>,
}

impl AppState {
    pub fn new(config: Config, processor: BatchProcessor) -> Self {
        Self {
            config: Arc::new(config),
            processor: Arc::new(processor),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Subscription Challenge
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChallengeParams {
    #[serde(default)]
    pub challenge: Option<String>,
}

#[derive(Serialize)]
pub struct ChallengeResponse {
    pub challenge: String,
}

/// Subscription handshake endpoint.
///
/// During webhook setup the provider sends a challenge token and expects
/// it echoed back verbatim.
pub async fn verify_challenge(Query(params): Query<ChallengeParams>) -> impl IntoResponse {
    match params.challenge {
        Some(challenge) if !challenge.is_empty() => {
            info!(challenge_length = challenge.len(), "webhook_challenge_received");
            (StatusCode::OK, Json(ChallengeResponse { challenge })).into_response()
        }
        _ => {
            warn!("webhook_challenge_missing");
            (
                StatusCode::BAD_REQUEST,
                Json(WebhookErrorResponse {
                    success: false,
                    error: "Missing challenge parameter",
                }),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Webhook Delivery
// =============================================================================

/// Error response for rejected deliveries.
#[derive(Serialize)]
pub struct WebhookErrorResponse {
    pub success: bool,
    pub error: &'static str,
}

/// Aggregated batch report returned to the provider.
#[derive(Serialize)]
pub struct WebhookAck {
    pub success: bool,
    pub processed: usize,
    pub failed: usize,
    pub errors: Vec<DeltaError>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl WebhookAck {
    fn from_result(result: ProcessingResult) -> Self {
        Self {
            success: true,
            processed: result.processed,
            failed: result.failed,
            errors: result.errors,
            duration_ms: result.duration_ms,
            timestamp: Utc::now(),
        }
    }
}

/// Webhook delivery endpoint.
///
/// This endpoint:
/// 1. Verifies the HMAC signature over the raw body
/// 2. Parses the delta envelope
/// 3. Processes the batch and returns the aggregated report
///
/// Partial failures still answer 200; only an unauthenticated delivery
/// (401) or an envelope that does not parse (400) rejects the request.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let secret = state.config.webhook_secret.as_deref().unwrap_or("");

    if !verify_webhook_signature(secret, &body, signature) {
        warn!(
            body_length = body.len(),
            has_signature = signature.is_some(),
            "webhook_rejected"
        );
        return (
            StatusCode::UNAUTHORIZED,
            Json(WebhookErrorResponse {
                success: false,
                error: "Invalid webhook signature",
            }),
        )
            .into_response();
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(
                error = %e,
                body_length = body.len(),
                "webhook_payload_invalid"
            );
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookErrorResponse {
                    success: false,
                    error: "Invalid webhook payload",
                }),
            )
                .into_response();
        }
    };

    info!(deltas = payload.deltas.len(), "webhook_received");

    let result = state.processor.process_batch(&payload).await;

    (StatusCode::OK, Json(WebhookAck::from_result(result))).into_response()
}

// =============================================================================
// Test Delivery (non-production)
// =============================================================================

/// Synthetic delivery endpoint, mounted only outside production.
///
/// Bypasses the signature check and runs a single synthetic message delta
/// through the real processor.
pub async fn test_webhook(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now();
    let payload = WebhookPayload {
        deltas: vec![WebhookDelta {
            id: format!("test-{}", now.timestamp_millis()),
            event_type: "message.created".to_string(),
            specversion: None,
            source: None,
            time: Some(now.to_rfc3339()),
            data: DeltaData {
                object: serde_json::json!({
                    "id": "test-message",
                    "subject": "Synthetic test delivery",
                }),
                grant_id: Some("test-grant".to_string()),
                application_id: None,
            },
        }],
    };

    info!("webhook_test_delivery");

    let result = state.processor.process_batch(&payload).await;

    (StatusCode::OK, Json(WebhookAck::from_result(result)))
}

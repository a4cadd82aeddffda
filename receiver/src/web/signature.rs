//! Nylas webhook signature verification.
//!
//! Nylas signs webhook requests using HMAC-SHA256 over the raw request
//! body and sends the hex digest in the `X-Nylas-Signature` header.
//! Reference: https://developer.nylas.com/docs/v3/notifications/webhooks/

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC digest.
pub const SIGNATURE_HEADER: &str = "x-nylas-signature";

/// Verify a webhook delivery signature.
///
/// The digest is computed over the exact bytes of the request body. The
/// caller must pass the body as received, before any parsing.
///
/// # Arguments
///
/// * `secret` - The shared webhook secret
/// * `body` - Raw request body bytes
/// * `signature` - The signature header value, if one was sent
///
/// # Returns
///
/// `true` only when a secret is configured, a signature was sent, and the
/// digest matches. An unconfigured secret fails closed; the check never
/// degrades to "skip".
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: Option<&str>) -> bool {
    if secret.is_empty() {
        warn!("webhook_secret_not_configured");
        return false;
    }

    let signature = match signature {
        Some(s) if !s.is_empty() => s,
        _ => {
            warn!("webhook_signature_missing");
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("webhook_signature_invalid_key");
            return false;
        }
    };

    mac.update(body);
    let expected = hex::encode(mac.finalize().into_bytes());

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(&expected, signature);

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = signature.len(),
            "webhook_signature_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_verify_valid_signature() {
        let secret = "test-webhook-secret";
        let body = br#"{"deltas":[]}"#;
        let signature = sign(secret, body);

        assert!(verify_webhook_signature(secret, body, Some(&signature)));
    }

    #[test]
    fn test_verify_rejects_mutated_signature() {
        let secret = "test-webhook-secret";
        let body = br#"{"deltas":[]}"#;
        let mut signature = sign(secret, body);

        // flip the last hex digit
        let last = signature.pop().unwrap();
        signature.push(if last == '0' { '1' } else { '0' });

        assert!(!verify_webhook_signature(secret, body, Some(&signature)));
    }

    #[test]
    fn test_verify_rejects_signature_for_other_body() {
        let secret = "test-webhook-secret";
        let signature = sign(secret, br#"{"deltas":[]}"#);

        assert!(!verify_webhook_signature(
            secret,
            br#"{"deltas":[{}]}"#,
            Some(&signature)
        ));
    }

    #[test]
    fn test_verify_rejects_missing_signature() {
        assert!(!verify_webhook_signature("secret", b"body", None));
        assert!(!verify_webhook_signature("secret", b"body", Some("")));
    }

    #[test]
    fn test_verify_empty_secret_fails_closed() {
        let signature = sign("secret", b"body");
        assert!(!verify_webhook_signature("", b"body", Some(&signature)));
    }

    #[test]
    fn test_verify_rejects_truncated_signature() {
        let secret = "test-webhook-secret";
        let body = b"payload";
        let signature = sign(secret, body);

        assert!(!verify_webhook_signature(
            secret,
            body,
            Some(&signature[..signature.len() - 2])
        ));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}

//! Signed-delivery verification for identity provider webhooks.
//!
//! The provider signs each delivery with HMAC-SHA256 over
//! `"{id}.{timestamp}.{body}"` using a shared secret, and sends the result
//! base64-encoded in the signature header as a space-separated list of
//! `v1,<base64>` entries. Verification checks the timestamp against a
//! replay-protection window and compares signatures in constant time.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Tolerance window for delivery timestamps, in seconds.
///
/// Deliveries older or newer than this are rejected to limit replay.
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Optional prefix on the shared secret; the remainder is base64.
const SECRET_PREFIX: &str = "whsec_";

/// Scheme version prefix on each signature header entry.
const VERSION_PREFIX: &str = "v1,";

/// Result of signature validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// Whether the signature is valid.
    pub is_valid: bool,
    /// Error message if validation failed.
    pub error_message: Option<String>,
}

impl ValidationResult {
    /// Creates a successful validation result.
    pub fn valid() -> Self {
        Self { is_valid: true, error_message: None }
    }

    /// Creates a failed validation result with error message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self { is_valid: false, error_message: Some(message.into()) }
    }
}

/// Signature verification errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Shared secret is not valid base64 or decodes to an empty key.
    InvalidSecret,
    /// Signature header entry has an unsupported format.
    InvalidFormat(String),
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSecret => write!(f, "invalid signing secret"),
            Self::InvalidFormat(format) => write!(f, "invalid signature format: {format}"),
        }
    }
}

impl std::error::Error for SignatureError {}

/// Verifier for signed webhook deliveries.
///
/// Built once at startup from the shared secret; an undecodable secret is a
/// startup-time fatal condition.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    /// Creates a verifier from the shared secret.
    ///
    /// Accepts the secret with or without the `whsec_` prefix; the
    /// remainder must be base64.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::InvalidSecret` if the secret does not
    /// decode or decodes to an empty key.
    pub fn new(secret: &str) -> Result<Self, SignatureError> {
        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = BASE64.decode(encoded).map_err(|_| SignatureError::InvalidSecret)?;

        if key.is_empty() {
            return Err(SignatureError::InvalidSecret);
        }

        Ok(Self { key, tolerance_secs: TIMESTAMP_TOLERANCE_SECS })
    }

    /// Verifies a delivery against the current wall clock.
    pub fn verify(
        &self,
        delivery_id: &str,
        timestamp: &str,
        signature_header: &str,
        body: &[u8],
    ) -> ValidationResult {
        self.verify_at(delivery_id, timestamp, signature_header, body, chrono::Utc::now().timestamp())
    }

    /// Verifies a delivery against an explicit clock reading.
    ///
    /// Checks the timestamp tolerance window, computes the expected HMAC,
    /// and compares it against every `v1,<base64>` entry in the signature
    /// header. Any single match passes.
    pub fn verify_at(
        &self,
        delivery_id: &str,
        timestamp: &str,
        signature_header: &str,
        body: &[u8],
        now: i64,
    ) -> ValidationResult {
        let Ok(ts) = timestamp.trim().parse::<i64>() else {
            return ValidationResult::invalid("timestamp is not a unix epoch integer");
        };

        // abs_diff cannot overflow, unlike subtracting attacker-controlled
        // extreme timestamps.
        if now.abs_diff(ts) > self.tolerance_secs.unsigned_abs() {
            return ValidationResult::invalid("timestamp outside tolerance window");
        }

        let expected = match self.compute_signature(delivery_id, ts, body) {
            Ok(mac) => mac,
            Err(err) => return ValidationResult::invalid(err.to_string()),
        };

        let mut saw_versioned_entry = false;
        for entry in signature_header.split_whitespace() {
            let Some(encoded) = entry.strip_prefix(VERSION_PREFIX) else {
                // Entries for other scheme versions are ignored.
                continue;
            };
            saw_versioned_entry = true;

            if let Ok(candidate) = BASE64.decode(encoded) {
                if timing_safe_eq(&candidate, &expected) {
                    return ValidationResult::valid();
                }
            }
        }

        if saw_versioned_entry {
            ValidationResult::invalid("signature mismatch")
        } else {
            ValidationResult::invalid(
                SignatureError::InvalidFormat(format!(
                    "expected space-separated 'v1,<base64>' entries, got: {signature_header}"
                ))
                .to_string(),
            )
        }
    }

    /// Produces a `v1,<base64>` signature entry for a delivery.
    ///
    /// Counterpart of `verify`, used by tests and local tooling to construct
    /// signed deliveries.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::InvalidSecret` if the key is rejected by the
    /// MAC implementation.
    pub fn sign(&self, delivery_id: &str, timestamp: i64, body: &[u8]) -> Result<String, SignatureError> {
        let mac = self.compute_signature(delivery_id, timestamp, body)?;
        Ok(format!("{VERSION_PREFIX}{}", BASE64.encode(mac)))
    }

    /// Computes the raw HMAC-SHA256 over the signed content.
    fn compute_signature(
        &self,
        delivery_id: &str,
        timestamp: i64,
        body: &[u8],
    ) -> Result<Vec<u8>, SignatureError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| SignatureError::InvalidSecret)?;

        mac.update(delivery_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);

        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Timing-safe byte comparison to prevent timing attacks.
fn timing_safe_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (a_byte, b_byte) in a.iter().zip(b.iter()) {
        result |= a_byte ^ b_byte;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_verifier() -> WebhookVerifier {
        let secret = format!("whsec_{}", BASE64.encode(b"unit-test-signing-key"));
        WebhookVerifier::new(&secret).unwrap()
    }

    #[test]
    fn signed_delivery_verifies() {
        let verifier = test_verifier();
        let body = br#"{"type":"user.created","data":{"id":"user_1"}}"#;
        let now = 1_700_000_000;

        let signature = verifier.sign("msg_1", now, body).unwrap();
        let result = verifier.verify_at("msg_1", &now.to_string(), &signature, body, now);

        assert!(result.is_valid);
        assert!(result.error_message.is_none());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let verifier = test_verifier();
        let now = 1_700_000_000;

        let signature = verifier.sign("msg_1", now, b"original payload").unwrap();
        let result =
            verifier.verify_at("msg_1", &now.to_string(), &signature, b"tampered payload", now);

        assert!(!result.is_valid);
        assert_eq!(result.error_message.unwrap(), "signature mismatch");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let verifier = test_verifier();
        let other = WebhookVerifier::new(&format!("whsec_{}", BASE64.encode(b"another-key"))).unwrap();
        let now = 1_700_000_000;

        let signature = other.sign("msg_1", now, b"payload").unwrap();
        let result = verifier.verify_at("msg_1", &now.to_string(), &signature, b"payload", now);

        assert!(!result.is_valid);
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let verifier = test_verifier();
        let now = 1_700_000_000;
        let stale = now - TIMESTAMP_TOLERANCE_SECS - 1;

        let signature = verifier.sign("msg_1", stale, b"payload").unwrap();
        let result = verifier.verify_at("msg_1", &stale.to_string(), &signature, b"payload", now);

        assert!(!result.is_valid);
        assert_eq!(result.error_message.unwrap(), "timestamp outside tolerance window");
    }

    #[test]
    fn future_timestamp_is_rejected() {
        let verifier = test_verifier();
        let now = 1_700_000_000;
        let future = now + TIMESTAMP_TOLERANCE_SECS + 1;

        let signature = verifier.sign("msg_1", future, b"payload").unwrap();
        let result = verifier.verify_at("msg_1", &future.to_string(), &signature, b"payload", now);

        assert!(!result.is_valid);
    }

    #[test]
    fn extreme_timestamps_are_rejected_without_panic() {
        let verifier = test_verifier();
        let now = 1_700_000_000;

        let result = verifier.verify_at("msg_1", &i64::MIN.to_string(), "v1,AAAA", b"payload", now);
        assert!(!result.is_valid);
        assert_eq!(result.error_message.unwrap(), "timestamp outside tolerance window");

        let result = verifier.verify_at("msg_1", &i64::MAX.to_string(), "v1,AAAA", b"payload", now);
        assert!(!result.is_valid);
        assert_eq!(result.error_message.unwrap(), "timestamp outside tolerance window");
    }

    #[test]
    fn non_numeric_timestamp_is_rejected() {
        let verifier = test_verifier();
        let result = verifier.verify_at("msg_1", "not-a-timestamp", "v1,AAAA", b"payload", 0);

        assert!(!result.is_valid);
        assert_eq!(result.error_message.unwrap(), "timestamp is not a unix epoch integer");
    }

    #[test]
    fn any_matching_entry_in_list_passes() {
        let verifier = test_verifier();
        let now = 1_700_000_000;

        let good = verifier.sign("msg_1", now, b"payload").unwrap();
        let header = format!("v1,bm90LXRoZS1zaWduYXR1cmU= {good}");
        let result = verifier.verify_at("msg_1", &now.to_string(), &header, b"payload", now);

        assert!(result.is_valid);
    }

    #[test]
    fn unknown_version_entries_are_ignored() {
        let verifier = test_verifier();
        let now = 1_700_000_000;

        let good = verifier.sign("msg_1", now, b"payload").unwrap();
        let header = format!("v2,c29tZXRoaW5nLWVsc2U= {good}");
        let result = verifier.verify_at("msg_1", &now.to_string(), &header, b"payload", now);

        assert!(result.is_valid);
    }

    #[test]
    fn header_without_versioned_entries_is_invalid_format() {
        let verifier = test_verifier();
        let now = 1_700_000_000;

        let result = verifier.verify_at("msg_1", &now.to_string(), "garbage", b"payload", now);

        assert!(!result.is_valid);
        assert!(result.error_message.unwrap().contains("invalid signature format"));
    }

    #[test]
    fn secret_without_prefix_is_accepted() {
        let bare = BASE64.encode(b"unit-test-signing-key");
        let verifier = WebhookVerifier::new(&bare).unwrap();
        let now = 1_700_000_000;

        let signature = verifier.sign("msg_1", now, b"payload").unwrap();
        assert!(verifier.verify_at("msg_1", &now.to_string(), &signature, b"payload", now).is_valid);
    }

    #[test]
    fn undecodable_secret_is_rejected() {
        let err = WebhookVerifier::new("whsec_!!!not-base64!!!").unwrap_err();
        assert_eq!(err, SignatureError::InvalidSecret);
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert_eq!(WebhookVerifier::new("").unwrap_err(), SignatureError::InvalidSecret);
        assert_eq!(WebhookVerifier::new("whsec_").unwrap_err(), SignatureError::InvalidSecret);
    }

    #[test]
    fn timing_safe_eq_same() {
        assert!(timing_safe_eq(b"hello", b"hello"));
    }

    #[test]
    fn timing_safe_eq_different() {
        assert!(!timing_safe_eq(b"hello", b"world"));
    }

    #[test]
    fn timing_safe_eq_different_length() {
        assert!(!timing_safe_eq(b"hello", b"hello_world"));
    }
}

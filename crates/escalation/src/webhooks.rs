//! Slash-command payload parsing and request signature verification.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::command::{is_escalation_command, EscalationRequest};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Header carrying the request timestamp (Unix seconds).
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Signature scheme version prefix.
const SIGNATURE_VERSION: &str = "v0";

/// Verify a Slack request signature using HMAC-SHA256.
///
/// # Arguments
/// * `body` - Raw request body bytes
/// * `timestamp` - Value of the `X-Slack-Request-Timestamp` header
/// * `signature` - Value of the `X-Slack-Signature` header (`v0=<hex>`)
/// * `secret` - App signing secret
///
/// # Returns
/// `true` if signature is valid, `false` otherwise
#[must_use]
pub fn verify_slack_signature(body: &[u8], timestamp: &str, signature: &str, secret: &str) -> bool {
    let Some(hex_signature) = signature
        .strip_prefix(SIGNATURE_VERSION)
        .and_then(|s| s.strip_prefix('='))
    else {
        return false;
    };

    let Ok(signature_bytes) = hex::decode(hex_signature) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(SIGNATURE_VERSION.as_bytes());
    mac.update(b":");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    let computed = mac.finalize().into_bytes();

    // Constant-time comparison to prevent timing attacks
    computed.as_slice().ct_eq(&signature_bytes).into()
}

/// Validate a request timestamp is within the accepted age.
///
/// The timestamp comes straight from a header, so any `i64` must be handled
/// without overflow. A negative `max_age_secs` rejects everything.
///
/// # Returns
/// `true` if the timestamp is fresh, `false` if stale
#[must_use]
pub fn validate_request_timestamp(timestamp_secs: i64, max_age_secs: i64) -> bool {
    let now_secs = chrono::Utc::now().timestamp();
    u64::try_from(max_age_secs)
        .is_ok_and(|max_age| now_secs.abs_diff(timestamp_secs) <= max_age)
}

/// Form fields Slack posts for a slash command.
///
/// Only `command`, `text` and `user_id` drive the workflow; the rest are kept
/// for logging.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SlashCommand {
    pub team_id: String,
    pub team_domain: String,
    pub channel_id: String,
    pub channel_name: String,
    pub user_id: String,
    pub user_name: String,
    pub command: String,
    pub text: String,
    pub response_url: String,
    pub trigger_id: String,
}

impl SlashCommand {
    /// Check the command is one of the escalation commands.
    #[must_use]
    pub fn is_escalation(&self) -> bool {
        is_escalation_command(&self.command)
    }

    /// Extract the workflow input.
    #[must_use]
    pub fn to_request(&self) -> EscalationRequest {
        EscalationRequest::new(self.text.trim(), self.user_id.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(body: &[u8], timestamp: &str, secret: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("v0:{timestamp}:").as_bytes());
        mac.update(body);
        format!("v0={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_verify_slack_signature_valid() {
        let body = b"command=%2Fninjaescal&text=case%3A";
        let signature = sign(body, "1531420618", "test-secret");

        assert!(verify_slack_signature(
            body,
            "1531420618",
            &signature,
            "test-secret"
        ));
    }

    #[test]
    fn test_verify_slack_signature_wrong_timestamp() {
        let body = b"command=%2Fninjaescal";
        let signature = sign(body, "1531420618", "test-secret");

        assert!(!verify_slack_signature(
            body,
            "1531420619",
            &signature,
            "test-secret"
        ));
    }

    #[test]
    fn test_verify_slack_signature_malformed() {
        let body = b"payload";
        assert!(!verify_slack_signature(body, "1", "not-hex", "secret"));
        assert!(!verify_slack_signature(body, "1", "v0=zz", "secret"));
        assert!(!verify_slack_signature(body, "1", "v1=00", "secret"));
    }

    #[test]
    fn test_validate_timestamp() {
        let now = chrono::Utc::now().timestamp();
        assert!(validate_request_timestamp(now, 300));
        assert!(validate_request_timestamp(now - 120, 300));
        assert!(!validate_request_timestamp(now - 600, 300));
        assert!(!validate_request_timestamp(now + 600, 300));
    }

    #[test]
    fn test_validate_timestamp_extremes() {
        assert!(!validate_request_timestamp(i64::MIN, 300));
        assert!(!validate_request_timestamp(i64::MAX, 300));
        assert!(!validate_request_timestamp(i64::MIN, i64::MAX - 1));
        assert!(!validate_request_timestamp(chrono::Utc::now().timestamp(), -1));
    }

    #[test]
    fn test_to_request_trims_fields() {
        let command = SlashCommand {
            user_id: " U42 ".to_string(),
            command: "/ninjaescalate".to_string(),
            text: "  case: https://t.example/browse/A-1 client: Acme \n".to_string(),
            ..SlashCommand::default()
        };
        assert!(command.is_escalation());

        let request = command.to_request();
        assert_eq!(request.requester_id, "U42");
        assert_eq!(request.text, "case: https://t.example/browse/A-1 client: Acme");
    }

    #[test]
    fn test_unknown_command() {
        let command = SlashCommand {
            command: "/deploy".to_string(),
            ..SlashCommand::default()
        };
        assert!(!command.is_escalation());
    }
}

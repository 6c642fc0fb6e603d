//! Session record: the client-held proof of a successful login.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Random bytes per session token (128 bits of entropy).
const TOKEN_BYTES: usize = 16;

/// A live or persisted session.
///
/// Created once on successful login and never mutated afterwards except for
/// destruction. The capability set is a snapshot taken at login time and is
/// not re-resolved against a later manifest. Serialized whole as the single
/// persisted record, with millisecond-epoch timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Role id matched at login time
    pub role: String,
    /// Human-readable label for the role, for the presentation layer
    pub display_name: String,
    /// Capability tags snapshotted from the manifest at login time
    pub capabilities: Vec<String>,
    /// When the session was minted
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub issued_at: DateTime<Utc>,
    /// Opaque session nonce with no server-side meaning
    pub token: String,
    /// Instant after which the session is invalid
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Mint a fresh session valid for `duration` from now.
    pub fn mint(role: String, display_name: String, capabilities: Vec<String>, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            role,
            display_name,
            capabilities,
            issued_at: now,
            token: generate_token(),
            expires_at: now + duration,
        }
    }

    /// Whether the session's expiry instant has passed.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Generate an opaque session token: 16 random bytes as lowercase hex.
///
/// The token is never derived from the password or role; it is purely a
/// high-entropy nonce identifying this session instance.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes[..]);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(duration: Duration) -> Session {
        Session::mint(
            "manager".to_string(),
            "Manager".to_string(),
            vec!["students".to_string(), "staff".to_string()],
            duration,
        )
    }

    #[test]
    fn test_mint_orders_timestamps() {
        let session = sample(Duration::from_secs(2 * 60 * 60));
        assert!(session.expires_at > session.issued_at);
        assert!(!session.is_expired());
    }

    #[test]
    fn test_generate_token_format_and_uniqueness() {
        let first = generate_token();
        let second = generate_token();

        assert_eq!(first.len(), TOKEN_BYTES * 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_tokens_are_independent_of_role() {
        let a = sample(Duration::from_secs(60));
        let b = sample(Duration::from_secs(60));
        assert_eq!(a.role, b.role);
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_persisted_record_shape() {
        let session = sample(Duration::from_secs(60));
        let record = serde_json::to_string(&session).unwrap();

        let value: serde_json::Value = serde_json::from_str(&record).unwrap();
        assert!(value.get("displayName").is_some());
        assert!(value.get("issuedAt").unwrap().is_i64());
        assert!(value.get("expiresAt").unwrap().is_i64());
        assert_eq!(
            value.get("issuedAt").unwrap().as_i64().unwrap(),
            session.issued_at.timestamp_millis()
        );
    }

    #[test]
    fn test_record_round_trip() {
        let session = sample(Duration::from_secs(60));
        let record = serde_json::to_string(&session).unwrap();
        let restored: Session = serde_json::from_str(&record).unwrap();

        assert_eq!(restored.role, session.role);
        assert_eq!(restored.capabilities, session.capabilities);
        assert_eq!(restored.token, session.token);
        // Millisecond-epoch serde truncates sub-millisecond precision, so
        // compare at that granularity.
        assert_eq!(restored.issued_at.timestamp_millis(), session.issued_at.timestamp_millis());
        assert_eq!(restored.expires_at.timestamp_millis(), session.expires_at.timestamp_millis());
    }
}

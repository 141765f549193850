//! Core protocol types: who is waiting, what they asked for, and what
//! they get back.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Longest player id accepted from the wire.
const MAX_PLAYER_ID_LEN: usize = 64;

// ---------------------------------------------------------------------------
// PlayerId
// ---------------------------------------------------------------------------

/// Opaque token identifying one client for one pairing cycle.
///
/// Generated on the client side of the rendezvous (never by the
/// coordinator) and used verbatim as the suffix of the player's result
/// topic. Because of that, only ASCII letters, digits, `-` and `_` are
/// accepted, and ids are at most 64 characters long.
///
/// Serializes as a plain JSON string. Deserialization runs the same
/// validation as [`PlayerId::parse`], so a malformed id on the wire fails
/// to decode instead of reaching the pairing slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    /// Generates a fresh random id: 32 lowercase hex characters
    /// (128 random bits).
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let bytes: [u8; 16] = rng.random();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Validates and wraps an externally supplied id.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidPlayerId`] if the id is empty, too
    /// long, or contains characters outside `[A-Za-z0-9_-]`.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ProtocolError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ProtocolError::InvalidPlayerId(raw, "empty"));
        }
        if raw.len() > MAX_PLAYER_ID_LEN {
            return Err(ProtocolError::InvalidPlayerId(
                raw,
                "longer than 64 characters",
            ));
        }
        if !raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(ProtocolError::InvalidPlayerId(
                raw,
                "only ASCII letters, digits, '-' and '_' are allowed",
            ));
        }
        Ok(Self(raw))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PlayerId {
    type Error = ProtocolError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// "Find me an opponent." Published once per client on the matchmaking
/// topic, after the client has subscribed to its own result topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRequest {
    /// The player asking to be paired.
    pub player: PlayerId,
}

/// The outcome of one pairing cycle: where the session was provisioned.
///
/// The same value is published to both players of a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Address of the provisioned session server, e.g.
    /// `http://10.0.0.5:7777`.
    pub endpoint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_produces_32_hex_chars() {
        let id = PlayerId::generate();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generate_ids_are_distinct() {
        let ids: std::collections::HashSet<PlayerId> =
            (0..1_000).map(|_| PlayerId::generate()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn test_generated_id_passes_parse() {
        let id = PlayerId::generate();
        assert_eq!(PlayerId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_parse_accepts_short_ids() {
        assert_eq!(PlayerId::parse("p1").unwrap().as_str(), "p1");
        assert!(PlayerId::parse("player_2-b").is_ok());
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(
            PlayerId::parse(""),
            Err(ProtocolError::InvalidPlayerId(_, "empty"))
        ));
    }

    #[test]
    fn test_parse_rejects_topic_unsafe_characters() {
        for bad in ["a b", "a/b", "a.b", "ä", "p1\n"] {
            assert!(PlayerId::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_rejects_overlong_ids() {
        assert!(PlayerId::parse("x".repeat(64)).is_ok());
        assert!(PlayerId::parse("x".repeat(65)).is_err());
    }

    #[test]
    fn test_player_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PlayerId::parse("p1").unwrap()).unwrap();
        assert_eq!(json, "\"p1\"");
    }

    #[test]
    fn test_player_id_display_is_raw_id() {
        assert_eq!(PlayerId::parse("p7").unwrap().to_string(), "p7");
    }

    #[test]
    fn test_pairing_request_json_shape() {
        let request = PairingRequest {
            player: PlayerId::parse("p1").unwrap(),
        };
        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(json["player"], "p1");
    }
}

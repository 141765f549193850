//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// A `ProtocolError` always means the bytes or identifiers themselves are
/// wrong. Retrying the same input will fail the same way.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or a field
    /// that failed validation (such as an invalid player id).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A player id that cannot name a result topic.
    #[error("invalid player id {0:?}: {1}")]
    InvalidPlayerId(String, &'static str),

    /// The message is well formed but violates protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

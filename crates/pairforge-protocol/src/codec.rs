//! Codec trait and implementations for serializing bus payloads.
//!
//! The bus moves opaque bytes. A [`Codec`] turns pairing requests and match
//! results into those bytes and back, so the coordinator and the rendezvous
//! clients agree on a format without the bus knowing about either.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds
///
/// - `Send + Sync`: one codec instance is shared by every handler task
///   the coordinator spawns, and those tasks run on any worker thread.
/// - `'static`: the codec owns its configuration and borrows nothing.
///
/// ## Generic methods
///
/// `encode` accepts any `T: Serialize` and `decode` produces any
/// `T: DeserializeOwned`. The same codec therefore handles
/// [`PairingRequest`](crate::PairingRequest) on the way in and
/// [`MatchResult`](crate::MatchResult) on the way out.
///
/// `DeserializeOwned` means the decoded value does not borrow from the
/// input. The bus payload can be acked and dropped as soon as decoding
/// returns.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use pairforge_protocol::{Codec, JsonCodec, PairingRequest, PlayerId};
///
/// let codec = JsonCodec;
/// let request = PairingRequest { player: PlayerId::parse("p1").unwrap() };
///
/// let bytes = codec.encode(&request).unwrap();
/// assert_eq!(bytes, br#"{"player":"p1"}"#);
///
/// let decoded: PairingRequest = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, request);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

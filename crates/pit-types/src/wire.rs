//! JSON framing for messages on the transport.
//!
//! One frame carries exactly one [`Message`] or [`PeerReport`]. Decoding a
//! frame whose `kind` is unrecognised is not an error (it yields
//! [`Message::Unknown`]); a frame that is not valid JSON, or that is missing
//! fields of a known kind, is.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::messages::{Message, PeerReport};

/// Errors raised while encoding or decoding a frame.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The value could not be serialized.
    #[error("failed to encode frame: {source}")]
    Encode {
        /// The underlying serializer error.
        source: serde_json::Error,
    },

    /// The bytes are not a well-formed frame.
    #[error("failed to decode frame: {source}")]
    Decode {
        /// The underlying deserializer error.
        source: serde_json::Error,
    },
}

/// Encode a value into a frame.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    serde_json::to_vec(value).map_err(|source| WireError::Encode { source })
}

/// Decode a frame into any wire type.
pub fn decode<T: DeserializeOwned>(frame: &[u8]) -> Result<T, WireError> {
    serde_json::from_slice(frame).map_err(|source| WireError::Decode { source })
}

/// Decode a player-bound frame.
pub fn decode_message(frame: &[u8]) -> Result<Message, WireError> {
    decode(frame)
}

/// Decode a coordinator-bound frame.
pub fn decode_report(frame: &[u8]) -> Result<PeerReport, WireError> {
    decode(frame)
}

//! Codec trait and implementations for serializing frames.
//!
//! The protocol layer does not care how frames become bytes — anything
//! implementing [`Codec`] works. [`JsonCodec`] is the default (and what
//! the browser clients speak); a binary codec could be added behind its
//! own feature flag without touching the rest of the engine.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes frames to bytes and decodes bytes back into frames.
///
/// `Send + Sync + 'static` because a codec is shared across connection
/// tasks on the tokio thread pool.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or do
    /// not match the expected frame shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

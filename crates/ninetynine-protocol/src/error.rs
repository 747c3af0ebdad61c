//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed — malformed JSON, a missing required field,
    /// or an unknown action tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed but violates the protocol — e.g. an action that
    /// requires a seat arriving before any join.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
}

//! Codec errors
//!
//! A decode error means the whole frame is unusable. Individual malformed data
//! entries are not errors at this level; they are dropped during decode.

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    /// Payload is not valid JSON
    #[error("Failed to decode JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is valid JSON but not an object
    #[error("Expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// Outgoing control message could not be serialized
    #[error("Failed to encode control message: {0}")]
    Encode(serde_json::Error),
}

impl CodecError {
    /// True for failures caused by the inbound payload itself
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, CodecError::Json(_) | CodecError::NotAnObject { .. })
    }
}

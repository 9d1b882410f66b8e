//! Codec error types.

use thiserror::Error;

/// Errors produced while decoding inbound wire text.
///
/// A decode error never escapes the connection boundary: the caller logs the
/// offending frame and moves on to the next one.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Text is not valid JSON.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON, but not an object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// A recognised action whose payload does not match its schema.
    #[error("invalid {action} payload: {source}")]
    Payload {
        /// Action tag of the rejected message.
        action: String,
        /// Underlying schema mismatch.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors produced while encoding a message.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Serialization failed.
    #[error("failed to encode {action}: {source}")]
    Json {
        /// Action tag of the message being encoded.
        action: String,
        /// Underlying serializer failure.
        #[source]
        source: serde_json::Error,
    },

    /// Payload serialized to something other than a JSON object.
    #[error("{action} payload is not a JSON object")]
    NotAnObject {
        /// Action tag of the message being encoded.
        action: String,
    },
}

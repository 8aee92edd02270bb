//! Wire-level error types.

use thiserror::Error;

/// Failure to encode or decode a Security Peer Service message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtoError {
    /// CBOR serialization failed.
    #[error("encode failed: {reason}")]
    Encode {
        /// Serializer diagnostic.
        reason: String,
    },

    /// CBOR deserialization failed.
    #[error("decode failed: {reason}")]
    Decode {
        /// Deserializer diagnostic.
        reason: String,
    },
}

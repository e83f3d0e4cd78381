//! Error types for the core primitives.

use thiserror::Error;

/// Errors from encoding and decoding records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("unknown certificate kind: {0}")]
    UnknownKind(u64),
}

/// Structural validation failures.
///
/// These are the admission-time rejections: a record failing any of them
/// never touches an index. Signature verification is deliberately not here;
/// it happens at traversal time.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A stored hash does not match the hash of the covered bytes.
    #[error("{field} does not match the hash of its content")]
    HashMismatch { field: &'static str },

    /// The record is structurally broken (undecodable, bad field widths).
    #[error("malformed certificate: {0}")]
    MalformedCertificate(String),

    /// The payload does not decode as a record of the declared kind.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The profile record is structurally broken.
    #[error("malformed profile: {0}")]
    MalformedProfile(String),
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::UnknownKind(k) => {
                ValidationError::MalformedCertificate(format!("unknown kind {k}"))
            }
            CoreError::DecodingError(msg) | CoreError::EncodingError(msg) => {
                ValidationError::MalformedCertificate(msg)
            }
        }
    }
}

//! Error types for graph operations.

use thiserror::Error;

use credence_core::error::ValidationError;
use credence_core::crypto::CryptoError;
use credence_core::types::ProfileId;

/// Errors that can occur while mutating or querying the trust graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Structural validation failed; the record was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A profile older than the admitted revision was presented.
    #[error("stale profile {profile_id}: admitted timestamp {admitted}, presented {presented}")]
    StaleProfile {
        profile_id: ProfileId,
        admitted: u64,
        presented: u64,
    },

    /// The crypto capability failed; fatal for the operation.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

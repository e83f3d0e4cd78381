//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The substrate has no space left. In-memory state is preserved.
    #[error("storage full")]
    Full,

    /// I/O failure from the substrate.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A slot failed its integrity self-check.
    #[error("corrupt slot: {0}")]
    CorruptSlot(String),

    /// A slot name contains characters the substrate cannot store.
    #[error("invalid slot name: {0}")]
    InvalidSlotName(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

//! Unified error type for the trust core.

use thiserror::Error;

/// Errors surfaced by the trust core.
#[derive(Debug, Error)]
pub enum Error {
    /// Admission or evaluation failed.
    #[error(transparent)]
    Graph(#[from] credence_graph::GraphError),

    /// Persistence failed; in-memory state is preserved.
    #[error(transparent)]
    Store(#[from] credence_store::StoreError),

    /// The core actor has shut down and can take no more requests.
    #[error("trust core is shut down")]
    ShutDown,
}

/// Result type for trust core operations.
pub type Result<T> = std::result::Result<T, Error>;

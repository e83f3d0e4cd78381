//! # Credence Graph
//!
//! The authoritative trust state and the algorithms over it: certificate
//! and profile admission, memoized chain evaluation, derived endorsement
//! rights, and signature verification for domain artifacts.
//!
//! This crate owns all mutable state but performs no I/O. Persistence
//! lives in `credence-store`; the actor wrapper lives in `credence`.
//!
//! ## Key Types
//!
//! - [`TrustGraph`] - Facade owning the store, caches, and capabilities
//! - [`TrustStore`] - Flat keyed entity tables with derived indices
//! - [`RootProvider`] - The externally supplied root-of-trust seam
//! - [`Issuer`] - Local certificate issuance

pub mod error;
mod evaluator;
pub mod graph;
pub mod issue;
mod rights;
pub mod roots;
pub mod store;

pub use error::{GraphError, Result};
pub use graph::TrustGraph;
pub use issue::Issuer;
pub use roots::{RootMode, RootProvider, StaticRoots};
pub use store::{Admission, TrustStore};

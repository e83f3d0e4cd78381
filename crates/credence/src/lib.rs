//! # Credence
//!
//! The trusted-keys and credential core of a peer-to-peer identity
//! subsystem. Given a signed artifact produced by some peer, this crate
//! answers one question: should this node accept it?
//!
//! The answer composes root-of-trust selection, certificate chain
//! traversal under cycle risk, endorsement-rights evaluation, signature
//! verification, and durable persistence of the resulting trust graph.
//!
//! ## Architecture
//!
//! All mutable state is owned by a single actor task; [`TrustCoreHandle`]
//! is the cloneable entry point. Requests are processed strictly FIFO, so
//! an admission followed by a query on the same handle always observes
//! the admission, and no verdict ever crosses a cache invalidation.
//!
//! ```no_run
//! use credence::{CoreConfig, TrustCore};
//! use credence_core::crypto::{Keypair, StdCrypto};
//! use credence_graph::StaticRoots;
//! use credence_store::MemorySubstrate;
//! use std::sync::Arc;
//!
//! # async fn run() -> credence::Result<()> {
//! let keypair = Keypair::generate();
//! let roots = StaticRoots::new([keypair.key_id()]);
//! let (core, _task) = TrustCore::init(
//!     "this-node",
//!     keypair,
//!     Arc::new(StdCrypto::new()),
//!     Arc::new(roots),
//!     MemorySubstrate::new(),
//!     CoreConfig::default(),
//! )
//! .await?;
//!
//! let verdict = core.is_key_trusted(core.local_key_id()).await?;
//! assert!(verdict);
//! core.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod actor;
mod config;
mod error;

pub use actor::{TrustCore, TrustCoreHandle};
pub use config::CoreConfig;
pub use error::{Error, Result};

pub use credence_core::artifact::SignedArtifact;
pub use credence_core::certificate::{CertKind, Certificate};
pub use credence_core::profile::Profile;
pub use credence_core::types::{CertId, KeyId, PersonId, ProfileId};
pub use credence_core::verdict::{KeyTrustInfo, PersonRights, TrustReason};
pub use credence_graph::{Admission, RootMode};
pub use credence_store::LoadReport;

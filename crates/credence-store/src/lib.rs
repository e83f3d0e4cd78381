//! # Credence Store
//!
//! Durable storage for the trust graph: a slot-based substrate
//! abstraction, sealed slot envelopes with integrity self-checks, and the
//! save/load state machine that rebuilds derived state after a load.
//!
//! Writes are atomic per slot only; there are no multi-slot transactions.
//! A failed slot write leaves previously written slots intact, and a slot
//! failing its self-check on load is skipped and reported, never fatal.

pub mod dir;
pub mod envelope;
pub mod error;
pub mod memory;
pub mod persist;
pub mod substrate;

pub use dir::DirSubstrate;
pub use envelope::{open_slot, seal_slot};
pub use error::{Result, StoreError};
pub use memory::MemorySubstrate;
pub use persist::{GraphPersistence, LoadReport, PersistState};
pub use substrate::Substrate;

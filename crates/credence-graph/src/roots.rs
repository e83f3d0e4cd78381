//! The root-of-trust seam.
//!
//! Roots are designated externally; the evaluator accepts whatever set the
//! provider returns and never hard-codes identities. The returned set is
//! snapshotted for the duration of a traversal; callers invalidate the
//! graph's caches when the root set changes.

use std::collections::BTreeSet;

use credence_core::types::KeyId;

/// Which identity keys count as roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootMode {
    /// Only the node's main identity keys.
    MainIdentity,
    /// All identity keys, including alternates.
    All,
}

/// Supplies the current root key set.
pub trait RootProvider: Send + Sync {
    fn current_roots(&self, mode: RootMode) -> BTreeSet<KeyId>;
}

/// A fixed root set, for nodes whose identity keys do not rotate at
/// runtime and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticRoots {
    main: BTreeSet<KeyId>,
    alternates: BTreeSet<KeyId>,
}

impl StaticRoots {
    /// Roots consisting of the given main identity keys.
    pub fn new(main: impl IntoIterator<Item = KeyId>) -> Self {
        Self {
            main: main.into_iter().collect(),
            alternates: BTreeSet::new(),
        }
    }

    /// An empty root set; every non-root key evaluates untrusted.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add alternate identity keys, returned only in [`RootMode::All`].
    pub fn with_alternates(mut self, keys: impl IntoIterator<Item = KeyId>) -> Self {
        self.alternates.extend(keys);
        self
    }
}

impl RootProvider for StaticRoots {
    fn current_roots(&self, mode: RootMode) -> BTreeSet<KeyId> {
        match mode {
            RootMode::MainIdentity => self.main.clone(),
            RootMode::All => self.main.union(&self.alternates).copied().collect(),
        }
    }
}

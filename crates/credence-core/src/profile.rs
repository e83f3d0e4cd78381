//! Profile: a person's declaration of owned keys and attached certificates.
//!
//! Profiles are immutable once admitted. An update is a new profile with
//! the same `profile_id` and a greater timestamp.

use std::collections::BTreeSet;

use crate::crypto::Sha256Hash;
use crate::types::{CertId, KeyId, PersonId, ProfileId};

/// A signed person/keys declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Stable identity of this profile across revisions.
    pub profile_id: ProfileId,

    /// The person the declared keys belong to.
    pub person_id: PersonId,

    /// The person who authored the profile; frequently equals `person_id`.
    pub owner: PersonId,

    /// Content hash of the profile as computed by its author.
    pub profile_hash: Sha256Hash,

    /// Authoring wall-clock, milliseconds. Governs supersession.
    pub timestamp: u64,

    /// Keys declared owned by `person_id`.
    pub keys: BTreeSet<KeyId>,

    /// Certificates attached to this profile.
    pub certificates: BTreeSet<CertId>,
}

impl Profile {
    /// Create a profile authored by the person it describes.
    pub fn new(
        profile_id: impl Into<ProfileId>,
        person_id: impl Into<PersonId>,
        timestamp: u64,
    ) -> Self {
        let person_id = person_id.into();
        let profile_id = profile_id.into();
        Self {
            profile_hash: Sha256Hash::digest(profile_id.as_str().as_bytes()),
            owner: person_id.clone(),
            profile_id,
            person_id,
            timestamp,
            keys: BTreeSet::new(),
            certificates: BTreeSet::new(),
        }
    }

    /// Add a declared key.
    pub fn with_key(mut self, key: KeyId) -> Self {
        self.keys.insert(key);
        self
    }

    /// Attach a certificate.
    pub fn with_certificate(mut self, cert: CertId) -> Self {
        self.certificates.insert(cert);
        self
    }

    /// Whether this profile supersedes `other` in lookups.
    pub fn supersedes(&self, other: &Profile) -> bool {
        self.profile_id == other.profile_id && self.timestamp > other.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supersession_is_timestamp_monotone() {
        let old = Profile::new("p1", "alice", 100);
        let new = Profile::new("p1", "alice", 200);
        let unrelated = Profile::new("p2", "alice", 300);

        assert!(new.supersedes(&old));
        assert!(!old.supersedes(&new));
        assert!(!old.supersedes(&old));
        assert!(!unrelated.supersedes(&old));
    }

    #[test]
    fn test_builder_accumulates() {
        let profile = Profile::new("p1", "alice", 100)
            .with_key(KeyId::from_bytes([1; 32]))
            .with_key(KeyId::from_bytes([2; 32]))
            .with_certificate(CertId::from_bytes([3; 32]));

        assert_eq!(profile.keys.len(), 2);
        assert_eq!(profile.certificates.len(), 1);
        assert_eq!(profile.owner, profile.person_id);
    }
}

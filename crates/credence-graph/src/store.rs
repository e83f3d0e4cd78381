//! The trust graph store: flat keyed entity tables with derived indices.
//!
//! The store owns the authoritative certificate, profile, and key sets.
//! Every index is recomputable from the entity sets alone; losing an index
//! is recoverable via [`TrustStore::rebuild_indices`].

use std::collections::{BTreeSet, HashMap};

use credence_core::certificate::{CertKind, Certificate};
use credence_core::crypto::PublicKey;
use credence_core::profile::Profile;
use credence_core::types::{CertId, KeyId, PersonId, ProfileId};
use credence_core::validation::{validate_certificate, validate_profile};

use crate::error::{GraphError, Result};

/// Result of admitting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The record was new and is now part of the graph.
    Inserted,
    /// An identical record was already admitted (idempotent, not an error).
    AlreadyAdmitted,
}

impl Admission {
    pub fn is_inserted(self) -> bool {
        matches!(self, Admission::Inserted)
    }
}

/// In-memory authoritative trust state.
#[derive(Debug, Default)]
pub struct TrustStore {
    /// Certificates by id.
    certificates: HashMap<CertId, Certificate>,

    /// Certificate ids in admission order.
    admission: Vec<CertId>,

    /// Index: (subject, kind) -> cert ids in admission order.
    by_subject: HashMap<(String, CertKind), Vec<CertId>>,

    /// Current profile revision per profile id.
    profiles: HashMap<ProfileId, Profile>,

    /// Index: person -> union of declared keys over current profiles.
    keys_of_person: HashMap<PersonId, BTreeSet<KeyId>>,

    /// Admitted key material by content address.
    keys: HashMap<KeyId, PublicKey>,
}

impl TrustStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Admission
    // ─────────────────────────────────────────────────────────────────────

    /// Admit a certificate after structural validation.
    ///
    /// The TrustKeys back-link is re-derived from the payload here; wire
    /// data never supplies it. Idempotent on `cert_id`.
    pub fn admit_certificate(&mut self, mut cert: Certificate) -> Result<Admission> {
        validate_certificate(&cert)?;

        if self.certificates.contains_key(&cert.cert_id) {
            return Ok(Admission::AlreadyAdmitted);
        }

        let payload = cert.decode_payload()?;
        cert.endorsed_key = payload.endorsed_key();

        let subject = payload.subject();
        self.by_subject
            .entry((subject, cert.kind))
            .or_default()
            .push(cert.cert_id);
        self.admission.push(cert.cert_id);
        self.certificates.insert(cert.cert_id, cert);

        Ok(Admission::Inserted)
    }

    /// Admit a profile, enforcing timestamp-monotone supersession.
    pub fn admit_profile(&mut self, profile: Profile) -> Result<Admission> {
        validate_profile(&profile)?;

        if let Some(current) = self.profiles.get(&profile.profile_id) {
            if *current == profile {
                return Ok(Admission::AlreadyAdmitted);
            }
            if profile.timestamp <= current.timestamp {
                return Err(GraphError::StaleProfile {
                    profile_id: profile.profile_id.clone(),
                    admitted: current.timestamp,
                    presented: profile.timestamp,
                });
            }
        }

        self.profiles.insert(profile.profile_id.clone(), profile);
        self.rebuild_key_index();
        Ok(Admission::Inserted)
    }

    /// Admit public key material, making its id resolvable.
    pub fn admit_key(&mut self, key: PublicKey) -> KeyId {
        let id = key.key_id();
        self.keys.insert(id, key);
        id
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lookup
    // ─────────────────────────────────────────────────────────────────────

    /// Keys declared owned by a person, the union over current profiles.
    pub fn keys_of(&self, person: &PersonId) -> BTreeSet<KeyId> {
        self.keys_of_person.get(person).cloned().unwrap_or_default()
    }

    /// Certificates filed under a subject and kind, admission-ordered.
    pub fn certificates_for(&self, subject: &str, kind: CertKind) -> &[CertId] {
        self.by_subject
            .get(&(subject.to_string(), kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// TrustKeys certificates endorsing the given key, admission-ordered.
    pub fn endorsements_of(&self, key: &KeyId) -> &[CertId] {
        self.certificates_for(&key.to_hex(), CertKind::TrustKeys)
    }

    /// Look up a certificate by id.
    pub fn certificate(&self, id: &CertId) -> Option<&Certificate> {
        self.certificates.get(id)
    }

    /// Look up the current revision of a profile.
    pub fn profile(&self, id: &ProfileId) -> Option<&Profile> {
        self.profiles.get(id)
    }

    /// Resolve key material; `None` means the id is opaque here.
    pub fn resolve_key(&self, id: &KeyId) -> Option<&PublicKey> {
        self.keys.get(id)
    }

    /// All certificates in admission order.
    pub fn certificates(&self) -> impl Iterator<Item = &Certificate> {
        self.admission
            .iter()
            .filter_map(move |id| self.certificates.get(id))
    }

    /// All current profiles, in no particular order.
    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    /// All admitted key material.
    pub fn keys(&self) -> impl Iterator<Item = &PublicKey> {
        self.keys.values()
    }

    /// Every person appearing as a key owner.
    pub fn persons(&self) -> impl Iterator<Item = &PersonId> {
        self.keys_of_person.keys()
    }

    /// Number of admitted certificates.
    pub fn certificate_count(&self) -> usize {
        self.certificates.len()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Index maintenance
    // ─────────────────────────────────────────────────────────────────────

    /// Recompute every index from the entity sets.
    ///
    /// Used after bulk load; admission order is preserved because the
    /// admission list is itself part of the entity state.
    pub fn rebuild_indices(&mut self) {
        self.by_subject.clear();
        let admission = self.admission.clone();
        for id in &admission {
            let Some(cert) = self.certificates.get_mut(id) else {
                continue;
            };
            let Ok(payload) = cert.decode_payload() else {
                continue;
            };
            cert.endorsed_key = payload.endorsed_key();
            self.by_subject
                .entry((payload.subject(), cert.kind))
                .or_default()
                .push(*id);
        }
        self.rebuild_key_index();
    }

    fn rebuild_key_index(&mut self) {
        self.keys_of_person.clear();
        for profile in self.profiles.values() {
            let entry = self
                .keys_of_person
                .entry(profile.person_id.clone())
                .or_default();
            entry.extend(profile.keys.iter().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credence_core::certificate::TrustKeysPayload;
    use credence_core::crypto::{Crypto, Keypair, Sha256Hash, StdCrypto};
    use bytes::Bytes;

    fn trust_keys_cert(signer: &str, endorsed: KeyId, timestamp: u64) -> Certificate {
        let keypair = Keypair::from_seed(&[7; 32]);
        let crypto = StdCrypto::new();
        let payload = TrustKeysPayload {
            signer: PersonId::new(signer),
            endorsed_key: endorsed,
        }
        .to_bytes();
        let signature = Bytes::copy_from_slice(crypto.sign(&payload, &keypair).unwrap().as_bytes());
        let mut cert = Certificate {
            cert_id: CertId::from_bytes([0; 32]),
            kind: CertKind::TrustKeys,
            payload_hash: Sha256Hash::digest(&payload),
            signature_hash: Sha256Hash::digest(&signature),
            payload,
            signature,
            timestamp,
            trusted: false,
            endorsed_key: None,
        };
        cert.cert_id = cert.compute_id();
        cert
    }

    #[test]
    fn test_admission_is_idempotent() {
        let mut store = TrustStore::new();
        let cert = trust_keys_cert("alice", KeyId::from_bytes([1; 32]), 100);

        assert_eq!(
            store.admit_certificate(cert.clone()).unwrap(),
            Admission::Inserted
        );
        assert_eq!(
            store.admit_certificate(cert).unwrap(),
            Admission::AlreadyAdmitted
        );
        assert_eq!(store.certificate_count(), 1);
    }

    #[test]
    fn test_back_link_derived_at_intake() {
        let mut store = TrustStore::new();
        let endorsed = KeyId::from_bytes([9; 32]);
        let mut cert = trust_keys_cert("alice", endorsed, 100);
        // A peer cannot plant a back-link; intake overwrites it.
        cert.endorsed_key = Some(KeyId::from_bytes([0xee; 32]));

        store.admit_certificate(cert.clone()).unwrap();
        let admitted = store.certificate(&cert.cert_id).unwrap();
        assert_eq!(admitted.endorsed_key, Some(endorsed));
        assert_eq!(store.endorsements_of(&endorsed), &[cert.cert_id]);
    }

    #[test]
    fn test_malformed_certificate_leaves_store_unchanged() {
        let mut store = TrustStore::new();
        let mut cert = trust_keys_cert("alice", KeyId::from_bytes([1; 32]), 100);
        cert.payload_hash = Sha256Hash::digest(b"tampered");

        assert!(store.admit_certificate(cert).is_err());
        assert_eq!(store.certificate_count(), 0);
        assert!(store.certificates().next().is_none());
    }

    #[test]
    fn test_profile_supersession() {
        let mut store = TrustStore::new();
        let k1 = KeyId::from_bytes([1; 32]);
        let k2 = KeyId::from_bytes([2; 32]);

        let old = Profile::new("p1", "alice", 100).with_key(k1);
        let new = Profile::new("p1", "alice", 200).with_key(k2);

        store.admit_profile(old.clone()).unwrap();
        assert!(store.keys_of(&PersonId::new("alice")).contains(&k1));

        store.admit_profile(new).unwrap();
        let keys = store.keys_of(&PersonId::new("alice"));
        assert!(keys.contains(&k2));
        assert!(!keys.contains(&k1));

        // The superseded revision is now stale
        let err = store.admit_profile(old).unwrap_err();
        assert!(matches!(err, GraphError::StaleProfile { .. }));
    }

    #[test]
    fn test_identical_profile_readmission_is_noop() {
        let mut store = TrustStore::new();
        let profile = Profile::new("p1", "alice", 100).with_key(KeyId::from_bytes([1; 32]));

        assert_eq!(
            store.admit_profile(profile.clone()).unwrap(),
            Admission::Inserted
        );
        assert_eq!(
            store.admit_profile(profile).unwrap(),
            Admission::AlreadyAdmitted
        );
    }

    #[test]
    fn test_keys_of_is_union_over_profiles() {
        let mut store = TrustStore::new();
        let k1 = KeyId::from_bytes([1; 32]);
        let k2 = KeyId::from_bytes([2; 32]);

        store
            .admit_profile(Profile::new("device-a", "alice", 100).with_key(k1))
            .unwrap();
        store
            .admit_profile(Profile::new("device-b", "alice", 100).with_key(k2))
            .unwrap();

        let keys = store.keys_of(&PersonId::new("alice"));
        assert_eq!(keys, BTreeSet::from([k1, k2]));
    }

    #[test]
    fn test_admission_order_preserved() {
        let mut store = TrustStore::new();
        let endorsed = KeyId::from_bytes([5; 32]);
        let c1 = trust_keys_cert("alice", endorsed, 100);
        let c2 = trust_keys_cert("bob", endorsed, 200);

        store.admit_certificate(c1.clone()).unwrap();
        store.admit_certificate(c2.clone()).unwrap();
        assert_eq!(store.endorsements_of(&endorsed), &[c1.cert_id, c2.cert_id]);
    }

    #[test]
    fn test_rebuild_indices_recovers_lookups() {
        let mut store = TrustStore::new();
        let endorsed = KeyId::from_bytes([5; 32]);
        let cert = trust_keys_cert("alice", endorsed, 100);
        store.admit_certificate(cert.clone()).unwrap();
        store
            .admit_profile(Profile::new("p1", "alice", 100).with_key(endorsed))
            .unwrap();

        store.by_subject.clear();
        store.keys_of_person.clear();
        store.rebuild_indices();

        assert_eq!(store.endorsements_of(&endorsed), &[cert.cert_id]);
        assert!(store.keys_of(&PersonId::new("alice")).contains(&endorsed));
    }
}

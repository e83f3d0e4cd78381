//! The trust graph facade: authoritative state plus derived caches,
//! reached through one owner.
//!
//! Every mutating entry point invalidates the derived caches; every
//! verdict returned reflects the evidence admitted at the time of the
//! call. The facade performs no I/O and never suspends.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use credence_core::artifact::SignedArtifact;
use credence_core::certificate::{CertKind, Certificate};
use credence_core::crypto::{Crypto, PublicKey, Signature};
use credence_core::profile::Profile;
use credence_core::types::{KeyId, PersonId, ProfileId};
use credence_core::validation::validate_certificate;
use credence_core::verdict::{KeyTrustInfo, PersonRights};

use crate::evaluator::{self, EvalCtx};
use crate::roots::{RootMode, RootProvider};
use crate::store::{Admission, TrustStore};
use crate::Result;

/// The trust core's state: store, caches, and capability handles.
pub struct TrustGraph {
    store: TrustStore,
    crypto: Arc<dyn Crypto>,
    roots: Arc<dyn RootProvider>,
    trust_cache: HashMap<KeyId, KeyTrustInfo>,
    rights_cache: HashMap<PersonId, PersonRights>,
    local_profile: Option<ProfileId>,
}

impl TrustGraph {
    /// Create an empty graph over the given capabilities.
    pub fn new(crypto: Arc<dyn Crypto>, roots: Arc<dyn RootProvider>) -> Self {
        Self {
            store: TrustStore::new(),
            crypto,
            roots,
            trust_cache: HashMap::new(),
            rights_cache: HashMap::new(),
            local_profile: None,
        }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &TrustStore {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────
    // Admission
    // ─────────────────────────────────────────────────────────────────────

    /// Admit a certificate; derived caches are invalidated on insertion.
    pub fn admit_certificate(&mut self, cert: Certificate) -> Result<Admission> {
        let admission = self.store.admit_certificate(cert)?;
        if admission.is_inserted() {
            self.invalidate_caches();
        }
        Ok(admission)
    }

    /// Admit a profile; derived caches are invalidated on insertion.
    pub fn admit_profile(&mut self, profile: Profile) -> Result<Admission> {
        let admission = self.store.admit_profile(profile)?;
        if admission.is_inserted() {
            self.invalidate_caches();
        }
        Ok(admission)
    }

    /// Admit public key material. New material can change verification
    /// outcomes, so caches are invalidated.
    pub fn admit_key(&mut self, key: PublicKey) -> KeyId {
        let id = key.key_id();
        if self.store.resolve_key(&id).is_none() {
            self.store.admit_key(key);
            self.invalidate_caches();
        }
        id
    }

    /// Admit and remember this node's own profile.
    pub fn set_local_profile(&mut self, profile: Profile) -> Result<Admission> {
        let id = profile.profile_id.clone();
        let admission = self.admit_profile(profile)?;
        self.local_profile = Some(id);
        Ok(admission)
    }

    /// This node's own profile, if one was declared.
    pub fn local_profile(&self) -> Option<&Profile> {
        self.local_profile
            .as_ref()
            .and_then(|id| self.store.profile(id))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Evaluation
    // ─────────────────────────────────────────────────────────────────────

    /// Full verdict for a key, computed or served from the cache.
    pub fn key_trust_info(&mut self, key: KeyId) -> KeyTrustInfo {
        let roots = self.roots.current_roots(RootMode::MainIdentity);
        let owners = self.roots.current_roots(RootMode::All);
        let mut ctx = EvalCtx::new(
            &self.store,
            self.crypto.as_ref(),
            &roots,
            &owners,
            &mut self.trust_cache,
            &mut self.rights_cache,
        );
        evaluator::evaluate_key(&mut ctx, key)
    }

    /// Whether a chain from a root reaches this key.
    pub fn is_key_trusted(&mut self, key: KeyId) -> bool {
        self.key_trust_info(key).trusted
    }

    /// Effective rights of a person under the current evidence.
    pub fn person_rights(&mut self, person: &PersonId) -> PersonRights {
        let roots = self.roots.current_roots(RootMode::MainIdentity);
        let owners = self.roots.current_roots(RootMode::All);
        let mut ctx = EvalCtx::new(
            &self.store,
            self.crypto.as_ref(),
            &roots,
            &owners,
            &mut self.trust_cache,
            &mut self.rights_cache,
        );
        evaluator::person_rights(&mut ctx, person)
    }

    /// Rights of every person currently owning keys. Used for the
    /// persisted rights aggregate.
    pub fn rights_snapshot(&mut self) -> BTreeMap<PersonId, PersonRights> {
        let persons: Vec<PersonId> = self.store.persons().cloned().collect();
        persons
            .into_iter()
            .map(|p| {
                let rights = self.person_rights(&p);
                (p, rights)
            })
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────

    /// Verify a signed artifact against the claimed signer's keys.
    ///
    /// Returns the evaluator's verdict for the first key that verifies the
    /// signature, or `None` when no candidate key does. The verdict always
    /// goes through the chain evaluator, so freshly admitted evidence and
    /// invalidations are observed.
    pub fn verify_artifact(&mut self, artifact: &SignedArtifact) -> Option<KeyTrustInfo> {
        let Some(signature) = Signature::from_slice(&artifact.signature) else {
            return None;
        };

        let verified = self
            .store
            .keys_of(&artifact.signer)
            .into_iter()
            .find(|k| {
                self.store
                    .resolve_key(k)
                    .map_or(false, |pk| self.crypto.verify(&artifact.payload, &signature, pk))
            });

        verified.map(|k| self.key_trust_info(k))
    }

    /// Whether the artifact verifies directly under a root key.
    pub fn is_signed_by_root(&self, artifact: &SignedArtifact, mode: RootMode) -> bool {
        let Some(signature) = Signature::from_slice(&artifact.signature) else {
            return false;
        };
        self.roots.current_roots(mode).iter().any(|k| {
            self.store
                .resolve_key(k)
                .map_or(false, |pk| self.crypto.verify(&artifact.payload, &signature, pk))
        })
    }

    /// Whether `subject` carries a certificate of `kind` that verifies
    /// under a trusted key of `issuer`.
    pub fn is_certified_by(&mut self, subject: &str, kind: CertKind, issuer: &PersonId) -> bool {
        let candidates = self.store.certificates_for(subject, kind).to_vec();

        for cert_id in candidates {
            let verifying_key = {
                let Some(cert) = self.store.certificate(&cert_id) else {
                    continue;
                };
                if validate_certificate(cert).is_err() {
                    continue;
                }
                let Some(signature) = Signature::from_slice(&cert.signature) else {
                    continue;
                };
                self.store.keys_of(issuer).into_iter().find(|k| {
                    self.store
                        .resolve_key(k)
                        .map_or(false, |pk| self.crypto.verify(&cert.payload, &signature, pk))
                })
            };

            if let Some(key) = verifying_key {
                if self.is_key_trusted(key) {
                    return true;
                }
            }
        }
        false
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cache control
    // ─────────────────────────────────────────────────────────────────────

    /// Clear every derived cache. Required after any admission and after
    /// a root-set change; the next query recomputes from sources.
    pub fn invalidate_caches(&mut self) {
        self.trust_cache.clear();
        self.rights_cache.clear();
    }

    /// Rebuild all store indices, then invalidate caches. Used after bulk
    /// load from persistence.
    pub fn rebuild(&mut self) {
        self.store.rebuild_indices();
        self.invalidate_caches();
    }
}

//! Chain evaluation: memoized depth-first search over endorsements.
//!
//! A key is trusted when it is a root or when some admitted TrustKeys
//! certificate, signed by an authorized person through a key that is
//! itself trusted, endorses it. Candidate certificates are examined in
//! admission order; the first trusted branch wins.
//!
//! Cycles are broken opaquely with a per-traversal `visiting` set: a
//! branch looping back into the recursion stack is skipped, it never
//! produces trust through itself and never poisons sibling branches.
//!
//! Memoization must stay sound under cycle pruning. A trusted verdict is
//! always cacheable (its path exists unconditionally), but an untrusted
//! verdict computed while branches were pruned against the recursion
//! stack holds only in that context. The context carries a prune counter;
//! untrusted results are cached only when no prune happened beneath them.
//! The entry key's verdict is cached unconditionally: a path through the
//! key itself can never be the only support for that same key.

use std::collections::{BTreeSet, HashMap, HashSet};

use credence_core::crypto::{Crypto, Signature};
use credence_core::types::{KeyId, PersonId};
use credence_core::validation::validate_certificate;
use credence_core::verdict::{KeyTrustInfo, PersonRights, TrustReason};

use crate::rights;
use crate::store::TrustStore;

/// Shared state of one traversal, spanning key evaluation and rights
/// derivation (the two are mutually recursive).
pub(crate) struct EvalCtx<'a> {
    pub store: &'a TrustStore,
    pub crypto: &'a dyn Crypto,
    /// Root snapshot for chain termination (main identity keys).
    pub roots: &'a BTreeSet<KeyId>,
    /// Root snapshot for the root-owner rights axiom (all identity keys).
    pub root_owner_keys: &'a BTreeSet<KeyId>,
    pub trust_cache: &'a mut HashMap<KeyId, KeyTrustInfo>,
    pub rights_cache: &'a mut HashMap<PersonId, PersonRights>,
    pub(crate) visiting_keys: HashSet<KeyId>,
    pub(crate) visiting_persons: HashSet<PersonId>,
    /// Number of branches skipped against the recursion stack so far.
    pub(crate) pruned: u64,
}

impl<'a> EvalCtx<'a> {
    pub(crate) fn new(
        store: &'a TrustStore,
        crypto: &'a dyn Crypto,
        roots: &'a BTreeSet<KeyId>,
        root_owner_keys: &'a BTreeSet<KeyId>,
        trust_cache: &'a mut HashMap<KeyId, KeyTrustInfo>,
        rights_cache: &'a mut HashMap<PersonId, PersonRights>,
    ) -> Self {
        Self {
            store,
            crypto,
            roots,
            root_owner_keys,
            trust_cache,
            rights_cache,
            visiting_keys: HashSet::new(),
            visiting_persons: HashSet::new(),
            pruned: 0,
        }
    }
}

/// Evaluate the trust verdict for a key. Entry point of a traversal.
pub(crate) fn evaluate_key(ctx: &mut EvalCtx<'_>, key: KeyId) -> KeyTrustInfo {
    if let Some(cached) = ctx.trust_cache.get(&key) {
        return cached.clone();
    }

    ctx.visiting_keys.insert(key);
    let info = key_trust_inner(ctx, key);
    ctx.visiting_keys.remove(&key);

    ctx.trust_cache.insert(key, info.clone());
    info
}

/// Rights of a person, memoized when computed context-free.
pub(crate) fn person_rights(ctx: &mut EvalCtx<'_>, person: &PersonId) -> PersonRights {
    if let Some(cached) = ctx.rights_cache.get(person) {
        return *cached;
    }

    if ctx.visiting_persons.contains(person) {
        ctx.pruned += 1;
        return PersonRights::none();
    }

    ctx.visiting_persons.insert(person.clone());
    let pruned_before = ctx.pruned;
    let rights = rights::compute_rights(ctx, person);
    ctx.visiting_persons.remove(person);

    if ctx.pruned == pruned_before {
        ctx.rights_cache.insert(person.clone(), rights);
    }
    rights
}

/// The recursive step. Callers must not invoke this on a key already in
/// `visiting_keys`; they skip such branches instead.
pub(crate) fn key_trust_inner(ctx: &mut EvalCtx<'_>, key: KeyId) -> KeyTrustInfo {
    if let Some(cached) = ctx.trust_cache.get(&key) {
        return cached.clone();
    }

    if ctx.roots.contains(&key) {
        let info = KeyTrustInfo::root(key);
        ctx.trust_cache.insert(key, info.clone());
        return info;
    }

    let candidates = ctx.store.endorsements_of(&key).to_vec();
    let pruned_before = ctx.pruned;

    let mut valid = 0usize;
    let mut invalid = 0usize;
    let mut cycle_only = 0usize;

    for cert_id in candidates.iter() {
        let Some(cert) = ctx.store.certificate(cert_id) else {
            continue;
        };

        // Re-validate at traversal time; loaded or corrupted state must
        // not produce trust.
        if validate_certificate(cert).is_err() {
            invalid += 1;
            continue;
        }
        valid += 1;

        let Ok(payload) = cert.decode_payload() else {
            continue;
        };
        let signer = payload.signer().clone();
        let Some(signature) = Signature::from_slice(&cert.signature) else {
            continue;
        };

        // Signer candidate keys that actually verify this certificate.
        let signer_keys = ctx.store.keys_of(&signer);
        let verified: Vec<KeyId> = signer_keys
            .iter()
            .copied()
            .filter(|k| {
                ctx.store
                    .resolve_key(k)
                    .map_or(false, |pk| ctx.crypto.verify(&cert.payload, &signature, pk))
            })
            .collect();
        if verified.is_empty() {
            continue;
        }

        // Endorsement scope: without the everybody-right a signer may only
        // endorse their own keys.
        let self_scope = signer_keys.contains(&key);
        if !person_rights(ctx, &signer).allows(self_scope) {
            continue;
        }

        let mut walked_any = false;
        for signer_key in verified {
            if ctx.visiting_keys.contains(&signer_key) {
                ctx.pruned += 1;
                continue;
            }
            walked_any = true;

            ctx.visiting_keys.insert(signer_key);
            let sub = key_trust_inner(ctx, signer_key);
            ctx.visiting_keys.remove(&signer_key);

            if sub.trusted {
                let info = KeyTrustInfo::endorsed(key, *cert_id, &sub.path);
                ctx.trust_cache.insert(key, info.clone());
                return info;
            }
        }
        if !walked_any {
            cycle_only += 1;
        }
    }

    let reason = if candidates.is_empty() {
        TrustReason::NoPath
    } else if valid == 0 && invalid > 0 {
        TrustReason::InvalidCertificate
    } else if valid > 0 && cycle_only == valid {
        TrustReason::CycleBroken
    } else {
        TrustReason::NoPath
    };
    let info = KeyTrustInfo::untrusted(key, reason);

    // An untrusted verdict reached with pruned branches below it is only
    // valid in this traversal's context; do not memoize it.
    if ctx.pruned == pruned_before {
        ctx.trust_cache.insert(key, info.clone());
    }
    info
}

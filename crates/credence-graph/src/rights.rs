//! Rights derivation: who may make endorsements effective, and for whom.
//!
//! Rights are derived state. A person holds a right iff they own a root
//! key (the axiom) or a structurally valid authority certificate names
//! them as grantee, verifies under a key of its grantor, and the grantor
//! has at least one trusted key. Expiration fields on authority payloads
//! are parsed and surfaced but not enforced.

use credence_core::certificate::{CertKind, CertPayload};
use credence_core::crypto::Signature;
use credence_core::types::PersonId;
use credence_core::validation::validate_certificate;
use credence_core::verdict::PersonRights;

use crate::evaluator::{key_trust_inner, EvalCtx};

/// Compute a person's rights from the store. Called through the memoizing
/// wrapper in the evaluator; do not call directly.
pub(crate) fn compute_rights(ctx: &mut EvalCtx<'_>, person: &PersonId) -> PersonRights {
    // Root owners hold both rights by axiom. The axiom consults the full
    // identity key set, not just the main identity.
    let keys = ctx.store.keys_of(person);
    if keys.iter().any(|k| ctx.root_owner_keys.contains(k)) {
        return PersonRights::all();
    }

    PersonRights {
        endorse_for_everybody: holds_authority(ctx, person, CertKind::EndorseForEverybody),
        endorse_for_self: holds_authority(ctx, person, CertKind::EndorseForSelf),
    }
}

fn holds_authority(ctx: &mut EvalCtx<'_>, grantee: &PersonId, kind: CertKind) -> bool {
    let candidates = ctx.store.certificates_for(grantee.as_str(), kind).to_vec();

    for cert_id in candidates {
        let Some(cert) = ctx.store.certificate(&cert_id) else {
            continue;
        };
        if validate_certificate(cert).is_err() {
            continue;
        }
        let Ok(CertPayload::Authority(payload)) = cert.decode_payload() else {
            continue;
        };
        let Some(signature) = Signature::from_slice(&cert.signature) else {
            continue;
        };

        // The grant must verify under a key of its grantor...
        let grantor_keys = ctx.store.keys_of(&payload.grantor);
        let signed = grantor_keys.iter().any(|k| {
            ctx.store
                .resolve_key(k)
                .map_or(false, |pk| ctx.crypto.verify(&cert.payload, &signature, pk))
        });
        if !signed {
            continue;
        }

        // ...and the grantor must have some trusted key.
        if person_has_trusted_key(ctx, &payload.grantor) {
            return true;
        }
    }
    false
}

fn person_has_trusted_key(ctx: &mut EvalCtx<'_>, person: &PersonId) -> bool {
    for key in ctx.store.keys_of(person) {
        if ctx.visiting_keys.contains(&key) {
            ctx.pruned += 1;
            continue;
        }

        ctx.visiting_keys.insert(key);
        let info = key_trust_inner(ctx, key);
        ctx.visiting_keys.remove(&key);

        if info.trusted {
            return true;
        }
    }
    false
}

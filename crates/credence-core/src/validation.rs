//! Structural validation: the admission gate for external records.
//!
//! Validation here is deliberately cheap: hash invariants and payload
//! decodability. Signature verification belongs to the traversal layer,
//! which lets bulk ingest happen before a root set is even known.

use crate::certificate::{decode_payload, CertKind, Certificate};
use crate::crypto::Sha256Hash;
use crate::error::ValidationError;
use crate::profile::Profile;

/// Validate a certificate's structure.
///
/// This performs:
/// - `payload_hash == H(payload)`
/// - `signature_hash == H(signature)`
/// - payload decodes as a record of the declared kind
/// - a TrustKeys payload names a well-formed endorsed key
pub fn validate_certificate(cert: &Certificate) -> Result<(), ValidationError> {
    if Sha256Hash::digest(&cert.payload) != cert.payload_hash {
        return Err(ValidationError::HashMismatch {
            field: "payload_hash",
        });
    }

    if Sha256Hash::digest(&cert.signature) != cert.signature_hash {
        return Err(ValidationError::HashMismatch {
            field: "signature_hash",
        });
    }

    let payload = decode_payload(cert.kind, &cert.payload)?;

    if cert.kind == CertKind::TrustKeys && payload.endorsed_key().is_none() {
        return Err(ValidationError::MalformedPayload(
            "trust-keys payload without endorsed key".into(),
        ));
    }

    Ok(())
}

/// Validate a profile's structure.
pub fn validate_profile(profile: &Profile) -> Result<(), ValidationError> {
    if profile.profile_id.as_str().is_empty() {
        return Err(ValidationError::MalformedProfile("empty profile_id".into()));
    }
    if profile.person_id.as_str().is_empty() {
        return Err(ValidationError::MalformedProfile("empty person_id".into()));
    }
    Ok(())
}

//! Proptest generators for property-based testing.

use proptest::prelude::*;

use bytes::Bytes;
use credence_core::certificate::{CertKind, Certificate, TrustKeysPayload};
use credence_core::crypto::{Keypair, Sha256Hash};
use credence_core::types::{CertId, KeyId, PersonId};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random KeyId.
pub fn key_id() -> impl Strategy<Value = KeyId> {
    any::<[u8; 32]>().prop_map(KeyId::from_bytes)
}

/// Generate a random CertId.
pub fn cert_id() -> impl Strategy<Value = CertId> {
    any::<[u8; 32]>().prop_map(CertId::from_bytes)
}

/// Generate a person id.
pub fn person_id() -> impl Strategy<Value = PersonId> {
    "[a-z][a-z0-9-]{0,15}".prop_map(PersonId::new)
}

/// Generate a certificate kind.
pub fn cert_kind() -> impl Strategy<Value = CertKind> {
    prop_oneof![
        Just(CertKind::Affirmation),
        Just(CertKind::TrustKeys),
        Just(CertKind::EndorseForEverybody),
        Just(CertKind::EndorseForSelf),
    ]
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = u64> {
    0u64..=1_900_000_000_000
}

/// Generate a signed, structurally valid TrustKeys certificate.
pub fn trust_keys_certificate() -> impl Strategy<Value = Certificate> {
    (any::<[u8; 32]>(), person_id(), key_id(), timestamp()).prop_map(
        |(seed, signer, endorsed, ts)| {
            let keypair = Keypair::from_seed(&seed);
            let payload = TrustKeysPayload {
                signer,
                endorsed_key: endorsed,
            }
            .to_bytes();
            let signature = Bytes::copy_from_slice(keypair.sign(&payload).as_bytes());

            let mut cert = Certificate {
                cert_id: CertId::from_bytes([0; 32]),
                kind: CertKind::TrustKeys,
                payload_hash: Sha256Hash::digest(&payload),
                signature_hash: Sha256Hash::digest(&signature),
                payload,
                signature,
                timestamp: ts,
                trusted: false,
                endorsed_key: None,
            };
            cert.cert_id = cert.compute_id();
            cert
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use credence_core::canonical::{certificate_wire_bytes, decode_certificate};
    use credence_core::validation::validate_certificate;

    proptest! {
        #[test]
        fn test_generated_certificates_validate(cert in trust_keys_certificate()) {
            prop_assert!(validate_certificate(&cert).is_ok());
        }

        #[test]
        fn test_wire_roundtrip_is_exact(cert in trust_keys_certificate()) {
            let bytes = certificate_wire_bytes(&cert);
            let decoded = decode_certificate(&bytes).unwrap();
            prop_assert_eq!(certificate_wire_bytes(&decoded), bytes);
            prop_assert_eq!(decoded.payload_hash, cert.payload_hash);
            prop_assert_eq!(decoded.signature_hash, cert.signature_hash);
        }

        #[test]
        fn test_cert_id_is_content_derived(cert in trust_keys_certificate()) {
            prop_assert_eq!(cert.cert_id, cert.compute_id());
        }
    }
}

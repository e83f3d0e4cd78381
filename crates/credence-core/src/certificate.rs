//! Certificate: an immutable, signed trust declaration.
//!
//! Once created a certificate is never edited. Updated trust is expressed
//! by issuing new certificates.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::crypto::Sha256Hash;
use crate::error::ValidationError;
use crate::types::{CertId, KeyId, PersonId};

/// Domain separation prefix for certificate id derivation.
pub const CERT_ID_DOMAIN: &[u8] = b"credence/cert-id/v0";

/// The kind of certificate, determining how the payload is interpreted.
///
/// The wire encoding is a `u8`; dispatch on the decoded kind is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CertKind {
    /// Basic signed assertion about a subject.
    Affirmation = 0,
    /// Declares a named key trusted by the signer.
    TrustKeys = 1,
    /// Grants the grantee the right to endorse keys for anybody.
    EndorseForEverybody = 2,
    /// Grants the grantee the right to endorse their own keys.
    EndorseForSelf = 3,
}

impl CertKind {
    /// Convert to u8 for serialization.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Affirmation),
            1 => Some(Self::TrustKeys),
            2 => Some(Self::EndorseForEverybody),
            3 => Some(Self::EndorseForSelf),
            _ => None,
        }
    }

    /// Check if this kind grants endorsement authority.
    pub fn is_authority(self) -> bool {
        matches!(self, Self::EndorseForEverybody | Self::EndorseForSelf)
    }
}

/// Payload of a TrustKeys certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustKeysPayload {
    /// The person making the endorsement.
    #[serde(rename = "signer_person_id")]
    pub signer: PersonId,

    /// The key being declared trusted.
    #[serde(rename = "endorsed_key_id")]
    pub endorsed_key: KeyId,
}

/// Payload of an endorsement-authority certificate (both scopes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityPayload {
    /// The person granting the right.
    #[serde(rename = "grantor_person_id")]
    pub grantor: PersonId,

    /// The person receiving the right.
    #[serde(rename = "grantee_person_id")]
    pub grantee: PersonId,

    /// Expiration timestamp. Parsed and surfaced but not enforced; trust
    /// evaluation ignores it until a time capability exists.
    pub expiration: Option<u64>,
}

/// Payload of an Affirmation certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffirmationPayload {
    /// The person making the affirmation.
    #[serde(rename = "signer_person_id")]
    pub signer: PersonId,

    /// What the affirmation is about (person, key, or object id).
    pub subject: String,

    /// Free-form claims, e.g. ("role", "operator").
    pub claims: Vec<(String, String)>,
}

/// A decoded certificate payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertPayload {
    Affirmation(AffirmationPayload),
    TrustKeys(TrustKeysPayload),
    Authority(AuthorityPayload),
}

impl CertPayload {
    /// The person whose keys must verify the certificate signature.
    pub fn signer(&self) -> &PersonId {
        match self {
            CertPayload::Affirmation(p) => &p.signer,
            CertPayload::TrustKeys(p) => &p.signer,
            CertPayload::Authority(p) => &p.grantor,
        }
    }

    /// The index subject the certificate is filed under.
    ///
    /// TrustKeys certificates index under the endorsed key, authority
    /// certificates under the grantee, affirmations under their subject.
    pub fn subject(&self) -> String {
        match self {
            CertPayload::Affirmation(p) => p.subject.clone(),
            CertPayload::TrustKeys(p) => p.endorsed_key.to_hex(),
            CertPayload::Authority(p) => p.grantee.as_str().to_string(),
        }
    }

    /// The endorsed key, for TrustKeys payloads.
    pub fn endorsed_key(&self) -> Option<KeyId> {
        match self {
            CertPayload::TrustKeys(p) => Some(p.endorsed_key),
            _ => None,
        }
    }
}

macro_rules! cbor_payload {
    ($ty:ty) => {
        impl $ty {
            /// Serialize to CBOR bytes.
            pub fn to_bytes(&self) -> Bytes {
                let mut buf = Vec::new();
                ciborium::into_writer(self, &mut buf).expect("CBOR serialization failed");
                Bytes::from(buf)
            }

            /// Deserialize from CBOR bytes.
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
                ciborium::from_reader(bytes)
                    .map_err(|e| ValidationError::MalformedPayload(e.to_string()))
            }
        }
    };
}

cbor_payload!(TrustKeysPayload);
cbor_payload!(AuthorityPayload);
cbor_payload!(AffirmationPayload);

/// An immutable trust certificate.
///
/// The two hash fields are invariants: `payload_hash == H(payload)` and
/// `signature_hash == H(signature)` must hold for every admitted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// Certificate identifier. Content-derived for local issuance.
    pub cert_id: CertId,

    /// Payload discriminator.
    pub kind: CertKind,

    /// The declaration bytes, encoded per `kind`.
    pub payload: Bytes,

    /// Signature over the payload by one of the signer's keys.
    pub signature: Bytes,

    /// SHA-256 of `payload`.
    pub payload_hash: Sha256Hash,

    /// SHA-256 of `signature`.
    pub signature_hash: Sha256Hash,

    /// Issuance wall-clock, milliseconds. Stored, never used to expire.
    pub timestamp: u64,

    /// Local admission intent. Never consulted by chain evaluation.
    pub trusted: bool,

    /// Back-link to the endorsed key, derived from the payload at intake
    /// for TrustKeys certificates. Never taken from peer wire data.
    pub endorsed_key: Option<KeyId>,
}

impl Certificate {
    /// Decode the payload as a record of the declared kind.
    pub fn decode_payload(&self) -> Result<CertPayload, ValidationError> {
        decode_payload(self.kind, &self.payload)
    }

    /// The person whose keys must verify this certificate.
    pub fn signer(&self) -> Result<PersonId, ValidationError> {
        Ok(self.decode_payload()?.signer().clone())
    }

    /// Compute the content-derived identifier over the signed content.
    pub fn compute_id(&self) -> CertId {
        let content = crate::canonical::certificate_content_bytes(
            self.kind,
            &self.payload,
            &self.signature,
            self.timestamp,
        );
        let mut input = Vec::with_capacity(CERT_ID_DOMAIN.len() + content.len());
        input.extend_from_slice(CERT_ID_DOMAIN);
        input.extend_from_slice(&content);
        CertId(Sha256Hash::digest(&input).0)
    }
}

/// Decode payload bytes as a record of the given kind.
pub fn decode_payload(kind: CertKind, payload: &[u8]) -> Result<CertPayload, ValidationError> {
    match kind {
        CertKind::Affirmation => Ok(CertPayload::Affirmation(AffirmationPayload::from_bytes(
            payload,
        )?)),
        CertKind::TrustKeys => Ok(CertPayload::TrustKeys(TrustKeysPayload::from_bytes(
            payload,
        )?)),
        CertKind::EndorseForEverybody | CertKind::EndorseForSelf => Ok(CertPayload::Authority(
            AuthorityPayload::from_bytes(payload)?,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            CertKind::Affirmation,
            CertKind::TrustKeys,
            CertKind::EndorseForEverybody,
            CertKind::EndorseForSelf,
        ] {
            assert_eq!(CertKind::from_u8(kind.to_u8()), Some(kind));
        }
        assert_eq!(CertKind::from_u8(4), None);
    }

    #[test]
    fn test_trust_keys_payload_roundtrip() {
        let payload = TrustKeysPayload {
            signer: PersonId::new("alice"),
            endorsed_key: KeyId::from_bytes([0xab; 32]),
        };
        let bytes = payload.to_bytes();
        let recovered = TrustKeysPayload::from_bytes(&bytes).unwrap();
        assert_eq!(payload, recovered);
    }

    #[test]
    fn test_authority_payload_expiration_optional() {
        let payload = AuthorityPayload {
            grantor: PersonId::new("root"),
            grantee: PersonId::new("alice"),
            expiration: None,
        };
        let recovered = AuthorityPayload::from_bytes(&payload.to_bytes()).unwrap();
        assert_eq!(recovered.expiration, None);

        let with_exp = AuthorityPayload {
            expiration: Some(1_900_000_000_000),
            ..payload
        };
        let recovered = AuthorityPayload::from_bytes(&with_exp.to_bytes()).unwrap();
        assert_eq!(recovered.expiration, Some(1_900_000_000_000));
    }

    #[test]
    fn test_decode_payload_wrong_kind_fails() {
        let payload = TrustKeysPayload {
            signer: PersonId::new("alice"),
            endorsed_key: KeyId::from_bytes([0xab; 32]),
        };
        // TrustKeys bytes do not decode as an authority record
        assert!(decode_payload(CertKind::EndorseForSelf, &payload.to_bytes()).is_err());
    }

    #[test]
    fn test_payload_subject() {
        let key = KeyId::from_bytes([0x11; 32]);
        let p = CertPayload::TrustKeys(TrustKeysPayload {
            signer: PersonId::new("alice"),
            endorsed_key: key,
        });
        assert_eq!(p.subject(), key.to_hex());
        assert_eq!(p.endorsed_key(), Some(key));

        let a = CertPayload::Authority(AuthorityPayload {
            grantor: PersonId::new("root"),
            grantee: PersonId::new("bob"),
            expiration: None,
        });
        assert_eq!(a.subject(), "bob");
        assert_eq!(a.signer(), &PersonId::new("root"));
    }
}

//! Local certificate issuance.

use bytes::Bytes;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use credence_core::certificate::{
    AffirmationPayload, AuthorityPayload, CertKind, Certificate, TrustKeysPayload,
};
use credence_core::crypto::{Crypto, Keypair, Sha256Hash};
use credence_core::types::{CertId, KeyId, PersonId};

use crate::Result;

/// Issues certificates under this node's identity.
pub struct Issuer {
    person: PersonId,
    keypair: Keypair,
    crypto: Arc<dyn Crypto>,
}

impl Issuer {
    pub fn new(person: impl Into<PersonId>, keypair: Keypair, crypto: Arc<dyn Crypto>) -> Self {
        Self {
            person: person.into(),
            keypair,
            crypto,
        }
    }

    /// The issuing person.
    pub fn person(&self) -> &PersonId {
        &self.person
    }

    /// The issuing keypair's public half.
    pub fn public_key(&self) -> credence_core::crypto::PublicKey {
        self.keypair.public_key()
    }

    /// Issue a certificate of the given kind over prepared payload bytes.
    ///
    /// Signs via the crypto capability, fills both content hashes, stamps
    /// the current wall-clock, and marks the record locally trusted. The
    /// id is derived from the signed content, so issuance is
    /// deterministic up to the signature.
    pub fn certify(&self, kind: CertKind, payload: impl Into<Bytes>) -> Result<Certificate> {
        let payload = payload.into();
        let signature = self.crypto.sign(&payload, &self.keypair)?;
        let signature = Bytes::copy_from_slice(signature.as_bytes());

        let mut cert = Certificate {
            cert_id: CertId::from_bytes([0; 32]),
            kind,
            payload_hash: Sha256Hash::digest(&payload),
            signature_hash: Sha256Hash::digest(&signature),
            payload,
            signature,
            timestamp: now_millis(),
            trusted: true,
            endorsed_key: None,
        };
        cert.cert_id = cert.compute_id();
        if kind == CertKind::TrustKeys {
            cert.endorsed_key = cert.decode_payload().ok().and_then(|p| p.endorsed_key());
        }
        Ok(cert)
    }

    /// Issue a TrustKeys endorsement of the given key.
    pub fn endorse_key(&self, key: KeyId) -> Result<Certificate> {
        let payload = TrustKeysPayload {
            signer: self.person.clone(),
            endorsed_key: key,
        };
        self.certify(CertKind::TrustKeys, payload.to_bytes())
    }

    /// Grant a person the right to endorse keys for anybody.
    pub fn grant_everybody(&self, grantee: impl Into<PersonId>) -> Result<Certificate> {
        let payload = AuthorityPayload {
            grantor: self.person.clone(),
            grantee: grantee.into(),
            expiration: None,
        };
        self.certify(CertKind::EndorseForEverybody, payload.to_bytes())
    }

    /// Grant a person the right to endorse their own keys.
    pub fn grant_self(&self, grantee: impl Into<PersonId>) -> Result<Certificate> {
        let payload = AuthorityPayload {
            grantor: self.person.clone(),
            grantee: grantee.into(),
            expiration: None,
        };
        self.certify(CertKind::EndorseForSelf, payload.to_bytes())
    }

    /// Issue an affirmation about a subject.
    pub fn affirm(
        &self,
        subject: impl Into<String>,
        claims: Vec<(String, String)>,
    ) -> Result<Certificate> {
        let payload = AffirmationPayload {
            signer: self.person.clone(),
            subject: subject.into(),
            claims,
        };
        self.certify(CertKind::Affirmation, payload.to_bytes())
    }

    /// Sign arbitrary payload bytes with the local key.
    pub fn sign(&self, payload: &[u8]) -> Result<Bytes> {
        let signature = self.crypto.sign(payload, &self.keypair)?;
        Ok(Bytes::copy_from_slice(signature.as_bytes()))
    }
}

/// Get current time in milliseconds.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use credence_core::crypto::StdCrypto;
    use credence_core::validation::validate_certificate;

    fn issuer() -> Issuer {
        Issuer::new(
            "alice",
            Keypair::from_seed(&[0x11; 32]),
            Arc::new(StdCrypto::new()),
        )
    }

    #[test]
    fn test_issued_certificate_is_structurally_valid() {
        let cert = issuer().endorse_key(KeyId::from_bytes([0xab; 32])).unwrap();
        assert!(validate_certificate(&cert).is_ok());
        assert_eq!(cert.kind, CertKind::TrustKeys);
        assert!(cert.trusted);
        assert_eq!(cert.endorsed_key, Some(KeyId::from_bytes([0xab; 32])));
        assert_eq!(cert.cert_id, cert.compute_id());
    }

    #[test]
    fn test_grant_names_grantee() {
        let cert = issuer().grant_everybody("bob").unwrap();
        let payload = cert.decode_payload().unwrap();
        assert_eq!(payload.subject(), "bob");
        assert_eq!(payload.signer().as_str(), "alice");
    }

    #[test]
    fn test_affirmation_carries_claims() {
        let cert = issuer()
            .affirm("device-7", vec![("role".into(), "operator".into())])
            .unwrap();
        assert!(validate_certificate(&cert).is_ok());
        assert_eq!(cert.kind, CertKind::Affirmation);
    }
}

//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: deterministic parties with
//! keypairs, profile and certificate builders, and a pre-wired graph.

use std::sync::Arc;

use credence_core::certificate::Certificate;
use credence_core::crypto::{Keypair, PublicKey, StdCrypto};
use credence_core::profile::Profile;
use credence_core::types::{KeyId, PersonId};
use credence_graph::{Issuer, StaticRoots, TrustGraph};

/// A test participant: a person with one keypair and an issuer over it.
pub struct Party {
    pub person: PersonId,
    pub keypair: Keypair,
    issuer: Issuer,
}

impl Party {
    /// Create a party with a deterministic keypair derived from its name.
    pub fn new(name: &str) -> Self {
        let mut seed = [0u8; 32];
        let bytes = name.as_bytes();
        seed[..bytes.len().min(32)].copy_from_slice(&bytes[..bytes.len().min(32)]);
        Self::with_seed(name, seed)
    }

    /// Create a party with an explicit seed.
    pub fn with_seed(name: &str, seed: [u8; 32]) -> Self {
        let keypair = Keypair::from_seed(&seed);
        let issuer = Issuer::new(name, keypair.clone(), Arc::new(StdCrypto::new()));
        Self {
            person: PersonId::new(name),
            keypair,
            issuer,
        }
    }

    /// The party's public key.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// The content-address of the party's key.
    pub fn key_id(&self) -> KeyId {
        self.keypair.key_id()
    }

    /// A profile declaring this party's key, authored by the party.
    pub fn profile(&self, timestamp: u64) -> Profile {
        Profile::new(
            format!("profile-{}", self.person.as_str()),
            self.person.as_str(),
            timestamp,
        )
        .with_key(self.key_id())
    }

    /// Endorse another key via a TrustKeys certificate.
    pub fn endorse(&self, key: KeyId) -> Certificate {
        self.issuer.endorse_key(key).expect("issuance")
    }

    /// Grant the everybody-endorsement right to a person.
    pub fn grant_everybody(&self, grantee: &Party) -> Certificate {
        self.issuer
            .grant_everybody(grantee.person.as_str())
            .expect("issuance")
    }

    /// Grant the self-endorsement right to a person.
    pub fn grant_self(&self, grantee: &Party) -> Certificate {
        self.issuer
            .grant_self(grantee.person.as_str())
            .expect("issuance")
    }

    /// Affirm a subject with claims.
    pub fn affirm(&self, subject: &str, claims: &[(&str, &str)]) -> Certificate {
        let claims = claims
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.issuer.affirm(subject, claims).expect("issuance")
    }

    /// Sign arbitrary bytes with the party's key.
    pub fn sign(&self, payload: &[u8]) -> bytes::Bytes {
        self.issuer.sign(payload).expect("signing")
    }
}

/// Create distinct parties named `p0`, `p1`, ...
pub fn parties(count: usize) -> Vec<Party> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[1] = 0xc7;
            Party::with_seed(&format!("p{i}"), seed)
        })
        .collect()
}

/// A graph pre-wired with a set of parties: each party's key material and
/// profile are admitted, and the listed roots form the static root set.
pub struct TestNet {
    pub graph: TrustGraph,
}

impl TestNet {
    /// Build a graph where `root_parties` keys are roots and every party
    /// in `all` has its profile and key material admitted.
    pub fn new(root_parties: &[&Party], all: &[&Party]) -> Self {
        let roots = StaticRoots::new(root_parties.iter().map(|p| p.key_id()));
        let mut graph = TrustGraph::new(Arc::new(StdCrypto::new()), Arc::new(roots));

        for party in all {
            graph.admit_key(party.public_key());
            graph
                .admit_profile(party.profile(1_000))
                .expect("profile admission");
        }
        Self { graph }
    }
}

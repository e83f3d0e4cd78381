//! # Credence Core
//!
//! Pure primitives for the credence trust core: certificates, profiles,
//! identifiers, and canonical encoding.
//!
//! This crate contains no I/O and no mutable state. It is pure computation
//! over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`Certificate`] - An immutable, signed trust declaration
//! - [`Profile`] - A person's declaration of owned keys and certificates
//! - [`KeyId`] / [`CertId`] - Content-addressed identifiers (SHA-256)
//! - [`CertKind`] - Discriminator for payload interpretation
//! - [`Crypto`] - The capability trait for signing and verification
//!
//! ## Canonical Encoding
//!
//! Wire and storage records use deterministic CBOR with string keys so
//! records stay self-describing. See the [`canonical`] module.

pub mod artifact;
pub mod canonical;
pub mod certificate;
pub mod crypto;
pub mod error;
pub mod profile;
pub mod types;
pub mod validation;
pub mod verdict;

pub use artifact::SignedArtifact;
pub use canonical::{certificate_record_bytes, certificate_wire_bytes, decode_certificate, decode_profile, profile_record_bytes};
pub use certificate::{
    AffirmationPayload, AuthorityPayload, CertKind, CertPayload, Certificate, TrustKeysPayload,
};
pub use crypto::{Crypto, CryptoError, Keypair, PublicKey, Sha256Hash, Signature, StdCrypto};
pub use error::{CoreError, ValidationError};
pub use profile::Profile;
pub use types::{CertId, KeyId, PersonId, ProfileId};
pub use validation::{validate_certificate, validate_profile};
pub use verdict::{KeyTrustInfo, PersonRights, TrustReason};

//! Cryptographic primitives and the crypto capability.
//!
//! Wraps Ed25519 signing and SHA-256 hashing with strong types. The
//! [`Crypto`] trait is the seam the rest of the system verifies through;
//! [`StdCrypto`] is the provided software implementation.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

use crate::types::KeyId;

/// A 32-byte SHA-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sha256Hash(pub [u8; 32]);

impl Sha256Hash {
    /// Compute the SHA-256 hash of the given data.
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The zero hash (sentinel value).
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Sha256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Sha256Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The content-address of this key.
    pub fn key_id(&self) -> KeyId {
        KeyId::of(&self.0)
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Parse from a byte slice; fails unless exactly 64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 64] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 64]> for Signature {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

/// A keypair for issuing certificates and signing artifacts.
///
/// This wraps ed25519-dalek's SigningKey.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let signing_key = SigningKey::generate(&mut rng);
        Self { signing_key }
    }

    /// Create from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        Self { signing_key }
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().to_bytes())
    }

    /// The content-address of the public half.
    pub fn key_id(&self) -> KeyId {
        self.public_key().key_id()
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let sig = self.signing_key.sign(message);
        Signature(sig.to_bytes())
    }

    /// Get the raw seed bytes (secret key material).
    pub fn seed(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({:?})", self.public_key())
    }
}

/// Error from a crypto capability.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The capability cannot perform the operation (e.g. a hardware
    /// element is offline). Fatal for the calling operation.
    #[error("crypto capability unavailable: {0}")]
    Unavailable(String),
}

/// The crypto capability consumed by the trust core.
///
/// Implementations must be total in `verify`: a bad signature, key, or
/// payload returns `false`, never panics. `sign` may be deterministic or
/// randomized; callers must not assume determinism.
pub trait Crypto: Send + Sync {
    /// Collision-resistant hash with fixed 32-byte output.
    fn hash(&self, data: &[u8]) -> Sha256Hash {
        Sha256Hash::digest(data)
    }

    /// Sign a payload with the given keypair.
    fn sign(&self, payload: &[u8], key: &Keypair) -> Result<Signature, CryptoError>;

    /// Verify a signature over a payload. Total; never errors.
    fn verify(&self, payload: &[u8], signature: &Signature, key: &PublicKey) -> bool;

    /// Generate a fresh keypair.
    fn generate_keypair(&self) -> Result<Keypair, CryptoError>;

    /// Fill a buffer with cryptographically secure random bytes.
    fn random(&self, n: usize) -> Vec<u8>;
}

/// Software crypto provider backed by ed25519-dalek and the OS RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdCrypto;

impl StdCrypto {
    pub fn new() -> Self {
        Self
    }
}

impl Crypto for StdCrypto {
    fn sign(&self, payload: &[u8], key: &Keypair) -> Result<Signature, CryptoError> {
        Ok(key.sign(payload))
    }

    fn verify(&self, payload: &[u8], signature: &Signature, key: &PublicKey) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&key.0) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
        verifying_key.verify(payload, &sig).is_ok()
    }

    fn generate_keypair(&self) -> Result<Keypair, CryptoError> {
        Ok(Keypair::generate())
    }

    fn random(&self, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        rand::thread_rng().fill_bytes(&mut buf);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let crypto = StdCrypto::new();
        let keypair = Keypair::generate();
        let message = b"hello world";
        let signature = crypto.sign(message, &keypair).unwrap();

        assert!(crypto.verify(message, &signature, &keypair.public_key()));

        // Tampered message must fail, not panic
        assert!(!crypto.verify(b"hello worlD", &signature, &keypair.public_key()));
    }

    #[test]
    fn test_verify_garbage_key_is_total() {
        let crypto = StdCrypto::new();
        let sig = Signature::from_bytes([0xff; 64]);
        // An arbitrary 32-byte string may not be a valid curve point
        let key = PublicKey::from_bytes([0xee; 32]);
        assert!(!crypto.verify(b"data", &sig, &key));
    }

    #[test]
    fn test_keypair_deterministic_from_seed() {
        let seed = [0x42u8; 32];
        let kp1 = Keypair::from_seed(&seed);
        let kp2 = Keypair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.key_id(), kp2.key_id());
    }

    #[test]
    fn test_sha256_hash() {
        let h1 = Sha256Hash::digest(b"test data");
        let h2 = Sha256Hash::digest(b"test data");
        assert_eq!(h1, h2);
        assert_ne!(h1, Sha256Hash::digest(b"different data"));
    }

    #[test]
    fn test_random_len() {
        let crypto = StdCrypto::new();
        assert_eq!(crypto.random(16).len(), 16);
        assert_ne!(crypto.random(32), crypto.random(32));
    }

    #[test]
    fn test_signature_from_slice() {
        assert!(Signature::from_slice(&[0u8; 64]).is_some());
        assert!(Signature::from_slice(&[0u8; 63]).is_none());
    }
}

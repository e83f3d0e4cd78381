//! Sealed slot envelopes.
//!
//! Every stored slot is `body || SHA-256(body)`. The trailing digest is a
//! self-check: a slot that fails it on load is treated as corrupt and
//! skipped, it never reaches a decoder.

use bytes::Bytes;

use credence_core::crypto::Sha256Hash;

use crate::error::{Result, StoreError};

const DIGEST_LEN: usize = 32;

/// Seal a record body into envelope bytes.
pub fn seal_slot(body: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(body.len() + DIGEST_LEN);
    buf.extend_from_slice(body);
    buf.extend_from_slice(Sha256Hash::digest(body).as_bytes());
    buf
}

/// Open envelope bytes, verifying the self-check.
pub fn open_slot(bytes: &[u8]) -> Result<Bytes> {
    if bytes.len() < DIGEST_LEN {
        return Err(StoreError::CorruptSlot("short envelope".into()));
    }
    let (body, digest) = bytes.split_at(bytes.len() - DIGEST_LEN);
    if Sha256Hash::digest(body).as_bytes() != digest {
        return Err(StoreError::CorruptSlot("digest mismatch".into()));
    }
    Ok(Bytes::copy_from_slice(body))
}

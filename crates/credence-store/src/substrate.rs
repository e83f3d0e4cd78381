//! Substrate trait: the abstract interface for slot storage.
//!
//! A substrate is a flat namespace of named slots. Writes are atomic per
//! slot; there are no multi-slot transactions. Implementations include a
//! directory-backed store (primary) and an in-memory store (for tests).

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// Characters allowed in slot names, beyond ASCII alphanumerics.
const SLOT_NAME_EXTRA: &[char] = &['/', '-', '_', '.'];

/// The Substrate trait: async interface for slot storage.
#[async_trait]
pub trait Substrate: Send + Sync {
    /// Read a slot. Returns `None` when the slot does not exist.
    async fn read(&self, slot: &str) -> Result<Option<Bytes>>;

    /// Write a slot atomically, replacing any previous content.
    async fn write(&self, slot: &str, bytes: &[u8]) -> Result<()>;

    /// List slot names starting with the given prefix.
    async fn enumerate(&self, prefix: &str) -> Result<Vec<String>>;

    /// Remove a slot. Removing a missing slot is not an error.
    async fn remove(&self, slot: &str) -> Result<()>;
}

#[async_trait]
impl<S: Substrate + ?Sized> Substrate for std::sync::Arc<S> {
    async fn read(&self, slot: &str) -> Result<Option<Bytes>> {
        (**self).read(slot).await
    }

    async fn write(&self, slot: &str, bytes: &[u8]) -> Result<()> {
        (**self).write(slot, bytes).await
    }

    async fn enumerate(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).enumerate(prefix).await
    }

    async fn remove(&self, slot: &str) -> Result<()> {
        (**self).remove(slot).await
    }
}

/// Whether a slot name is storable by every substrate.
pub fn valid_slot_name(slot: &str) -> bool {
    !slot.is_empty()
        && !slot.starts_with('/')
        && !slot.ends_with('/')
        && !slot.contains("//")
        && !slot.contains("..")
        && slot
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SLOT_NAME_EXTRA.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_name_validation() {
        assert!(valid_slot_name("cert/ab12"));
        assert!(valid_slot_name("rights"));
        assert!(valid_slot_name("profile/70726f66"));

        assert!(!valid_slot_name(""));
        assert!(!valid_slot_name("/cert"));
        assert!(!valid_slot_name("cert/"));
        assert!(!valid_slot_name("cert//x"));
        assert!(!valid_slot_name("../escape"));
        assert!(!valid_slot_name("cert ab"));
    }
}

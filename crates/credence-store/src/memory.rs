//! In-memory implementation of the Substrate trait.
//!
//! This is primarily for testing. It has the same semantics as the
//! directory substrate but keeps everything in memory.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::substrate::{valid_slot_name, Substrate};

/// In-memory substrate. All data is lost when the value is dropped.
#[derive(Default)]
pub struct MemorySubstrate {
    slots: RwLock<BTreeMap<String, Bytes>>,
}

impl MemorySubstrate {
    /// Create a new empty substrate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored slots.
    pub fn len(&self) -> usize {
        self.slots.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite a slot's raw bytes without sealing, for corruption tests.
    pub fn corrupt(&self, slot: &str, bytes: &[u8]) {
        self.slots
            .write()
            .unwrap()
            .insert(slot.to_string(), Bytes::copy_from_slice(bytes));
    }
}

#[async_trait]
impl Substrate for MemorySubstrate {
    async fn read(&self, slot: &str) -> Result<Option<Bytes>> {
        Ok(self.slots.read().unwrap().get(slot).cloned())
    }

    async fn write(&self, slot: &str, bytes: &[u8]) -> Result<()> {
        if !valid_slot_name(slot) {
            return Err(StoreError::InvalidSlotName(slot.to_string()));
        }
        self.slots
            .write()
            .unwrap()
            .insert(slot.to_string(), Bytes::copy_from_slice(bytes));
        Ok(())
    }

    async fn enumerate(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .slots
            .read()
            .unwrap()
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn remove(&self, slot: &str) -> Result<()> {
        self.slots.write().unwrap().remove(slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_write_roundtrip() {
        let substrate = MemorySubstrate::new();
        substrate.write("cert/aa", b"hello").await.unwrap();

        let read = substrate.read("cert/aa").await.unwrap().unwrap();
        assert_eq!(read.as_ref(), b"hello");
        assert!(substrate.read("cert/bb").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_enumerate_by_prefix() {
        let substrate = MemorySubstrate::new();
        substrate.write("cert/aa", b"1").await.unwrap();
        substrate.write("cert/bb", b"2").await.unwrap();
        substrate.write("profile/cc", b"3").await.unwrap();

        let certs = substrate.enumerate("cert/").await.unwrap();
        assert_eq!(certs, vec!["cert/aa".to_string(), "cert/bb".to_string()]);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let substrate = MemorySubstrate::new();
        substrate.write("rights", b"x").await.unwrap();
        substrate.remove("rights").await.unwrap();
        substrate.remove("rights").await.unwrap();
        assert!(substrate.read("rights").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_slot_name_rejected() {
        let substrate = MemorySubstrate::new();
        assert!(matches!(
            substrate.write("../escape", b"x").await,
            Err(StoreError::InvalidSlotName(_))
        ));
    }
}

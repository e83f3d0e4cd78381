//! Graph persistence: the save/load state machine over a substrate.
//!
//! Layout under one namespace:
//! - `cert/<seq>-<cert_id>`: one sealed record per certificate; the
//!   zero-padded sequence prefix preserves admission order across loads
//! - `profile/<hex(profile_id)>`: one sealed record per current profile
//! - `key/<key_id>`: admitted public key material
//! - `rights`: aggregate snapshot of the derived person-to-rights map
//!
//! Every slot is sealed with a trailing self-check digest. Loading skips
//! any slot that fails its check or does not decode, reports the count,
//! and continues; a corrupt slot is never fatal. After a load the graph's
//! indices are rebuilt and its caches invalidated, so the first query
//! recomputes from sources.

use std::collections::BTreeMap;

use credence_core::canonical::{certificate_record_bytes, decode_certificate, decode_profile, profile_record_bytes};
use credence_core::crypto::PublicKey;
use credence_core::types::PersonId;
use credence_core::verdict::PersonRights;
use credence_graph::TrustGraph;

use crate::envelope::{open_slot, seal_slot};
use crate::error::{Result, StoreError};
use crate::substrate::Substrate;

const CERT_PREFIX: &str = "cert/";
const PROFILE_PREFIX: &str = "profile/";
const KEY_PREFIX: &str = "key/";
const RIGHTS_SLOT: &str = "rights";

/// Lifecycle of a stored graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistState {
    /// Nothing admitted, nothing stored.
    Empty,
    /// In-memory state has admissions not yet saved.
    Dirty,
    /// Durable state matches in-memory state.
    Clean,
}

/// What a load found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub certificates: usize,
    pub profiles: usize,
    pub keys: usize,
    /// Slots skipped for failing their self-check or not decoding.
    pub skipped: usize,
}

/// Owns the substrate and tracks the save/load state machine.
pub struct GraphPersistence<S: Substrate> {
    substrate: S,
    state: PersistState,
}

impl<S: Substrate> GraphPersistence<S> {
    /// Wrap a substrate; the stored graph starts `Empty` until loaded or
    /// marked dirty.
    pub fn new(substrate: S) -> Self {
        Self {
            substrate,
            state: PersistState::Empty,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PersistState {
        self.state
    }

    /// The wrapped substrate.
    pub fn substrate(&self) -> &S {
        &self.substrate
    }

    /// Record that in-memory state has diverged from durable state.
    pub fn mark_dirty(&mut self) {
        self.state = PersistState::Dirty;
    }

    /// Write the graph to the substrate, slot by slot.
    ///
    /// A no-op while `Clean`. Atomicity is per slot: a failed write
    /// surfaces the error, leaves prior slots intact, and keeps the
    /// state `Dirty` so a retry rewrites everything.
    pub async fn save(&mut self, graph: &mut TrustGraph) -> Result<()> {
        if self.state == PersistState::Clean {
            return Ok(());
        }

        let rights = graph.rights_snapshot();
        self.write_rights(&rights).await?;

        let store = graph.store();

        for key in store.keys() {
            let slot = format!("{KEY_PREFIX}{}", key.key_id().to_hex());
            self.substrate
                .write(&slot, &seal_slot(key.as_bytes()))
                .await?;
        }

        for (seq, cert) in store.certificates().enumerate() {
            let slot = format!("{CERT_PREFIX}{seq:08}-{}", cert.cert_id.to_hex());
            self.substrate
                .write(&slot, &seal_slot(&certificate_record_bytes(cert)))
                .await?;
        }

        for profile in store.profiles() {
            let slot = format!(
                "{PROFILE_PREFIX}{}",
                hex::encode(profile.profile_id.as_str())
            );
            self.substrate
                .write(&slot, &seal_slot(&profile_record_bytes(profile)))
                .await?;
        }

        self.state = PersistState::Clean;
        Ok(())
    }

    /// Load durable records into a freshly constructed graph.
    ///
    /// Certificate slots are applied in their sequence-prefixed order, so
    /// admission order (and with it tie-breaking between endorsement
    /// paths) survives the round-trip. Indices are rebuilt and caches
    /// invalidated before returning.
    pub async fn load(&mut self, graph: &mut TrustGraph) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        for slot in self.substrate.enumerate(KEY_PREFIX).await? {
            match self.read_slot(&slot).await {
                Ok(body) => match <[u8; 32]>::try_from(body.as_ref()) {
                    Ok(bytes) => {
                        graph.admit_key(PublicKey::from_bytes(bytes));
                        report.keys += 1;
                    }
                    Err(_) => {
                        tracing::warn!(slot = %slot, "skipping key slot with bad length");
                        report.skipped += 1;
                    }
                },
                Err(e) => {
                    tracing::warn!(slot = %slot, error = %e, "skipping unreadable key slot");
                    report.skipped += 1;
                }
            }
        }

        let mut cert_slots = self.substrate.enumerate(CERT_PREFIX).await?;
        cert_slots.sort();
        for slot in cert_slots {
            let admitted = match self.read_slot(&slot).await {
                Ok(body) => decode_certificate(&body)
                    .map_err(|e| StoreError::Serialization(e.to_string()))
                    .and_then(|cert| {
                        graph
                            .admit_certificate(cert)
                            .map_err(|e| StoreError::Serialization(e.to_string()))
                    }),
                Err(e) => Err(e),
            };
            match admitted {
                Ok(_) => report.certificates += 1,
                Err(e) => {
                    tracing::warn!(slot = %slot, error = %e, "skipping certificate slot");
                    report.skipped += 1;
                }
            }
        }

        for slot in self.substrate.enumerate(PROFILE_PREFIX).await? {
            let admitted = match self.read_slot(&slot).await {
                Ok(body) => decode_profile(&body)
                    .map_err(|e| StoreError::Serialization(e.to_string()))
                    .and_then(|profile| {
                        graph
                            .admit_profile(profile)
                            .map_err(|e| StoreError::Serialization(e.to_string()))
                    }),
                Err(e) => Err(e),
            };
            match admitted {
                Ok(_) => report.profiles += 1,
                Err(e) => {
                    tracing::warn!(slot = %slot, error = %e, "skipping profile slot");
                    report.skipped += 1;
                }
            }
        }

        graph.rebuild();

        self.state = if report.certificates == 0 && report.profiles == 0 && report.keys == 0 {
            PersistState::Empty
        } else {
            PersistState::Clean
        };
        tracing::debug!(
            certificates = report.certificates,
            profiles = report.profiles,
            keys = report.keys,
            skipped = report.skipped,
            "trust graph loaded"
        );
        Ok(report)
    }

    async fn read_slot(&self, slot: &str) -> Result<bytes::Bytes> {
        let sealed = self
            .substrate
            .read(slot)
            .await?
            .ok_or_else(|| StoreError::CorruptSlot(format!("{slot} vanished")))?;
        open_slot(&sealed)
    }

    async fn write_rights(&mut self, rights: &BTreeMap<PersonId, PersonRights>) -> Result<()> {
        let mut body = Vec::new();
        ciborium::into_writer(rights, &mut body)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.substrate.write(RIGHTS_SLOT, &seal_slot(&body)).await
    }

    /// Read the persisted rights aggregate, if present and intact.
    ///
    /// The aggregate is a surface-visible snapshot; authoritative rights
    /// are always re-derived from certificates after load.
    pub async fn read_rights(&self) -> Result<Option<BTreeMap<PersonId, PersonRights>>> {
        let Some(sealed) = self.substrate.read(RIGHTS_SLOT).await? else {
            return Ok(None);
        };
        let body = open_slot(&sealed)?;
        let rights = ciborium::from_reader(body.as_ref())
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Some(rights))
    }
}

//! Trust verdicts and derived rights.

use serde::{Deserialize, Serialize};

use crate::types::{CertId, KeyId};

/// Why a key is (or is not) trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustReason {
    /// The key is in the current root set.
    Root,
    /// The key is endorsed by this certificate, whose signer chain
    /// terminates at a root.
    EndorsedBy(CertId),
    /// Every candidate endorsement loops back through the key itself.
    CycleBroken,
    /// No endorsement chain reaches a root.
    NoPath,
    /// The only candidate certificates are structurally invalid.
    InvalidCertificate,
}

/// The result of trust evaluation for a single key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTrustInfo {
    /// The evaluated key.
    pub key_id: KeyId,

    /// Whether a chain from a root reaches this key.
    pub trusted: bool,

    /// Why.
    pub reason: TrustReason,

    /// Endorsing certificates, nearest first; empty unless trusted.
    pub path: Vec<CertId>,
}

impl KeyTrustInfo {
    /// A root verdict.
    pub fn root(key_id: KeyId) -> Self {
        Self {
            key_id,
            trusted: true,
            reason: TrustReason::Root,
            path: Vec::new(),
        }
    }

    /// An untrusted verdict with the given reason.
    pub fn untrusted(key_id: KeyId, reason: TrustReason) -> Self {
        Self {
            key_id,
            trusted: false,
            reason,
            path: Vec::new(),
        }
    }

    /// A verdict endorsed by `cert`, extending the endorser's path.
    pub fn endorsed(key_id: KeyId, cert: CertId, endorser_path: &[CertId]) -> Self {
        let mut path = Vec::with_capacity(endorser_path.len() + 1);
        path.push(cert);
        path.extend_from_slice(endorser_path);
        Self {
            key_id,
            trusted: true,
            reason: TrustReason::EndorsedBy(cert),
            path,
        }
    }
}

/// Derived endorsement rights of a person. Never hand-edited; rebuilt from
/// admitted authority certificates and the root set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersonRights {
    /// May make endorsements effective for anybody's keys.
    pub endorse_for_everybody: bool,

    /// May make endorsements effective for the person's own keys.
    pub endorse_for_self: bool,
}

impl PersonRights {
    /// No rights at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Both rights, the root-owner axiom.
    pub fn all() -> Self {
        Self {
            endorse_for_everybody: true,
            endorse_for_self: true,
        }
    }

    /// Whether an endorsement of `own_key` scope is effective.
    pub fn allows(&self, self_scope: bool) -> bool {
        self.endorse_for_everybody || (self_scope && self.endorse_for_self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endorsed_path_prepends() {
        let key = KeyId::from_bytes([1; 32]);
        let c1 = CertId::from_bytes([2; 32]);
        let c2 = CertId::from_bytes([3; 32]);

        let inner = KeyTrustInfo::endorsed(key, c1, &[]);
        assert_eq!(inner.path, vec![c1]);

        let outer = KeyTrustInfo::endorsed(key, c2, &inner.path);
        assert_eq!(outer.path, vec![c2, c1]);
        assert_eq!(outer.reason, TrustReason::EndorsedBy(c2));
    }

    #[test]
    fn test_rights_scope() {
        assert!(!PersonRights::none().allows(true));
        assert!(PersonRights::all().allows(false));

        let self_only = PersonRights {
            endorse_for_everybody: false,
            endorse_for_self: true,
        };
        assert!(self_only.allows(true));
        assert!(!self_only.allows(false));
    }
}

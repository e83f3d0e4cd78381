//! Signed artifacts: the verifier's input.

use bytes::Bytes;

use crate::types::PersonId;

/// A signed object presented by a peer, with a claimed signer.
///
/// The claim is untrusted; verification resolves the signer's candidate
/// keys and checks the signature against each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedArtifact {
    /// Who claims to have signed this.
    pub signer: PersonId,

    /// The signed bytes.
    pub payload: Bytes,

    /// Signature over `payload`.
    pub signature: Bytes,
}

impl SignedArtifact {
    pub fn new(
        signer: impl Into<PersonId>,
        payload: impl Into<Bytes>,
        signature: impl Into<Bytes>,
    ) -> Self {
        Self {
            signer: signer.into(),
            payload: payload.into(),
            signature: signature.into(),
        }
    }
}

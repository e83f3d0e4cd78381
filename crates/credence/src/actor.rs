//! The trust core actor.
//!
//! One task owns the graph, the local issuer, and the persistence handle.
//! Requests arrive over an mpsc queue and are processed strictly FIFO;
//! each is answered over a oneshot. A caller that abandons its reply
//! future abandons only the reply: the actor still completes the
//! operation, so no partial state is ever observable.
//!
//! The actor never suspends mid-evaluation; suspension points are the
//! queue itself and persistence I/O.

use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use credence_core::artifact::SignedArtifact;
use credence_core::certificate::{CertKind, Certificate};
use credence_core::crypto::{Crypto, Keypair, PublicKey};
use credence_core::profile::Profile;
use credence_core::types::{KeyId, PersonId};
use credence_core::verdict::{KeyTrustInfo, PersonRights};
use credence_graph::{Admission, Issuer, RootMode, RootProvider, TrustGraph};
use credence_store::{GraphPersistence, LoadReport, Substrate};

use crate::config::CoreConfig;
use crate::error::{Error, Result};

enum Request {
    AdmitCertificate(Certificate, oneshot::Sender<Result<Admission>>),
    AdmitProfile(Profile, oneshot::Sender<Result<Admission>>),
    AdmitKey(PublicKey, oneshot::Sender<KeyId>),
    SetLocalProfile(Profile, oneshot::Sender<Result<Admission>>),
    LocalProfile(oneshot::Sender<Option<Profile>>),
    KeyTrustInfo(KeyId, oneshot::Sender<KeyTrustInfo>),
    PersonRights(PersonId, oneshot::Sender<PersonRights>),
    VerifyArtifact(SignedArtifact, oneshot::Sender<Option<KeyTrustInfo>>),
    IsSignedByRoot(SignedArtifact, RootMode, oneshot::Sender<bool>),
    Certify(CertKind, Bytes, oneshot::Sender<Result<Certificate>>),
    Sign(Bytes, oneshot::Sender<Result<Bytes>>),
    IsCertifiedBy {
        subject: String,
        kind: CertKind,
        issuer: PersonId,
        reply: oneshot::Sender<bool>,
    },
    Certificates(oneshot::Sender<Vec<Certificate>>),
    InvalidateCaches(oneshot::Sender<()>),
    Save(oneshot::Sender<Result<()>>),
    LoadReportQuery(oneshot::Sender<LoadReport>),
    Shutdown(oneshot::Sender<Result<()>>),
}

/// The actor state. Constructed and consumed by [`TrustCore::init`].
pub struct TrustCore<S: Substrate> {
    graph: TrustGraph,
    issuer: Issuer,
    persistence: GraphPersistence<S>,
    config: CoreConfig,
    load_report: LoadReport,
}

impl<S: Substrate + 'static> TrustCore<S> {
    /// Load durable state and start the actor task.
    ///
    /// The node's own key material is admitted so its id resolves, and
    /// previously stored records are loaded before the first request is
    /// accepted. Returns the handle and the actor's join handle; the task
    /// ends when [`TrustCoreHandle::shutdown`] is called or every handle
    /// is dropped.
    pub async fn init(
        person: impl Into<PersonId>,
        keypair: Keypair,
        crypto: Arc<dyn Crypto>,
        roots: Arc<dyn RootProvider>,
        substrate: S,
        config: CoreConfig,
    ) -> Result<(TrustCoreHandle, JoinHandle<()>)> {
        let person = person.into();
        let mut graph = TrustGraph::new(Arc::clone(&crypto), roots);
        let mut persistence = GraphPersistence::new(substrate);
        let load_report = persistence.load(&mut graph).await?;

        let local_key = keypair.public_key();
        graph.admit_key(local_key);

        let issuer = Issuer::new(person.clone(), keypair, crypto);
        let core = Self {
            graph,
            issuer,
            persistence,
            config,
            load_report,
        };

        let (tx, rx) = mpsc::channel(core.config.request_capacity.max(1));
        let local_key_id = local_key.key_id();
        let task = tokio::spawn(core.run(rx));

        Ok((
            TrustCoreHandle {
                tx,
                person,
                local_key_id,
            },
            task,
        ))
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Request>) {
        while let Some(request) = rx.recv().await {
            if self.handle_request(request).await {
                return;
            }
        }
        // Every handle dropped; fall back to the shutdown policy.
        if self.config.save_on_shutdown {
            if let Err(e) = self.persistence.save(&mut self.graph).await {
                tracing::warn!(error = %e, "final save failed; durable state is stale");
            }
        }
    }

    /// Process one request. Returns true when the actor should stop.
    async fn handle_request(&mut self, request: Request) -> bool {
        match request {
            Request::AdmitCertificate(cert, reply) => {
                let result = self.graph.admit_certificate(cert);
                if matches!(result, Ok(Admission::Inserted)) {
                    self.persistence.mark_dirty();
                }
                let _ = reply.send(result.map_err(Error::from));
            }
            Request::AdmitProfile(profile, reply) => {
                let result = self.graph.admit_profile(profile);
                if matches!(result, Ok(Admission::Inserted)) {
                    self.persistence.mark_dirty();
                }
                let _ = reply.send(result.map_err(Error::from));
            }
            Request::AdmitKey(key, reply) => {
                let id = self.graph.admit_key(key);
                self.persistence.mark_dirty();
                let _ = reply.send(id);
            }
            Request::SetLocalProfile(profile, reply) => {
                let result = self.graph.set_local_profile(profile);
                if matches!(result, Ok(Admission::Inserted)) {
                    self.persistence.mark_dirty();
                }
                let _ = reply.send(result.map_err(Error::from));
            }
            Request::LocalProfile(reply) => {
                let _ = reply.send(self.graph.local_profile().cloned());
            }
            Request::KeyTrustInfo(key, reply) => {
                let _ = reply.send(self.graph.key_trust_info(key));
            }
            Request::PersonRights(person, reply) => {
                let _ = reply.send(self.graph.person_rights(&person));
            }
            Request::VerifyArtifact(artifact, reply) => {
                let _ = reply.send(self.graph.verify_artifact(&artifact));
            }
            Request::IsSignedByRoot(artifact, mode, reply) => {
                let _ = reply.send(self.graph.is_signed_by_root(&artifact, mode));
            }
            Request::Certify(kind, payload, reply) => {
                let result = self.issuer.certify(kind, payload);
                let _ = reply.send(result.map_err(Error::from));
            }
            Request::Sign(payload, reply) => {
                let result = self.issuer.sign(&payload);
                let _ = reply.send(result.map_err(Error::from));
            }
            Request::IsCertifiedBy {
                subject,
                kind,
                issuer,
                reply,
            } => {
                let _ = reply.send(self.graph.is_certified_by(&subject, kind, &issuer));
            }
            Request::Certificates(reply) => {
                let certs = self.graph.store().certificates().cloned().collect();
                let _ = reply.send(certs);
            }
            Request::InvalidateCaches(reply) => {
                self.graph.invalidate_caches();
                let _ = reply.send(());
            }
            Request::Save(reply) => {
                let result = self.persistence.save(&mut self.graph).await;
                let _ = reply.send(result.map_err(Error::from));
            }
            Request::LoadReportQuery(reply) => {
                let _ = reply.send(self.load_report);
            }
            Request::Shutdown(reply) => {
                let result = if self.config.save_on_shutdown {
                    self.persistence
                        .save(&mut self.graph)
                        .await
                        .map_err(Error::from)
                } else {
                    Ok(())
                };
                let _ = reply.send(result);
                return true;
            }
        }
        false
    }
}

/// Cloneable handle to the trust core actor.
#[derive(Clone)]
pub struct TrustCoreHandle {
    tx: mpsc::Sender<Request>,
    person: PersonId,
    local_key_id: KeyId,
}

impl TrustCoreHandle {
    /// The identity this core issues certificates under.
    pub fn person(&self) -> &PersonId {
        &self.person
    }

    /// The content-address of this node's signing key.
    pub fn local_key_id(&self) -> KeyId {
        self.local_key_id
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(build(tx)).await.map_err(|_| Error::ShutDown)?;
        rx.await.map_err(|_| Error::ShutDown)
    }

    /// Admit a certificate from a peer or from local issuance.
    pub async fn admit_certificate(&self, cert: Certificate) -> Result<Admission> {
        self.request(|tx| Request::AdmitCertificate(cert, tx)).await?
    }

    /// Admit a profile.
    pub async fn admit_profile(&self, profile: Profile) -> Result<Admission> {
        self.request(|tx| Request::AdmitProfile(profile, tx)).await?
    }

    /// Admit public key material.
    pub async fn admit_key(&self, key: PublicKey) -> Result<KeyId> {
        self.request(|tx| Request::AdmitKey(key, tx)).await
    }

    /// Admit and remember this node's own profile.
    pub async fn set_local_profile(&self, profile: Profile) -> Result<Admission> {
        self.request(|tx| Request::SetLocalProfile(profile, tx)).await?
    }

    /// This node's own profile, if declared.
    pub async fn local_profile(&self) -> Result<Option<Profile>> {
        self.request(Request::LocalProfile).await
    }

    /// Full trust verdict for a key.
    pub async fn key_trust_info(&self, key: KeyId) -> Result<KeyTrustInfo> {
        self.request(|tx| Request::KeyTrustInfo(key, tx)).await
    }

    /// Whether a chain from a root reaches this key.
    pub async fn is_key_trusted(&self, key: KeyId) -> Result<bool> {
        Ok(self.key_trust_info(key).await?.trusted)
    }

    /// Effective endorsement rights of a person.
    pub async fn person_rights(&self, person: impl Into<PersonId>) -> Result<PersonRights> {
        self.request(|tx| Request::PersonRights(person.into(), tx))
            .await
    }

    /// Verify a signed artifact; `None` when no candidate key verifies.
    pub async fn verify_artifact(&self, artifact: SignedArtifact) -> Result<Option<KeyTrustInfo>> {
        self.request(|tx| Request::VerifyArtifact(artifact, tx)).await
    }

    /// Whether the artifact verifies directly under a root key.
    pub async fn is_signed_by_root(
        &self,
        artifact: SignedArtifact,
        mode: RootMode,
    ) -> Result<bool> {
        self.request(|tx| Request::IsSignedByRoot(artifact, mode, tx))
            .await
    }

    /// Issue a certificate under the local identity.
    pub async fn certify(&self, kind: CertKind, payload: impl Into<Bytes>) -> Result<Certificate> {
        self.request(|tx| Request::Certify(kind, payload.into(), tx))
            .await?
    }

    /// Sign arbitrary bytes with the local key.
    pub async fn sign(&self, payload: impl Into<Bytes>) -> Result<Bytes> {
        self.request(|tx| Request::Sign(payload.into(), tx)).await?
    }

    /// Whether `subject` carries a certificate of `kind` verifying under
    /// a trusted key of `issuer`.
    pub async fn is_certified_by(
        &self,
        subject: impl Into<String>,
        kind: CertKind,
        issuer: impl Into<PersonId>,
    ) -> Result<bool> {
        self.request(|tx| Request::IsCertifiedBy {
            subject: subject.into(),
            kind,
            issuer: issuer.into(),
            reply: tx,
        })
        .await
    }

    /// Snapshot of all admitted certificates in admission order.
    pub async fn certificates(&self) -> Result<Vec<Certificate>> {
        self.request(Request::Certificates).await
    }

    /// Clear derived caches; the next query recomputes from sources.
    /// Required after a root-set change.
    pub async fn invalidate_caches(&self) -> Result<()> {
        self.request(Request::InvalidateCaches).await
    }

    /// Persist the graph now.
    pub async fn save(&self) -> Result<()> {
        self.request(Request::Save).await?
    }

    /// What the initial load found.
    pub async fn load_report(&self) -> Result<LoadReport> {
        self.request(Request::LoadReportQuery).await
    }

    /// Stop the actor, saving first when configured to.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(Request::Shutdown).await?
    }
}

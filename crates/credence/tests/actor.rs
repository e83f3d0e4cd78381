//! Actor-level behavior: FIFO ordering, persistence across restarts, and
//! the unified request surface.

use std::sync::Arc;

use credence::{CertKind, CoreConfig, RootMode, SignedArtifact, TrustCore, TrustReason};
use credence_core::crypto::StdCrypto;
use credence_graph::StaticRoots;
use credence_store::MemorySubstrate;
use credence_testkit::parties;

async fn spawn_core(
    root_party: &credence_testkit::Party,
    substrate: Arc<MemorySubstrate>,
    config: CoreConfig,
) -> credence::TrustCoreHandle {
    let roots = StaticRoots::new([root_party.key_id()]);
    let (handle, _task) = TrustCore::init(
        root_party.person.as_str(),
        root_party.keypair.clone(),
        Arc::new(StdCrypto::new()),
        Arc::new(roots),
        substrate,
        config,
    )
    .await
    .expect("init");
    handle
}

#[tokio::test]
async fn local_root_key_is_trusted_after_init() {
    let ps = parties(1);
    let core = spawn_core(&ps[0], Arc::new(MemorySubstrate::new()), CoreConfig::default()).await;

    assert!(core.is_key_trusted(core.local_key_id()).await.unwrap());
    let info = core.key_trust_info(core.local_key_id()).await.unwrap();
    assert_eq!(info.reason, TrustReason::Root);

    core.shutdown().await.unwrap();
}

#[tokio::test]
async fn admission_is_observed_by_the_next_query() {
    let ps = parties(2);
    let (root, alice) = (&ps[0], &ps[1]);
    let core = spawn_core(root, Arc::new(MemorySubstrate::new()), CoreConfig::default()).await;

    core.admit_key(alice.public_key()).await.unwrap();
    core.admit_profile(alice.profile(1_000)).await.unwrap();
    core.admit_profile(root.profile(1_000)).await.unwrap();

    // Not yet endorsed.
    assert!(!core.is_key_trusted(alice.key_id()).await.unwrap());

    core.admit_certificate(root.endorse(alice.key_id()))
        .await
        .unwrap();

    // FIFO: this query is queued behind the admission and must see it.
    assert!(core.is_key_trusted(alice.key_id()).await.unwrap());

    core.shutdown().await.unwrap();
}

#[tokio::test]
async fn graph_survives_shutdown_and_restart() {
    let ps = parties(2);
    let (root, alice) = (&ps[0], &ps[1]);
    let substrate = Arc::new(MemorySubstrate::new());

    let core = spawn_core(root, Arc::clone(&substrate), CoreConfig::default()).await;
    core.admit_key(alice.public_key()).await.unwrap();
    core.admit_profile(alice.profile(1_000)).await.unwrap();
    core.admit_profile(root.profile(1_000)).await.unwrap();
    core.admit_certificate(root.endorse(alice.key_id()))
        .await
        .unwrap();
    core.shutdown().await.unwrap();

    // A fresh actor over the same substrate sees the same trust.
    let core = spawn_core(root, substrate, CoreConfig::default()).await;
    let report = core.load_report().await.unwrap();
    assert_eq!(report.certificates, 1);
    assert_eq!(report.profiles, 2);
    assert_eq!(report.skipped, 0);

    assert!(core.is_key_trusted(alice.key_id()).await.unwrap());
    core.shutdown().await.unwrap();
}

#[tokio::test]
async fn save_on_shutdown_can_be_disabled() {
    let ps = parties(2);
    let (root, alice) = (&ps[0], &ps[1]);
    let substrate = Arc::new(MemorySubstrate::new());

    let config = CoreConfig {
        save_on_shutdown: false,
        ..CoreConfig::default()
    };
    let core = spawn_core(root, Arc::clone(&substrate), config).await;
    core.admit_key(alice.public_key()).await.unwrap();
    core.shutdown().await.unwrap();

    assert!(substrate.is_empty());
}

#[tokio::test]
async fn certify_sign_and_verify_round_trip() {
    let ps = parties(1);
    let root = &ps[0];
    let core = spawn_core(root, Arc::new(MemorySubstrate::new()), CoreConfig::default()).await;
    core.set_local_profile(root.profile(1_000)).await.unwrap();

    // Sign an artifact locally and verify it through the core.
    let payload = b"object announcement".to_vec();
    let signature = core.sign(payload.clone()).await.unwrap();
    let artifact = SignedArtifact::new(root.person.as_str(), payload, signature);

    let info = core
        .verify_artifact(artifact.clone())
        .await
        .unwrap()
        .expect("local key resolves");
    assert!(info.trusted);

    assert!(core
        .is_signed_by_root(artifact, RootMode::MainIdentity)
        .await
        .unwrap());

    core.shutdown().await.unwrap();
}

#[tokio::test]
async fn issued_affirmations_support_is_certified_by() {
    let ps = parties(1);
    let root = &ps[0];
    let core = spawn_core(root, Arc::new(MemorySubstrate::new()), CoreConfig::default()).await;
    core.set_local_profile(root.profile(1_000)).await.unwrap();

    let cert = core
        .certify(
            CertKind::Affirmation,
            root.affirm("device-7", &[("role", "operator")]).payload,
        )
        .await
        .unwrap();
    core.admit_certificate(cert).await.unwrap();

    assert!(core
        .is_certified_by("device-7", CertKind::Affirmation, root.person.as_str())
        .await
        .unwrap());
    assert!(!core
        .is_certified_by("device-9", CertKind::Affirmation, root.person.as_str())
        .await
        .unwrap());

    core.shutdown().await.unwrap();
}

#[tokio::test]
async fn local_profile_is_remembered() {
    let ps = parties(1);
    let root = &ps[0];
    let core = spawn_core(root, Arc::new(MemorySubstrate::new()), CoreConfig::default()).await;

    assert!(core.local_profile().await.unwrap().is_none());
    core.set_local_profile(root.profile(1_000)).await.unwrap();

    let profile = core.local_profile().await.unwrap().expect("declared");
    assert_eq!(profile.person_id, root.person);
    assert!(profile.keys.contains(&root.key_id()));

    core.shutdown().await.unwrap();
}

#[tokio::test]
async fn requests_after_shutdown_fail_cleanly() {
    let ps = parties(1);
    let core = spawn_core(&ps[0], Arc::new(MemorySubstrate::new()), CoreConfig::default()).await;
    core.shutdown().await.unwrap();

    let err = core.certificates().await.unwrap_err();
    assert!(matches!(err, credence::Error::ShutDown));
}

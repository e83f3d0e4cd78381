//! Save/load round-trips: rebuilt graphs must reproduce exact verdicts.

use std::sync::Arc;

use credence_core::crypto::StdCrypto;
use credence_graph::{StaticRoots, TrustGraph};
use credence_store::{DirSubstrate, GraphPersistence, MemorySubstrate, PersistState};
use credence_testkit::{parties, TestNet};

fn fresh_graph_like(net_roots: &[&credence_testkit::Party]) -> TrustGraph {
    let roots = StaticRoots::new(net_roots.iter().map(|p| p.key_id()));
    TrustGraph::new(Arc::new(StdCrypto::new()), Arc::new(roots))
}

#[tokio::test]
async fn save_then_load_reproduces_every_verdict() {
    let ps = parties(4);
    let (root, alice, bob, carol) = (&ps[0], &ps[1], &ps[2], &ps[3]);
    let mut net = TestNet::new(&[root], &[root, alice, bob, carol]);

    net.graph.admit_certificate(root.endorse(alice.key_id())).unwrap();
    net.graph.admit_certificate(root.grant_everybody(alice)).unwrap();
    net.graph.admit_certificate(alice.endorse(bob.key_id())).unwrap();
    // carol stays unendorsed

    let mut persistence = GraphPersistence::new(MemorySubstrate::new());
    persistence.mark_dirty();
    persistence.save(&mut net.graph).await.unwrap();
    assert_eq!(persistence.state(), PersistState::Clean);

    let before: Vec<_> = ps
        .iter()
        .map(|p| net.graph.key_trust_info(p.key_id()))
        .collect();

    let mut restored = fresh_graph_like(&[root]);
    let report = persistence.load(&mut restored).await.unwrap();
    assert_eq!(report.certificates, 3);
    assert_eq!(report.profiles, 4);
    assert_eq!(report.keys, 4);
    assert_eq!(report.skipped, 0);

    let after: Vec<_> = ps
        .iter()
        .map(|p| restored.key_trust_info(p.key_id()))
        .collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn diamond_path_choice_survives_reload() {
    let ps = parties(4);
    let (root, alice, bob, carol) = (&ps[0], &ps[1], &ps[2], &ps[3]);
    let mut net = TestNet::new(&[root], &[root, alice, bob, carol]);

    net.graph.admit_certificate(root.endorse(alice.key_id())).unwrap();
    net.graph.admit_certificate(root.endorse(bob.key_id())).unwrap();
    net.graph.admit_certificate(root.grant_everybody(alice)).unwrap();
    net.graph.admit_certificate(root.grant_everybody(bob)).unwrap();
    let via_alice = alice.endorse(carol.key_id());
    net.graph.admit_certificate(via_alice.clone()).unwrap();
    net.graph.admit_certificate(bob.endorse(carol.key_id())).unwrap();

    let before = net.graph.key_trust_info(carol.key_id());
    assert_eq!(before.path.first(), Some(&via_alice.cert_id));

    let mut persistence = GraphPersistence::new(MemorySubstrate::new());
    persistence.mark_dirty();
    persistence.save(&mut net.graph).await.unwrap();

    let mut restored = fresh_graph_like(&[root]);
    persistence.load(&mut restored).await.unwrap();

    // Admission order is preserved, so the same branch wins.
    assert_eq!(restored.key_trust_info(carol.key_id()), before);
}

#[tokio::test]
async fn corrupt_slot_is_skipped_and_counted() {
    let ps = parties(2);
    let (root, alice) = (&ps[0], &ps[1]);
    let mut net = TestNet::new(&[root], &[root, alice]);
    let cert = root.endorse(alice.key_id());
    net.graph.admit_certificate(cert.clone()).unwrap();

    let mut persistence = GraphPersistence::new(MemorySubstrate::new());
    persistence.mark_dirty();
    persistence.save(&mut net.graph).await.unwrap();

    // Flip bytes in the certificate slot.
    let slot = format!("cert/00000000-{}", cert.cert_id.to_hex());
    persistence
        .substrate()
        .corrupt(&slot, b"not an envelope at all");

    let mut restored = fresh_graph_like(&[root]);
    let report = persistence.load(&mut restored).await.unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.certificates, 0);
    // The rest of the state survived.
    assert_eq!(report.profiles, 2);
    assert!(!restored.is_key_trusted(alice.key_id()));
    assert!(restored.is_key_trusted(root.key_id()));
}

#[tokio::test]
async fn save_is_noop_while_clean() {
    let ps = parties(1);
    let root = &ps[0];
    let mut net = TestNet::new(&[root], &[root]);

    let mut persistence = GraphPersistence::new(MemorySubstrate::new());
    persistence.mark_dirty();
    persistence.save(&mut net.graph).await.unwrap();
    let slots_after_first = persistence.substrate().len();

    // Clean: a second save writes nothing new.
    persistence.save(&mut net.graph).await.unwrap();
    assert_eq!(persistence.substrate().len(), slots_after_first);

    // Dirty again: save succeeds again.
    persistence.mark_dirty();
    persistence.save(&mut net.graph).await.unwrap();
    assert_eq!(persistence.state(), PersistState::Clean);
}

#[tokio::test]
async fn rights_aggregate_round_trips() {
    let ps = parties(2);
    let (root, alice) = (&ps[0], &ps[1]);
    let mut net = TestNet::new(&[root], &[root, alice]);
    net.graph.admit_certificate(root.grant_self(alice)).unwrap();

    let mut persistence = GraphPersistence::new(MemorySubstrate::new());
    persistence.mark_dirty();
    persistence.save(&mut net.graph).await.unwrap();

    let rights = persistence.read_rights().await.unwrap().unwrap();
    let alice_rights = rights.get(&alice.person).unwrap();
    assert!(alice_rights.endorse_for_self);
    assert!(!alice_rights.endorse_for_everybody);
    assert!(rights.get(&root.person).unwrap().endorse_for_everybody);
}

#[tokio::test]
async fn directory_substrate_full_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let ps = parties(3);
    let (root, alice, bob) = (&ps[0], &ps[1], &ps[2]);
    let mut net = TestNet::new(&[root], &[root, alice, bob]);

    net.graph.admit_certificate(root.endorse(alice.key_id())).unwrap();
    net.graph.admit_certificate(root.grant_everybody(alice)).unwrap();
    net.graph.admit_certificate(alice.endorse(bob.key_id())).unwrap();

    let substrate = DirSubstrate::open(dir.path().join("trust")).await.unwrap();
    let mut persistence = GraphPersistence::new(substrate);
    persistence.mark_dirty();
    persistence.save(&mut net.graph).await.unwrap();

    let substrate = DirSubstrate::open(dir.path().join("trust")).await.unwrap();
    let mut persistence = GraphPersistence::new(substrate);
    let mut restored = fresh_graph_like(&[root]);
    let report = persistence.load(&mut restored).await.unwrap();

    assert_eq!(report.skipped, 0);
    assert!(restored.is_key_trusted(bob.key_id()));
    assert_eq!(persistence.state(), PersistState::Clean);
}

#[tokio::test]
async fn loading_nothing_is_empty() {
    let ps = parties(1);
    let root = &ps[0];

    let mut persistence = GraphPersistence::new(MemorySubstrate::new());
    let mut graph = fresh_graph_like(&[root]);
    let report = persistence.load(&mut graph).await.unwrap();

    assert_eq!(report, credence_store::LoadReport::default());
    assert_eq!(persistence.state(), PersistState::Empty);
}

use std::collections::BTreeSet;
use std::sync::Arc;

use super::*;
use crate::config::SceneOptions;
use crate::foundation::core::WorldSize;
use crate::render::canvas::Surface;
use crate::replica::messages::ReplicaEvent;
use crate::sim::sand_painter::SandLookup;

const WAIT: Duration = Duration::from_secs(30);

fn scene(w: u32, h: u32) -> ReplicaConfig {
    let options = SceneOptions {
        world: WorldSize::new(w, h).unwrap(),
        cracks_max: Some(4),
        max_cracking: Some(12),
        seed: 99,
        ..SceneOptions::default()
    };
    ReplicaConfig {
        scene: 0,
        replica: 0,
        viewport: Viewport::FULL,
        seed: options.seed,
        palette_index: 0,
        iterations_per_update: 4,
        lookup: Arc::new(SandLookup::new(options.sand_painter_grains).unwrap()),
        options: Arc::new(options),
    }
}

#[test]
fn spawn_rejects_zero_replicas() {
    assert!(ReplicaSet::spawn(0).is_err());
}

#[test]
fn replicas_cover_the_world_in_order() {
    let set = ReplicaSet::spawn(3).unwrap();
    assert_eq!(set.len(), 3);
    let viewports = set.viewports();
    assert_eq!(viewports[0].x, 0.0);
    assert_eq!(viewports[2].right(), 1.0);
    set.shutdown().unwrap();
}

#[test]
fn every_replica_finishes_and_reports_its_band() {
    let set = ReplicaSet::spawn(3).unwrap();
    assert_eq!(set.start(&scene(90, 40)), 3);

    let mut started = BTreeSet::new();
    let mut finished = BTreeSet::new();
    while finished.len() < 3 {
        let msg = set.recv_timeout(WAIT).unwrap();
        match msg.event {
            ReplicaEvent::Started => {
                started.insert(msg.replica);
            }
            ReplicaEvent::SceneFinished { .. } => {
                assert!(finished.insert(msg.replica), "replica finished twice");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(started.len(), 3);

    assert_eq!(set.broadcast(|| ReplicaCommand::Snapshot), 3);
    let mut lefts = Vec::new();
    while lefts.len() < 3 {
        let msg = set.recv_timeout(WAIT).unwrap();
        if let ReplicaEvent::Snapshot(slice) = msg.event {
            assert_eq!(slice.replica, msg.replica);
            lefts.push((slice.replica, slice.left, slice.canvas.width()));
        }
    }
    lefts.sort();
    assert_eq!(lefts[0].1, 0);
    for pair in lefts.windows(2) {
        assert_eq!(pair[1].1, pair[0].1 + pair[0].2);
    }
    let (_, left, width) = lefts[2];
    assert_eq!(left + width, 90);
    set.shutdown().unwrap();
}

#[test]
fn snapshot_before_start_fails_without_killing_the_replica() {
    let set = ReplicaSet::spawn(1).unwrap();
    assert!(set.send(0, ReplicaCommand::Snapshot));
    let msg = set.recv_timeout(WAIT).unwrap();
    assert!(matches!(msg.event, ReplicaEvent::Failed(_)));

    assert_eq!(set.start(&scene(30, 30)), 1);
    let msg = set.recv_timeout(WAIT).unwrap();
    assert!(matches!(msg.event, ReplicaEvent::Started));
    set.shutdown().unwrap();
}

#[test]
fn invalid_scene_is_reported_as_failure() {
    let set = ReplicaSet::spawn(1).unwrap();
    let mut bad = scene(30, 30);
    bad.lookup = Arc::new(SandLookup::new(3).unwrap());
    set.start(&bad);
    let msg = set.recv_timeout(WAIT).unwrap();
    assert!(matches!(msg.event, ReplicaEvent::Failed(_)));
    set.shutdown().unwrap();
}

#[test]
fn shutdown_reports_stopped_replicas() {
    let set = ReplicaSet::spawn(2).unwrap();
    assert!(!set.send(5, ReplicaCommand::Fade));
    assert_eq!(set.pause(true), 2);
    set.shutdown().unwrap();
}

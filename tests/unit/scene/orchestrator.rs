use super::*;
use crate::encode::sink::InMemorySink;
use crate::foundation::core::WorldSize;
use crate::store::MemoryStore;

fn options() -> SceneOptions {
    SceneOptions {
        world: WorldSize::new(80, 40).unwrap(),
        seed: 11,
        worker_count: Some(2),
        cracks_max: Some(4),
        max_cracking: Some(16),
        transition_delay_ms: 0,
        ..SceneOptions::default()
    }
}

fn alpha_at(frame: &FrameRGBA, x: u32, y: u32) -> u8 {
    frame.data[(y as usize * frame.width as usize + x as usize) * 4 + 3]
}

#[test]
fn lost_replica_is_excluded_and_the_set_rebuilt() {
    let mut orchestrator =
        Orchestrator::new(options(), InMemorySink::new(), MemoryStore::new()).unwrap();
    orchestrator.ensure_replicas(2).unwrap();
    // The replica exits before it ever sees the scene, reporting `Stopped` for scene 0.
    assert!(orchestrator.replicas().unwrap().send(1, ReplicaCommand::Shutdown));

    let summary = orchestrator.run(Some(2)).unwrap();
    assert_eq!(summary.scenes, 2);
    assert!(!orchestrator.rebuild_replicas);

    let scenes = &orchestrator.sink().scenes;
    let partial = &scenes[0].frame;
    assert_eq!(alpha_at(partial, 0, 0), 255);
    assert_eq!(alpha_at(partial, 39, 20), 255);
    // The lost band stays transparent.
    assert_eq!(alpha_at(partial, 40, 0), 0);
    assert_eq!(alpha_at(partial, 79, 39), 0);

    let rebuilt = &scenes[1].frame;
    assert!(rebuilt.data.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn failed_start_is_excluded_without_failing_the_scene() {
    let mut orchestrator =
        Orchestrator::new(options(), InMemorySink::new(), MemoryStore::new()).unwrap();
    orchestrator.ensure_replicas(2).unwrap();
    let rejected = ReplicaConfig {
        replica: 1,
        scene: 0,
        viewport: Viewport::FULL,
        seed: 11,
        palette_index: 0,
        iterations_per_update: 0,
        lookup: orchestrator.lookups.get(64).unwrap(),
        options: Arc::new(options()),
    };
    // Its `Failed` event for scene 0 is queued ahead of everything the real start produces.
    assert!(
        orchestrator
            .replicas()
            .unwrap()
            .send(1, ReplicaCommand::Start(rejected))
    );

    let summary = orchestrator.run(Some(1)).unwrap();
    assert_eq!(summary.scenes, 1);

    let frame = &orchestrator.sink().scenes[0].frame;
    assert_eq!(alpha_at(frame, 10, 10), 255);
    assert_eq!(alpha_at(frame, 60, 10), 0);
}

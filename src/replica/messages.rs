use std::time::SystemTime;

use crate::render::frame::ReplicaSlice;
use crate::sim::engine::ReplicaConfig;

/// Host to replica.
#[derive(Debug)]
pub enum ReplicaCommand {
    /// Configure (or reconfigure) the engine and start a scene.
    Start(ReplicaConfig),
    /// Fade the surface toward the background.
    Fade,
    Pause(bool),
    /// Reply with [`ReplicaEvent::Snapshot`].
    Snapshot,
    Shutdown,
}

/// Replica to host.
#[derive(Debug)]
pub enum ReplicaEvent {
    Started,
    /// The replica's crack budget ran out.
    SceneFinished { timestamp: SystemTime },
    Snapshot(ReplicaSlice),
    /// A command could not be carried out. The replica stays alive.
    Failed(String),
    /// The thread is about to exit.
    Stopped,
}

/// An event tagged with the replica that sent it and the scene it belongs to.
#[derive(Debug)]
pub struct ReplicaMessage {
    pub replica: usize,
    pub scene: u64,
    pub event: ReplicaEvent,
}

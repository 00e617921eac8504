use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::foundation::core::Viewport;
use crate::foundation::error::{SubstrateError, SubstrateResult};
use crate::replica::messages::{ReplicaCommand, ReplicaMessage};
use crate::replica::worker;
use crate::sim::engine::ReplicaConfig;

struct ReplicaHandle {
    viewport: Viewport,
    commands: Sender<ReplicaCommand>,
    thread: Option<JoinHandle<()>>,
}

/// A fixed number of replica threads, each painting one vertical band of the world.
///
/// The set is built whole and torn down whole; a different replica count means a new set.
pub struct ReplicaSet {
    replicas: Vec<ReplicaHandle>,
    events: Receiver<ReplicaMessage>,
}

impl ReplicaSet {
    /// Spawn `count` idle replicas over contiguous vertical bands.
    pub fn spawn(count: usize) -> SubstrateResult<Self> {
        if count == 0 {
            return Err(SubstrateError::validation("replica count must be >= 1"));
        }
        let (event_tx, events) = mpsc::channel::<ReplicaMessage>();
        let mut replicas = Vec::with_capacity(count);
        for (replica, viewport) in Viewport::vertical_bands(count).into_iter().enumerate() {
            let (commands, command_rx) = mpsc::channel::<ReplicaCommand>();
            let event_tx = event_tx.clone();
            let thread = thread::Builder::new()
                .name(format!("substrate-replica-{replica}"))
                .spawn(move || worker::run(replica, command_rx, event_tx))
                .map_err(|err| {
                    SubstrateError::replica(format!("failed to spawn replica {replica}: {err}"))
                })?;
            replicas.push(ReplicaHandle {
                viewport,
                commands,
                thread: Some(thread),
            });
        }
        tracing::debug!(count, "replica set spawned");
        Ok(Self { replicas, events })
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Band assigned to each replica, in replica order.
    pub fn viewports(&self) -> Vec<Viewport> {
        self.replicas.iter().map(|r| r.viewport).collect()
    }

    /// Send `command` to one replica. Returns `false` if its thread is gone.
    pub fn send(&self, replica: usize, command: ReplicaCommand) -> bool {
        let Some(handle) = self.replicas.get(replica) else {
            return false;
        };
        if handle.commands.send(command).is_err() {
            tracing::warn!(replica, "replica is not accepting commands");
            return false;
        }
        true
    }

    /// Send a freshly built command to every replica. Returns how many accepted it.
    pub fn broadcast(&self, make: impl Fn() -> ReplicaCommand) -> usize {
        (0..self.replicas.len())
            .filter(|&replica| self.send(replica, make()))
            .count()
    }

    /// Start a scene on every replica, each on its own band of `scene`.
    pub fn start(&self, scene: &ReplicaConfig) -> usize {
        self.replicas
            .iter()
            .enumerate()
            .filter(|&(replica, handle)| {
                let config = scene.for_slice(replica, handle.viewport);
                self.send(replica, ReplicaCommand::Start(config))
            })
            .count()
    }

    pub fn fade(&self) -> usize {
        self.broadcast(|| ReplicaCommand::Fade)
    }

    pub fn pause(&self, paused: bool) -> usize {
        self.broadcast(|| ReplicaCommand::Pause(paused))
    }

    /// Wait up to `timeout` for the next event from any replica.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<ReplicaMessage, RecvTimeoutError> {
        self.events.recv_timeout(timeout)
    }

    /// Stop every replica and wait for its thread.
    ///
    /// Panicked replicas are reported after all others have been joined.
    pub fn shutdown(mut self) -> SubstrateResult<()> {
        let panicked = self.stop_all();
        if panicked.is_empty() {
            Ok(())
        } else {
            Err(SubstrateError::replica(format!(
                "replicas {panicked:?} panicked"
            )))
        }
    }

    fn stop_all(&mut self) -> Vec<usize> {
        for handle in &self.replicas {
            let _ = handle.commands.send(ReplicaCommand::Shutdown);
        }
        let mut panicked = Vec::new();
        for (replica, handle) in self.replicas.iter_mut().enumerate() {
            if let Some(thread) = handle.thread.take()
                && thread.join().is_err()
            {
                tracing::warn!(replica, "replica thread panicked");
                panicked.push(replica);
            }
        }
        panicked
    }
}

impl Drop for ReplicaSet {
    fn drop(&mut self) {
        self.stop_all();
    }
}

impl std::fmt::Debug for ReplicaSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicaSet")
            .field("replicas", &self.replicas.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/replica/set.rs"]
mod tests;

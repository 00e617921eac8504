use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use crate::replica::messages::{ReplicaCommand, ReplicaEvent, ReplicaMessage};
use crate::sim::engine::{Engine, EngineHost, EngineSignal};

/// Forwards engine signals to the host channel.
struct ChannelHost<'a> {
    replica: usize,
    scene: u64,
    events: &'a Sender<ReplicaMessage>,
}

impl ChannelHost<'_> {
    fn send(&self, event: ReplicaEvent) {
        if self
            .events
            .send(ReplicaMessage {
                replica: self.replica,
                scene: self.scene,
                event,
            })
            .is_err()
        {
            tracing::debug!(replica = self.replica, "host event channel closed");
        }
    }
}

impl EngineHost for ChannelHost<'_> {
    fn signal(&mut self, signal: EngineSignal) {
        let event = match signal {
            EngineSignal::Started { .. } => ReplicaEvent::Started,
            EngineSignal::SceneFinished { timestamp, .. } => {
                ReplicaEvent::SceneFinished { timestamp }
            }
        };
        self.send(event);
    }
}

enum Flow {
    Continue,
    Exit,
}

/// Body of a replica thread.
///
/// Ticks as fast as it can while the engine has work, otherwise blocks on the command channel.
/// Returns when told to shut down or when the host drops its sender.
pub(crate) fn run(
    replica: usize,
    commands: Receiver<ReplicaCommand>,
    events: Sender<ReplicaMessage>,
) {
    let mut host = ChannelHost {
        replica,
        scene: 0,
        events: &events,
    };
    let mut engine: Option<Engine> = None;

    loop {
        let busy = engine.as_ref().is_some_and(Engine::is_active);
        if busy {
            match drain(&commands, &mut engine, &mut host) {
                Flow::Continue => {}
                Flow::Exit => break,
            }
            if let Some(engine) = engine.as_mut() {
                engine.tick(&mut host);
            }
        } else {
            let Ok(command) = commands.recv() else {
                break;
            };
            if let Flow::Exit = handle(command, &mut engine, &mut host) {
                break;
            }
        }
    }

    tracing::debug!(replica, "replica stopped");
    host.send(ReplicaEvent::Stopped);
}

fn drain(
    commands: &Receiver<ReplicaCommand>,
    engine: &mut Option<Engine>,
    host: &mut ChannelHost<'_>,
) -> Flow {
    loop {
        match commands.try_recv() {
            Ok(command) => {
                if let Flow::Exit = handle(command, engine, host) {
                    return Flow::Exit;
                }
            }
            Err(TryRecvError::Empty) => return Flow::Continue,
            Err(TryRecvError::Disconnected) => return Flow::Exit,
        }
    }
}

fn handle(
    command: ReplicaCommand,
    engine: &mut Option<Engine>,
    host: &mut ChannelHost<'_>,
) -> Flow {
    match command {
        ReplicaCommand::Start(config) => {
            host.scene = config.scene;
            let configured = match engine.as_mut() {
                Some(e) => e.configure(config),
                None => Engine::new(config).map(|e| {
                    *engine = Some(e);
                }),
            };
            match (configured, engine.as_mut()) {
                (Ok(()), Some(e)) => e.start(host),
                (Err(err), _) => {
                    tracing::warn!(replica = host.replica, %err, "replica failed to start");
                    host.send(ReplicaEvent::Failed(err.to_string()));
                }
                (Ok(()), None) => {}
            }
        }
        ReplicaCommand::Fade => {
            if let Some(e) = engine.as_mut() {
                e.fade_out();
            }
        }
        ReplicaCommand::Pause(paused) => {
            if let Some(e) = engine.as_mut() {
                e.set_paused(paused);
            }
        }
        ReplicaCommand::Snapshot => match engine.as_ref() {
            Some(e) => host.send(ReplicaEvent::Snapshot(e.snapshot())),
            None => host.send(ReplicaEvent::Failed("no scene to snapshot".to_owned())),
        },
        ReplicaCommand::Shutdown => return Flow::Exit,
    }
    Flow::Continue
}

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant, SystemTime};

use crate::calibration::{CalibrationRecord, CalibrationStep, Calibrator};
use crate::config::{ABSOLUTE_MAX_WORKERS, CALIBRATION_ITERATIONS_PER_UPDATE, SceneOptions};
use crate::encode::sink::{SceneFrame, SceneSink, SinkConfig};
use crate::foundation::core::Viewport;
use crate::foundation::error::{SubstrateError, SubstrateResult};
use crate::foundation::random::SeededRandom;
use crate::palette::Palette;
use crate::render::frame::{FrameRGBA, ReplicaSlice, compose_slices};
use crate::replica::{ReplicaCommand, ReplicaEvent, ReplicaMessage, ReplicaSet};
use crate::scene::fingerprint::{SceneFingerprint, scene_fingerprint};
use crate::sim::engine::ReplicaConfig;
use crate::sim::sand_painter::SandLookupCache;
use crate::store::{CalibratedPreference, PreferenceStore};

/// Longest the host blocks on replica events before checking for control requests.
const CONTROL_POLL: Duration = Duration::from_millis(50);

/// Chance that the next scene jitters its crack headings.
const MODULATE_PATH_CHANCE: f64 = 0.2;

/// Where the orchestrator is in a scene's lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneState {
    Idle,
    Starting,
    Growing,
    AllFinished,
    Transitioning,
}

/// Requests accepted while a run is in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Control {
    Pause(bool),
    Stop,
}

/// Cloneable remote for a running [`Orchestrator`].
#[derive(Clone, Debug)]
pub struct OrchestratorHandle {
    tx: Sender<Control>,
}

impl OrchestratorHandle {
    /// Pause or resume every replica. Paused time does not count toward timeouts.
    pub fn pause(&self, paused: bool) -> bool {
        self.tx.send(Control::Pause(paused)).is_ok()
    }

    /// End the run after the current wait, without emitting the unfinished scene.
    pub fn stop(&self) -> bool {
        self.tx.send(Control::Stop).is_ok()
    }
}

/// What a finished [`Orchestrator::run`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// Scenes pushed to the sink.
    pub scenes: u64,
    /// Worker count in effect when the run ended.
    pub worker_count: usize,
    /// Set when a calibration finished during the run.
    pub calibrated: Option<CalibratedPreference>,
    /// The run ended through [`OrchestratorHandle::stop`].
    pub stopped: bool,
}

enum Wait<T> {
    Done(T),
    Stopped,
}

/// Sequences scenes over a replica set: start, grow, collect, then calibrate or transition.
pub struct Orchestrator<S, P> {
    options: SceneOptions,
    sink: S,
    store: P,
    calibrator: Calibrator,
    lookups: SandLookupCache,
    replicas: Option<ReplicaSet>,
    rebuild_replicas: bool,
    state: SceneState,
    seed: u64,
    palette: Palette,
    modulate_path: bool,
    scene_index: u64,
    paused: bool,
    paused_since: Option<Instant>,
    paused_total: Duration,
    control_tx: Sender<Control>,
    control: Receiver<Control>,
}

impl<S: SceneSink, P: PreferenceStore> Orchestrator<S, P> {
    /// Build an orchestrator.
    ///
    /// Forced calibration wins, then `options.worker_count`, then the stored preference. With none
    /// of them the run calibrates first.
    pub fn new(options: SceneOptions, sink: S, store: P) -> SubstrateResult<Self> {
        options.validate()?;
        let calibrate = || {
            Calibrator::new(
                options.calibration_early_exit,
                options.calibration_max_workers,
            )
        };
        let calibrator = if options.calibration_required {
            calibrate()
        } else if let Some(worker_count) = options.worker_count {
            Calibrator::settled(worker_count)
        } else {
            let stored = match store.load() {
                Ok(pref) => pref,
                Err(err) => {
                    tracing::warn!(%err, "ignoring unreadable stored preferences");
                    None
                }
            };
            match stored {
                Some(pref) => Calibrator::settled(pref.worker_count.clamp(1, ABSOLUTE_MAX_WORKERS)),
                None => {
                    tracing::info!("no stored worker count, calibrating first");
                    calibrate()
                }
            }
        };
        let (control_tx, control) = mpsc::channel();
        Ok(Self {
            seed: options.seed,
            palette: Palette::new(options.palette_index),
            modulate_path: options.modulate_path,
            options,
            sink,
            store,
            calibrator,
            lookups: SandLookupCache::new(),
            replicas: None,
            rebuild_replicas: false,
            state: SceneState::Idle,
            scene_index: 0,
            paused: false,
            paused_since: None,
            paused_total: Duration::ZERO,
            control_tx,
            control,
        })
    }

    /// Ignore any stored preference and run with exactly `worker_count` replicas.
    ///
    /// Also skips the calibration a missing preference would trigger. Has no effect when
    /// calibration was forced through `calibration_required`.
    pub fn with_worker_count(mut self, worker_count: usize) -> SubstrateResult<Self> {
        if worker_count == 0 || worker_count > ABSOLUTE_MAX_WORKERS {
            return Err(SubstrateError::validation(format!(
                "worker count must be in 1..={ABSOLUTE_MAX_WORKERS}, got {worker_count}"
            )));
        }
        if !self.options.calibration_required {
            self.calibrator = Calibrator::settled(worker_count);
        }
        Ok(self)
    }

    pub fn handle(&self) -> OrchestratorHandle {
        OrchestratorHandle {
            tx: self.control_tx.clone(),
        }
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    /// Seed of the next scene.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Whether the next scene modulates crack paths.
    pub fn modulate_path(&self) -> bool {
        self.modulate_path
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (S, P) {
        (self.sink, self.store)
    }

    /// Run scenes until `scene_limit` scenes were emitted or a stop is requested.
    ///
    /// With no limit this only returns on stop or error. Replicas are torn down before returning.
    pub fn run(&mut self, scene_limit: Option<u64>) -> SubstrateResult<RunSummary> {
        self.run_until(scene_limit, false)
    }

    /// Run calibration scenes until a worker count is chosen and stored.
    pub fn calibrate(&mut self) -> SubstrateResult<RunSummary> {
        if !self.calibrator.is_calibrating() {
            return Err(SubstrateError::validation(
                "calibration was not requested for this orchestrator",
            ));
        }
        self.run_until(None, true)
    }

    fn run_until(
        &mut self,
        scene_limit: Option<u64>,
        until_calibrated: bool,
    ) -> SubstrateResult<RunSummary> {
        let world = self.options.world;
        self.sink.begin(SinkConfig {
            width: world.w,
            height: world.h,
        })?;

        let mut summary = RunSummary {
            scenes: 0,
            worker_count: self.calibrator.worker_count(),
            calibrated: None,
            stopped: false,
        };
        let result = self.run_scenes(scene_limit, until_calibrated, &mut summary);
        let teardown = self.teardown();
        self.state = SceneState::Idle;
        result?;
        teardown?;
        self.sink.end()?;
        summary.worker_count = self.calibrator.worker_count();
        Ok(summary)
    }

    fn run_scenes(
        &mut self,
        scene_limit: Option<u64>,
        until_calibrated: bool,
        summary: &mut RunSummary,
    ) -> SubstrateResult<()> {
        while scene_limit.is_none_or(|limit| summary.scenes < limit) {
            match self.run_scene()? {
                Wait::Done(calibrated) => {
                    summary.scenes += 1;
                    if calibrated.is_some() {
                        summary.calibrated = calibrated;
                    }
                }
                Wait::Stopped => {
                    summary.stopped = true;
                    return Ok(());
                }
            }
            if until_calibrated && !self.calibrator.is_calibrating() {
                return Ok(());
            }
            let last = scene_limit.is_some_and(|limit| summary.scenes >= limit);
            let advance = !self.calibrator.is_calibrating();
            if !last && let Wait::Stopped = self.wait_transition(advance) {
                summary.stopped = true;
                return Ok(());
            }
        }
        Ok(())
    }

    /// Run one scene to completion and hand it to the sink.
    fn run_scene(&mut self) -> SubstrateResult<Wait<Option<CalibratedPreference>>> {
        self.state = SceneState::Starting;
        let worker_count = self.calibrator.worker_count();
        self.ensure_replicas(worker_count)?;

        let calibrating = self.calibrator.is_calibrating();
        let scene = self.scene_index;
        let options = Arc::new(SceneOptions {
            seed: self.seed,
            palette_index: self.palette.index(),
            modulate_path: self.modulate_path,
            ..self.options.clone()
        });
        let template = ReplicaConfig {
            replica: 0,
            scene,
            viewport: Viewport::FULL,
            seed: self.seed,
            palette_index: self.palette.index(),
            iterations_per_update: if calibrating {
                CALIBRATION_ITERATIONS_PER_UPDATE
            } else {
                self.options.iterations_per_update
            },
            lookup: self.lookups.get(options.sand_painter_grains)?,
            options,
        };
        let fingerprint = self.next_fingerprint();
        tracing::info!(
            scene,
            %fingerprint,
            seed = self.seed,
            palette = self.palette.name(),
            workers = worker_count,
            calibrating,
            "scene starting"
        );
        if let Some(status) = self.calibrator.status() {
            tracing::info!(%status, "calibration status");
        }

        let started_at = SystemTime::now();
        let clock = Instant::now();
        self.replicas()?.start(&template);

        self.state = SceneState::Growing;
        let (finished, paused_for) = match self.await_finish(scene, worker_count)? {
            Wait::Done(done) => done,
            Wait::Stopped => return Ok(Wait::Stopped),
        };
        let duration = clock.elapsed().saturating_sub(paused_for);
        self.state = SceneState::AllFinished;
        tracing::info!(
            scene,
            %fingerprint,
            duration_s = duration.as_secs_f64(),
            finished = finished.len(),
            "scene finished"
        );

        let frame = self.collect_frame(scene, &finished)?;
        self.sink.push_scene(&SceneFrame {
            index: scene,
            fingerprint,
            seed: self.seed,
            palette: self.palette.name(),
            worker_count,
            duration,
            calibrating,
            frame,
        })?;
        self.scene_index += 1;

        let mut calibrated = None;
        if calibrating {
            let record = CalibrationRecord::new(worker_count, started_at, started_at + duration);
            if let CalibrationStep::Finished {
                worker_count,
                duration,
            } = self.calibrator.record(record)?
            {
                let pref = CalibratedPreference::new(worker_count, duration);
                if let Err(err) = self.store.store(&pref) {
                    tracing::warn!(%err, "could not persist calibration result");
                }
                tracing::info!(worker_count, "calibration finished");
                calibrated = Some(pref);
            }
        }
        Ok(Wait::Done(calibrated))
    }

    fn replicas(&self) -> SubstrateResult<&ReplicaSet> {
        self.replicas
            .as_ref()
            .ok_or_else(|| SubstrateError::replica("no replica set is running"))
    }

    /// Make sure exactly `count` healthy replicas exist, rebuilding from scratch otherwise.
    fn ensure_replicas(&mut self, count: usize) -> SubstrateResult<()> {
        let reusable =
            !self.rebuild_replicas && self.replicas.as_ref().is_some_and(|r| r.len() == count);
        if reusable {
            return Ok(());
        }
        self.teardown()?;
        self.replicas = Some(ReplicaSet::spawn(count)?);
        self.rebuild_replicas = false;
        Ok(())
    }

    fn teardown(&mut self) -> SubstrateResult<()> {
        match self.replicas.take() {
            Some(set) => set.shutdown(),
            None => Ok(()),
        }
    }

    /// Wait for every replica's finish signal, excluding those that fail or time out.
    fn await_finish(
        &mut self,
        scene: u64,
        count: usize,
    ) -> SubstrateResult<Wait<(Vec<usize>, Duration)>> {
        let timeout = Duration::from_millis(self.options.finish_timeout_ms);
        let began = Instant::now();
        let paused_before = self.paused_total;
        let mut pending: BTreeSet<usize> = (0..count).collect();
        let mut finished = Vec::with_capacity(count);

        while !pending.is_empty() {
            if let Some(Control::Stop) = self.poll_control() {
                return Ok(Wait::Stopped);
            }
            if self.paused {
                std::thread::sleep(CONTROL_POLL);
                continue;
            }

            let deadline = began + timeout + (self.paused_total - paused_before);
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let msg = match self.replicas()?.recv_timeout((deadline - now).min(CONTROL_POLL)) {
                Ok(msg) => msg,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };
            if msg.scene != scene {
                continue;
            }
            match msg.event {
                ReplicaEvent::SceneFinished { timestamp } => {
                    if pending.remove(&msg.replica) {
                        finished.push(msg.replica);
                        tracing::debug!(
                            replica = msg.replica,
                            at = ?timestamp,
                            done = finished.len(),
                            of = count,
                            "replica finished"
                        );
                    }
                }
                ReplicaEvent::Failed(reason) => {
                    if pending.remove(&msg.replica) {
                        tracing::warn!(
                            replica = msg.replica,
                            %reason,
                            "replica failed, excluding it"
                        );
                        self.rebuild_replicas = true;
                    }
                }
                ReplicaEvent::Stopped => {
                    if pending.remove(&msg.replica) {
                        tracing::warn!(replica = msg.replica, "replica stopped, excluding it");
                        self.rebuild_replicas = true;
                    }
                }
                ReplicaEvent::Started | ReplicaEvent::Snapshot(_) => {}
            }
        }

        for replica in &pending {
            tracing::warn!(
                replica,
                timeout_ms = self.options.finish_timeout_ms,
                "replica did not finish in time, excluding it"
            );
        }
        if !pending.is_empty() {
            self.rebuild_replicas = true;
        }
        if finished.is_empty() {
            return Err(SubstrateError::replica(format!(
                "no replica finished scene {scene}"
            )));
        }
        finished.sort_unstable();
        Ok(Wait::Done((finished, self.paused_total - paused_before)))
    }

    /// Ask finished replicas for their bands and compose the scene.
    ///
    /// Bands that never arrive stay transparent.
    fn collect_frame(
        &self,
        scene: u64,
        finished: &[usize],
    ) -> SubstrateResult<FrameRGBA> {
        let replicas = self.replicas()?;
        let mut expected: BTreeSet<usize> = finished
            .iter()
            .copied()
            .filter(|&r| replicas.send(r, ReplicaCommand::Snapshot))
            .collect();

        let deadline = Instant::now() + Duration::from_millis(self.options.finish_timeout_ms);
        let mut slices: Vec<ReplicaSlice> = Vec::with_capacity(expected.len());
        while !expected.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let ReplicaMessage {
                replica,
                scene: from,
                event,
            } = match replicas.recv_timeout(deadline - now) {
                Ok(msg) => msg,
                Err(_) => break,
            };
            if from != scene {
                continue;
            }
            match event {
                ReplicaEvent::Snapshot(slice) if expected.remove(&replica) => slices.push(slice),
                ReplicaEvent::Failed(reason) if expected.remove(&replica) => {
                    tracing::warn!(replica, %reason, "replica could not provide its band");
                }
                _ => {}
            }
        }
        for replica in &expected {
            tracing::warn!(replica, "band missing from scene");
        }
        compose_slices(self.options.world, &slices)
    }

    /// Fade every replica and wait out the transition delay.
    ///
    /// With `advance` the next scene also gets a new palette, seed and path modulation;
    /// calibration scenes keep theirs so their timings stay comparable.
    fn wait_transition(&mut self, advance: bool) -> Wait<()> {
        self.state = SceneState::Transitioning;
        if advance {
            self.palette.next_palette();
            self.seed = self.seed.wrapping_mul(3);
            self.modulate_path =
                SeededRandom::new(self.seed).next_float() < MODULATE_PATH_CHANCE;
        }
        tracing::info!(
            seed = self.seed,
            palette = self.palette.name(),
            modulate_path = self.modulate_path,
            "transitioning"
        );
        if let Ok(replicas) = self.replicas() {
            replicas.fade();
        }

        let deadline = Instant::now() + Duration::from_millis(self.options.transition_delay_ms);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() && !self.paused {
                return Wait::Done(());
            }
            let wait = if self.paused { CONTROL_POLL } else { remaining };
            match self.control.recv_timeout(wait) {
                Ok(Control::Stop) => return Wait::Stopped,
                Ok(Control::Pause(paused)) => self.apply_pause(paused),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Wait::Done(()),
            }
        }
    }

    /// Apply at most one pending control request.
    fn poll_control(&mut self) -> Option<Control> {
        let control = self.control.try_recv().ok()?;
        if let Control::Pause(paused) = control {
            self.apply_pause(paused);
        }
        Some(control)
    }

    fn apply_pause(&mut self, paused: bool) {
        if paused == self.paused {
            return;
        }
        self.paused = paused;
        if paused {
            self.paused_since = Some(Instant::now());
        } else if let Some(since) = self.paused_since.take() {
            self.paused_total += since.elapsed();
        }
        if let Some(replicas) = self.replicas.as_ref() {
            replicas.pause(paused);
        }
        tracing::info!(paused, "pause toggled");
    }

    /// Fingerprint of the scene that would start next.
    fn next_fingerprint(&self) -> SceneFingerprint {
        scene_fingerprint(self.seed, self.options.world, self.palette.name())
    }
}

impl<S, P> std::fmt::Debug for Orchestrator<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("state", &self.state)
            .field("seed", &self.seed)
            .field("palette", &self.palette.name())
            .field("scene_index", &self.scene_index)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/orchestrator.rs"]
mod tests;

use std::time::Duration;

use crate::foundation::error::SubstrateResult;
use crate::render::frame::FrameRGBA;
use crate::scene::fingerprint::SceneFingerprint;

/// Configuration provided to a [`SceneSink`] before the first scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
}

/// A finished scene as composed from every replica band.
#[derive(Debug, Clone)]
pub struct SceneFrame {
    /// Zero-based scene number within the run.
    pub index: u64,
    pub fingerprint: SceneFingerprint,
    pub seed: u64,
    pub palette: &'static str,
    pub worker_count: usize,
    /// Wall time from start until the last replica finished.
    pub duration: Duration,
    /// The scene was a calibration run.
    pub calibrating: bool,
    pub frame: FrameRGBA,
}

/// Consumer of finished scenes.
///
/// Ordering contract: `push_scene` is called in increasing `index` order between `begin` and
/// `end`.
pub trait SceneSink {
    fn begin(&mut self, cfg: SinkConfig) -> SubstrateResult<()>;
    fn push_scene(&mut self, scene: &SceneFrame) -> SubstrateResult<()>;
    fn end(&mut self) -> SubstrateResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    ended: bool,
    /// Scenes in run order.
    pub scenes: Vec<SceneFrame>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// `end` was called after the last `begin`.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl SceneSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> SubstrateResult<()> {
        self.cfg = Some(cfg);
        self.ended = false;
        self.scenes.clear();
        Ok(())
    }

    fn push_scene(&mut self, scene: &SceneFrame) -> SubstrateResult<()> {
        self.scenes.push(scene.clone());
        Ok(())
    }

    fn end(&mut self) -> SubstrateResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Sink that drops every scene.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SceneSink for NullSink {
    fn begin(&mut self, _cfg: SinkConfig) -> SubstrateResult<()> {
        Ok(())
    }

    fn push_scene(&mut self, _scene: &SceneFrame) -> SubstrateResult<()> {
        Ok(())
    }

    fn end(&mut self) -> SubstrateResult<()> {
        Ok(())
    }
}

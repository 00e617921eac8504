use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::encode::sink::{SceneFrame, SceneSink, SinkConfig};
use crate::foundation::error::{SubstrateError, SubstrateResult};

/// Writes every scene to `<dir>/scene_<index>_<fingerprint>.png`.
#[derive(Debug)]
pub struct PngSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl PngSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, in scene order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn file_name(scene: &SceneFrame) -> String {
        format!("scene_{:04}_{}.png", scene.index, scene.fingerprint)
    }
}

impl SceneSink for PngSink {
    fn begin(&mut self, _cfg: SinkConfig) -> SubstrateResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output directory '{}'", self.dir.display()))?;
        self.written.clear();
        Ok(())
    }

    fn push_scene(&mut self, scene: &SceneFrame) -> SubstrateResult<()> {
        let frame = &scene.frame;
        let expected = frame.width as usize * frame.height as usize * 4;
        if frame.data.len() != expected {
            return Err(SubstrateError::validation(format!(
                "scene {} frame has {} bytes, expected {expected}",
                scene.index,
                frame.data.len()
            )));
        }
        let path = self.dir.join(Self::file_name(scene));
        image::save_buffer_with_format(
            &path,
            &frame.data,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        tracing::info!(path = %path.display(), "scene written");
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self) -> SubstrateResult<()> {
        Ok(())
    }
}

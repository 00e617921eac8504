//! Persistence of the calibrated worker count between sessions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::foundation::error::{SubstrateError, SubstrateResult};

/// Outcome of a finished calibration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CalibratedPreference {
    pub worker_count: usize,
    /// Duration of the chosen calibration scene, in milliseconds.
    pub benchmark_ms: u64,
}

impl CalibratedPreference {
    pub fn new(worker_count: usize, benchmark: Duration) -> Self {
        Self {
            worker_count,
            benchmark_ms: u64::try_from(benchmark.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn benchmark(&self) -> Duration {
        Duration::from_millis(self.benchmark_ms)
    }
}

/// Where calibration results live between runs.
pub trait PreferenceStore {
    /// Stored preference, or `None` if nothing was saved yet.
    fn load(&self) -> SubstrateResult<Option<CalibratedPreference>>;
    fn store(&mut self, pref: &CalibratedPreference) -> SubstrateResult<()>;
}

/// Preference kept in a JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFileStore {
    fn load(&self) -> SubstrateResult<Option<CalibratedPreference>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(SubstrateError::persistence(format!(
                    "read preferences '{}': {err}",
                    self.path.display()
                )));
            }
        };
        let pref = serde_json::from_str(&text).map_err(|e| {
            SubstrateError::serde(format!(
                "preferences '{}' are not valid JSON: {e}",
                self.path.display()
            ))
        })?;
        Ok(Some(pref))
    }

    fn store(&mut self, pref: &CalibratedPreference) -> SubstrateResult<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|e| {
                SubstrateError::persistence(format!("create '{}': {e}", dir.display()))
            })?;
        }
        let text = serde_json::to_string_pretty(pref)
            .map_err(|e| SubstrateError::serde(format!("serialize preferences: {e}")))?;
        std::fs::write(&self.path, text).map_err(|e| {
            SubstrateError::persistence(format!(
                "write preferences '{}': {e}",
                self.path.display()
            ))
        })?;
        tracing::debug!(
            path = %self.path.display(),
            worker_count = pref.worker_count,
            "preferences stored"
        );
        Ok(())
    }
}

/// Preference kept for the lifetime of the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    pref: Option<CalibratedPreference>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(pref: CalibratedPreference) -> Self {
        Self { pref: Some(pref) }
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> SubstrateResult<Option<CalibratedPreference>> {
        Ok(self.pref)
    }

    fn store(&mut self, pref: &CalibratedPreference) -> SubstrateResult<()> {
        self.pref = Some(*pref);
        Ok(())
    }
}

//! Picks a replica count by timing whole scenes at increasing parallelism.

use std::fmt;
use std::time::{Duration, SystemTime};

use crate::foundation::error::{SubstrateError, SubstrateResult};

/// Timing of one calibration scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalibrationRecord {
    pub worker_count: usize,
    pub started_at: SystemTime,
    pub finished_at: SystemTime,
    pub duration: Duration,
}

impl CalibrationRecord {
    /// Record spanning `started_at..finished_at`. A clock running backwards yields zero.
    pub fn new(worker_count: usize, started_at: SystemTime, finished_at: SystemTime) -> Self {
        Self {
            worker_count,
            started_at,
            finished_at,
            duration: finished_at.duration_since(started_at).unwrap_or_default(),
        }
    }
}

/// What the host should do after a calibration scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationStep {
    /// Rebuild the replicas with `worker_count` and run another scene.
    Continue { worker_count: usize },
    /// Calibration is over; use `worker_count` from now on.
    Finished {
        worker_count: usize,
        duration: Duration,
    },
}

/// Latest result compared with the previous and best ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalibrationStatus {
    pub latest: CalibrationRecord,
    pub previous: Option<CalibrationRecord>,
    pub best: CalibrationRecord,
}

impl fmt::Display for CalibrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "latest {} workers in {:.3}s",
            self.latest.worker_count,
            self.latest.duration.as_secs_f64()
        )?;
        if let Some(previous) = self.previous {
            let delta = self.latest.duration.as_secs_f64() - previous.duration.as_secs_f64();
            write!(f, " ({delta:+.3}s vs {} workers)", previous.worker_count)?;
        }
        write!(
            f,
            ", best {} workers in {:.3}s",
            self.best.worker_count,
            self.best.duration.as_secs_f64()
        )
    }
}

/// Scene-level controller that walks the worker count upward until it stops paying off.
#[derive(Clone, Debug)]
pub struct Calibrator {
    records: Vec<CalibrationRecord>,
    worker_count: usize,
    calibrating: bool,
    early_exit: bool,
    max_workers: usize,
}

impl Calibrator {
    /// Start calibrating at one worker.
    pub fn new(early_exit: bool, max_workers: usize) -> Self {
        Self {
            records: Vec::new(),
            worker_count: 1,
            calibrating: true,
            early_exit,
            max_workers: max_workers.max(1),
        }
    }

    /// A controller that is not calibrating and keeps `worker_count`.
    pub fn settled(worker_count: usize) -> Self {
        Self {
            records: Vec::new(),
            worker_count: worker_count.max(1),
            calibrating: false,
            early_exit: true,
            max_workers: worker_count.max(1),
        }
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrating
    }

    /// Worker count for the next scene.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn records(&self) -> &[CalibrationRecord] {
        &self.records
    }

    /// Fastest record so far; the earliest wins ties.
    pub fn best(&self) -> Option<CalibrationRecord> {
        self.records.iter().copied().reduce(|best, r| {
            if r.duration < best.duration { r } else { best }
        })
    }

    pub fn status(&self) -> Option<CalibrationStatus> {
        let latest = *self.records.last()?;
        let previous = self
            .records
            .len()
            .checked_sub(2)
            .map(|i| self.records[i]);
        Some(CalibrationStatus {
            latest,
            previous,
            best: self.best()?,
        })
    }

    /// Account for a finished calibration scene and decide what comes next.
    pub fn record(&mut self, record: CalibrationRecord) -> SubstrateResult<CalibrationStep> {
        if !self.calibrating {
            return Err(SubstrateError::validation(
                "calibration record received while not calibrating",
            ));
        }
        self.records.push(record);
        let Some(best) = self.best() else {
            return Err(SubstrateError::simulation("calibration has no records"));
        };

        let regressed = self
            .status()
            .and_then(|s| s.previous)
            .is_some_and(|previous| previous.duration < record.duration);
        if self.early_exit && regressed {
            tracing::info!(
                worker_count = best.worker_count,
                "calibration stopped after a slower run"
            );
            return Ok(self.finish(best));
        }

        let next = self.worker_count + 1;
        if next > self.max_workers {
            tracing::info!(
                worker_count = best.worker_count,
                max_workers = self.max_workers,
                "calibration reached the worker limit"
            );
            return Ok(self.finish(best));
        }
        self.worker_count = next;
        tracing::info!(worker_count = next, "calibration scaling up");
        Ok(CalibrationStep::Continue { worker_count: next })
    }

    fn finish(&mut self, best: CalibrationRecord) -> CalibrationStep {
        self.calibrating = false;
        self.worker_count = best.worker_count;
        CalibrationStep::Finished {
            worker_count: best.worker_count,
            duration: best.duration,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/calibration.rs"]
mod tests;

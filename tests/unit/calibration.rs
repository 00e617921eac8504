use super::*;

fn run(worker_count: usize, millis: u64) -> CalibrationRecord {
    let started_at = SystemTime::UNIX_EPOCH + Duration::from_secs(worker_count as u64 * 1000);
    CalibrationRecord::new(
        worker_count,
        started_at,
        started_at + Duration::from_millis(millis),
    )
}

#[test]
fn record_measures_elapsed_time() {
    let r = run(3, 1500);
    assert_eq!(r.duration, Duration::from_millis(1500));
    let backwards = CalibrationRecord::new(1, r.finished_at, r.started_at);
    assert_eq!(backwards.duration, Duration::ZERO);
}

#[test]
fn first_record_always_scales_up() {
    let mut c = Calibrator::new(true, 15);
    assert_eq!(c.worker_count(), 1);
    assert_eq!(
        c.record(run(1, 500)).unwrap(),
        CalibrationStep::Continue { worker_count: 2 }
    );
    assert!(c.is_calibrating());
}

#[test]
fn early_exit_adopts_best_on_first_regression() {
    let mut c = Calibrator::new(true, 15);
    c.record(run(1, 400)).unwrap();
    c.record(run(2, 300)).unwrap();
    let step = c.record(run(3, 350)).unwrap();
    assert_eq!(
        step,
        CalibrationStep::Finished {
            worker_count: 2,
            duration: Duration::from_millis(300),
        }
    );
    assert!(!c.is_calibrating());
    assert_eq!(c.worker_count(), 2);
    assert!(c.record(run(2, 300)).is_err());
}

#[test]
fn without_early_exit_calibration_runs_to_the_ceiling() {
    let mut c = Calibrator::new(false, 4);
    for (w, ms) in [(1, 400), (2, 200), (3, 500)] {
        assert_eq!(
            c.record(run(w, ms)).unwrap(),
            CalibrationStep::Continue { worker_count: w + 1 }
        );
    }
    assert_eq!(
        c.record(run(4, 450)).unwrap(),
        CalibrationStep::Finished {
            worker_count: 2,
            duration: Duration::from_millis(200),
        }
    );
}

#[test]
fn ties_keep_the_earliest_best() {
    let mut c = Calibrator::new(false, 3);
    c.record(run(1, 300)).unwrap();
    c.record(run(2, 200)).unwrap();
    let step = c.record(run(3, 200)).unwrap();
    assert_eq!(
        step,
        CalibrationStep::Finished {
            worker_count: 2,
            duration: Duration::from_millis(200),
        }
    );
}

#[test]
fn status_reports_delta_and_best() {
    let mut c = Calibrator::new(true, 15);
    assert!(c.status().is_none());
    c.record(run(1, 400)).unwrap();
    c.record(run(2, 250)).unwrap();
    let status = c.status().unwrap();
    assert_eq!(status.latest.worker_count, 2);
    assert_eq!(status.previous.map(|p| p.worker_count), Some(1));
    assert_eq!(status.best.worker_count, 2);
    let text = status.to_string();
    assert!(text.contains("-0.150s"), "{text}");
}

#[test]
fn settled_controller_does_not_calibrate() {
    let c = Calibrator::settled(6);
    assert!(!c.is_calibrating());
    assert_eq!(c.worker_count(), 6);
}

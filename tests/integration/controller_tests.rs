//! Background scans driven through the controller.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vidupe::controller::{ControllerError, ScanController, ScanEvent};
use vidupe::scanner::{ExtractError, Fingerprint, FingerprintExtractor};
use vidupe::signal::KillSwitch;

use super::support::{abc_fixture, extractor, TableExtractor};

/// Waits for a token before fingerprinting each file.
struct Gated {
    gate: Mutex<Receiver<()>>,
}

impl Gated {
    fn new() -> (Arc<Self>, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        (Arc::new(Self { gate: Mutex::new(rx) }), tx)
    }
}

impl FingerprintExtractor for Gated {
    fn extract(&self, path: &Path) -> Result<Fingerprint, ExtractError> {
        // A dropped sender releases every file at once.
        let _ = self.gate.lock().unwrap().recv();
        TableExtractor.extract(path)
    }
}

fn controller() -> ScanController {
    ScanController::new().with_poll_interval(Duration::from_millis(5))
}

#[test]
fn test_events_end_with_finished() {
    let dir = abc_fixture();
    let mut controller = controller();
    controller.start(dir.path(), extractor(), KillSwitch::new()).unwrap();

    let mut events = Vec::new();
    let outcome = controller.wait(|event| events.push(event.clone())).unwrap();

    assert!(!controller.is_running());
    assert_eq!(outcome.groups().len(), 1);
    assert!(matches!(events.last(), Some(ScanEvent::Finished(_))));
    assert!(matches!(events.first(), Some(ScanEvent::Log(l)) if l.starts_with("Scanning for duplicates in")));

    let processed: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Progress(p) => Some(p.processed),
            _ => None,
        })
        .collect();
    assert_eq!(processed, vec![1, 2, 3, 4]);
}

#[test]
fn test_second_start_rejected_while_running() {
    let dir = abc_fixture();
    let (gated, release) = Gated::new();
    let mut controller = controller();
    controller.start(dir.path(), gated, KillSwitch::new()).unwrap();

    let err = controller
        .start(dir.path(), extractor(), KillSwitch::new())
        .unwrap_err();
    assert!(matches!(err, ControllerError::AlreadyRunning));

    drop(release);
    let outcome = controller.wait(|_| {}).unwrap();
    assert_eq!(outcome.groups().len(), 1);

    // Idle again, so a new scan may start.
    controller.start(dir.path(), extractor(), KillSwitch::new()).unwrap();
    assert!(controller.wait(|_| {}).is_some());
}

#[test]
fn test_kill_aborts_scan() {
    let dir = abc_fixture();
    let (gated, release) = Gated::new();
    let kill = KillSwitch::new();
    let mut controller = controller();
    controller.start(dir.path(), gated, kill.clone()).unwrap();

    release.send(()).unwrap();
    assert!(controller.kill());
    assert!(kill.is_triggered());
    drop(release);

    let mut logs = Vec::new();
    let outcome = controller
        .wait(|event| {
            if let ScanEvent::Log(line) = event {
                logs.push(line.clone());
            }
        })
        .unwrap();

    assert!(outcome.is_aborted());
    assert!(outcome.groups().is_empty());
    assert!(outcome.summary().processed_files < 4);
    assert!(logs.iter().any(|l| l == "Scan killed by user."));
}

#[test]
fn test_kill_when_idle_is_noop() {
    let controller = controller();
    assert!(!controller.kill());
}

#[test]
fn test_start_resets_kill_switch() {
    let dir = abc_fixture();
    let kill = KillSwitch::new();
    kill.trigger();

    let mut controller = controller();
    controller.start(dir.path(), extractor(), kill.clone()).unwrap();
    assert!(!kill.is_triggered());

    let outcome = controller.wait(|_| {}).unwrap();
    assert!(!outcome.is_aborted());
}

#[test]
fn test_drop_stops_running_scan() {
    let dir = abc_fixture();
    let (gated, release) = Gated::new();
    let kill = KillSwitch::new();
    {
        let mut controller = controller();
        controller.start(dir.path(), gated, kill.clone()).unwrap();
        drop(release);
    }
    assert!(kill.is_triggered());
}

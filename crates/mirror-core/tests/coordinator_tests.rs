//! Tests for the SyncCoordinator before/after protocol

use std::collections::BTreeSet;
use std::sync::Arc;

use mirror_core::{ChangeKind, CyclePhase, Error, HookPoint, SyncCoordinator};
use mirror_test_utils::{DriverCall, RecordingDriver, TestMirror};
use pretty_assertions::assert_eq;

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_full_cycle_mirrors_local_changes() {
    // Remote {a, b}; the unit of work deletes a and creates c
    let mirror = TestMirror::new();
    mirror.write_remote("a.whl", "a");
    mirror.write_remote("b.whl", "b");
    let mut coordinator = SyncCoordinator::from_driver(mirror.local_driver());

    let summary = coordinator.before_unit_of_work().unwrap();
    assert_eq!(summary.pulled, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.snapshot_size, 2);
    assert_eq!(coordinator.phase(), CyclePhase::SnapshotCaptured);

    mirror.remove_local("a.whl");
    mirror.write_local("c.whl", "c");

    let report = coordinator.after_unit_of_work();

    assert!(report.success());
    assert_eq!(report.results(), vec![true, true]);
    assert_eq!(report.events[0].kind, ChangeKind::Removal);
    assert_eq!(report.events[0].names, vec!["a.whl".to_string()]);
    assert_eq!(report.events[1].names, vec!["c.whl".to_string()]);
    assert_eq!(mirror.remote_names(), names(&["b.whl", "c.whl"]));
    assert_eq!(mirror.read_remote("c.whl"), "c");
    assert_eq!(coordinator.phase(), CyclePhase::Idle);
}

#[test]
fn test_untouched_cycle_replays_nothing() {
    let mirror = TestMirror::new();
    let driver = Arc::new(RecordingDriver::new(mirror.local_root()).with_remote(["a.whl"]));
    let mut coordinator = SyncCoordinator::from_driver(driver.clone());

    coordinator.before_unit_of_work().unwrap();
    let report = coordinator.after_unit_of_work();

    assert!(report.success());
    assert!(report.events.iter().all(|e| e.names.is_empty()));
    assert_eq!(driver.calls(), vec![DriverCall::Pull("a.whl".into())]);
}

#[test]
fn test_failed_pull_entries_are_counted() {
    let mirror = TestMirror::new();
    let driver = RecordingDriver::new(mirror.local_root())
        .with_remote(["a.whl", "b.whl", "bad name"])
        .failing_on("b.whl")
        .erroring_on("bad name");
    let mut coordinator = SyncCoordinator::from_driver(Arc::new(driver));

    let summary = coordinator.before_unit_of_work().unwrap();

    assert_eq!(summary.pulled, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.snapshot_size, 1);
}

#[test]
fn test_before_propagates_enumeration_failure() {
    let mirror = TestMirror::new();
    let driver = RecordingDriver::new(mirror.root().join("missing"));
    let mut coordinator = SyncCoordinator::from_driver(Arc::new(driver));

    let result = coordinator.before_unit_of_work();

    assert!(matches!(result, Err(Error::Enumeration { .. })));
    assert_eq!(coordinator.phase(), CyclePhase::Idle);
}

#[test]
fn test_after_without_before_reports_error() {
    let mirror = TestMirror::new();
    let mut coordinator = SyncCoordinator::from_driver(mirror.local_driver());

    let report = coordinator.after_unit_of_work();

    assert!(!report.success());
    assert!(report.events.is_empty());
    assert!(report.error.is_some());
}

#[test]
fn test_after_absorbs_event_failure() {
    let mirror = TestMirror::new();
    let driver = Arc::new(RecordingDriver::new(mirror.local_root()).erroring_on("b.whl"));
    let mut coordinator = SyncCoordinator::from_driver(driver.clone());

    coordinator.before_unit_of_work().unwrap();
    mirror.write_local("a.whl", "a");
    mirror.write_local("b.whl", "b");
    let report = coordinator.after_unit_of_work();

    assert_eq!(report.results(), vec![true, false]);
    assert!(!report.success());
    assert_eq!(driver.remote_names(), names(&["a.whl"]));
}

#[test]
fn test_after_reports_names_that_failed_to_transfer() {
    let mirror = TestMirror::new();
    let driver = Arc::new(RecordingDriver::new(mirror.local_root()).failing_on("b.whl"));
    let mut coordinator = SyncCoordinator::from_driver(driver.clone());

    coordinator.before_unit_of_work().unwrap();
    mirror.write_local("b.whl", "b");
    let report = coordinator.after_unit_of_work();

    // The event itself succeeded, but b.whl never reached the remote
    assert!(report.success());
    assert_eq!(report.results(), vec![true, true]);
    assert_eq!(report.events[1].failed, vec!["b.whl".to_string()]);
    assert_eq!(report.failed_names().collect::<Vec<_>>(), vec!["b.whl"]);
    assert!(!report.fully_synchronized());
    assert!(driver.remote_names().is_empty());
}

#[test]
fn test_clean_cycle_is_fully_synchronized() {
    let mirror = TestMirror::new();
    let mut coordinator = SyncCoordinator::from_driver(mirror.local_driver());

    coordinator.before_unit_of_work().unwrap();
    mirror.write_local("a.whl", "a");
    let report = coordinator.after_unit_of_work();

    assert!(report.fully_synchronized());
    assert!(report.events.iter().all(|e| e.failed.is_empty()));
}

#[test]
fn test_after_skips_replay_when_before_failed() {
    // A completed cycle leaves a snapshot containing a.whl behind
    let mirror = TestMirror::new();
    mirror.write_remote("a.whl", "a");
    let mut coordinator = SyncCoordinator::from_driver(mirror.local_driver());
    coordinator.run_unit_of_work(|| ()).unwrap();

    let moved = mirror.root().join("remote-moved");
    std::fs::rename(mirror.remote_root(), &moved).unwrap();
    assert!(coordinator.dispatch(HookPoint::BeforeUnitOfWork).is_err());
    std::fs::rename(&moved, mirror.remote_root()).unwrap();

    mirror.remove_local("a.whl");
    coordinator.dispatch(HookPoint::AfterUnitOfWork).unwrap();

    mirror.assert_remote_exists("a.whl");
    assert_eq!(coordinator.phase(), CyclePhase::Idle);
}

#[test]
fn test_after_reports_unprepared_cycle_after_failed_before() {
    let mirror = TestMirror::new();
    mirror.write_remote("a.whl", "a");
    let mut coordinator = SyncCoordinator::from_driver(mirror.local_driver());
    coordinator.run_unit_of_work(|| ()).unwrap();

    let moved = mirror.root().join("remote-moved");
    std::fs::rename(mirror.remote_root(), &moved).unwrap();
    assert!(coordinator.before_unit_of_work().is_err());
    std::fs::rename(&moved, mirror.remote_root()).unwrap();

    mirror.remove_local("a.whl");
    let report = coordinator.after_unit_of_work();

    assert!(!report.success());
    assert!(report.events.is_empty());
    assert_eq!(report.error, Some(Error::CycleNotPrepared.to_string()));
}

#[test]
fn test_run_unit_of_work_brackets_closure() {
    let mirror = TestMirror::new();
    mirror.write_remote("a.whl", "a");
    let mut coordinator = SyncCoordinator::from_driver(mirror.local_driver());

    let (output, report) = coordinator
        .run_unit_of_work(|| {
            mirror.assert_local_exists("a.whl");
            mirror.write_local("built.whl", "built");
            42
        })
        .unwrap();

    assert_eq!(output, 42);
    assert!(report.success());
    mirror.assert_remote_exists("built.whl");
}

#[test]
fn test_run_unit_of_work_skips_closure_when_before_fails() {
    let mirror = TestMirror::new();
    let driver = RecordingDriver::new(mirror.root().join("missing"));
    let mut coordinator = SyncCoordinator::from_driver(Arc::new(driver));
    let mut ran = false;

    let result = coordinator.run_unit_of_work(|| ran = true);

    assert!(result.is_err());
    assert!(!ran);
}

#[test]
fn test_dispatch_drives_both_hook_points() {
    let mirror = TestMirror::new();
    let mut coordinator = SyncCoordinator::from_driver(mirror.local_driver());

    coordinator.dispatch(HookPoint::BeforeUnitOfWork).unwrap();
    mirror.write_local("a.whl", "a");
    coordinator.dispatch(HookPoint::AfterUnitOfWork).unwrap();

    mirror.assert_remote_exists("a.whl");
}

#[test]
fn test_consecutive_cycles_use_fresh_snapshots() {
    let mirror = TestMirror::new();
    let mut coordinator = SyncCoordinator::from_driver(mirror.local_driver());

    coordinator.run_unit_of_work(|| mirror.write_local("a.whl", "a")).unwrap();
    let (_, report) = coordinator.run_unit_of_work(|| ()).unwrap();

    // a.whl was pulled back and snapshotted, so the second cycle is a no-op
    assert!(report.events.iter().all(|e| e.names.is_empty()));
    assert_eq!(mirror.remote_names(), names(&["a.whl"]));
}

#[test]
fn test_cycle_report_serializes_for_hosts() {
    let mirror = TestMirror::new();
    mirror.write_remote("old.whl", "o");
    let mut coordinator = SyncCoordinator::from_driver(mirror.local_driver());

    let (_, report) = coordinator
        .run_unit_of_work(|| mirror.remove_local("old.whl"))
        .unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["events"][0]["kind"], "removal");
    assert_eq!(value["events"][0]["names"][0], "old.whl");
    assert_eq!(value["events"][1]["kind"], "addition");
    assert_eq!(value["events"][0]["failed"], serde_json::json!([]));
    assert!(value["error"].is_null());
}

use std::fs;

use tempfile::TempDir;
use xo_monitor::{ControlChannel, ControlRecord};

fn control_file(contents: &[u8]) -> (TempDir, ControlChannel) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state");
    fs::write(&path, contents).unwrap();
    (dir, ControlChannel::new(path))
}

#[test]
fn test_toggle_twice_restores_record() {
    let (_dir, control) = control_file(b"0 7 0\n");

    let record = control.toggle_display().unwrap();
    assert_eq!(record.display_flag(), b'1');
    assert_eq!(fs::read(control.path()).unwrap(), b"1 7 0\n");

    let record = control.toggle_display().unwrap();
    assert_eq!(record.display_flag(), b'0');
    assert_eq!(fs::read(control.path()).unwrap(), b"0 7 0\n");
}

#[test]
fn test_request_termination() {
    let (_dir, control) = control_file(b"1 0 0\n");
    let record = control.request_termination().unwrap();
    assert_eq!(record, ControlRecord::new(*b"1 0 1\n"));
    assert_eq!(control.read_record().unwrap().terminate_flag(), b'1');
    assert_eq!(fs::read(control.path()).unwrap().len(), 6);
}

#[test]
fn test_missing_file_is_an_error_not_a_panic() {
    let dir = tempfile::tempdir().unwrap();
    let control = ControlChannel::new(dir.path().join("absent"));
    assert!(control.toggle_display().is_err());
    assert!(control.request_termination().is_err());
}

#[test]
fn test_short_record_is_rejected_and_left_alone() {
    let (_dir, control) = control_file(b"0 0");
    assert!(control.toggle_display().is_err());
    assert_eq!(fs::read(control.path()).unwrap(), b"0 0");
}

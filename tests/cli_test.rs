use std::fs::{self, File};
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;

use nix::pty::{openpty, Winsize};
use nix::sys::termios::Termios;
use xo_monitor::client::QUIT_NOTICE;
use xo_monitor::{CLEAR_SCREEN, KEY_QUIT};

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_xo-monitor"))
}

#[test]
fn test_help_lists_options() {
    let output = bin().arg("--help").output().expect("failed to run binary");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("non utf8 output");
    assert!(stdout.contains("--measure"));
    assert!(stdout.contains("--device"));
}

#[test]
fn test_unloaded_engine_aborts_startup() {
    let dir = tempfile::tempdir().unwrap();
    let output = bin()
        .arg("--status")
        .arg(dir.path().join("initstate"))
        .arg("--device")
        .arg(dir.path().join("device"))
        .output()
        .expect("failed to run binary");
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("non utf8 output");
    assert!(stderr.contains("not loaded"));
}

#[test]
fn test_engine_not_live_aborts_startup() {
    let dir = tempfile::tempdir().unwrap();
    let status = dir.path().join("initstate");
    std::fs::write(&status, "going\n").unwrap();
    let output = bin()
        .arg("--status")
        .arg(&status)
        .output()
        .expect("failed to run binary");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("non utf8 output");
    assert!(stderr.contains("going"));
}

#[test]
fn test_oversized_buffer_is_rejected() {
    let output = bin()
        .args(["--buffer-size", "1000000000000"])
        .output()
        .expect("failed to run binary");
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("non utf8 output");
    assert!(stderr.contains("--buffer-size"));
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn test_quit_key_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let status = dir.path().join("initstate");
    let device = dir.path().join("kxo");
    let control = dir.path().join("kxo_state");
    fs::write(&status, "live\n").unwrap();
    fs::write(&device, b"").unwrap();
    fs::write(&control, b"1 0 0\n").unwrap();

    let pty = openpty(None::<&Winsize>, None::<&Termios>).unwrap();
    let mut master = File::from(pty.master);
    let mut child = {
        let mut cmd = bin();
        cmd.arg("--status")
            .arg(&status)
            .arg("--device")
            .arg(&device)
            .arg("--control")
            .arg(&control)
            .stdin(Stdio::from(pty.slave.try_clone().unwrap()))
            .stdout(Stdio::from(pty.slave))
            .stderr(Stdio::null());
        cmd.spawn().expect("failed to start binary")
    };

    // a screen clear means raw mode is on and the loop is running
    let mut seen = Vec::new();
    let mut buf = [0u8; 4096];
    while !contains(&seen, CLEAR_SCREEN) {
        let n = master.read(&mut buf).expect("binary closed its terminal");
        assert!(n > 0);
        seen.extend_from_slice(&buf[..n]);
    }
    master.write_all(&[KEY_QUIT]).unwrap();

    let drain = thread::spawn(move || {
        while let Ok(n) = master.read(&mut buf) {
            if n == 0 {
                break;
            }
            seen.extend_from_slice(&buf[..n]);
        }
        seen
    });

    let exit = child.wait().unwrap();
    assert_eq!(exit.code(), Some(0));
    let screen = drain.join().unwrap();
    assert!(contains(&screen, QUIT_NOTICE.as_bytes()));
    assert_eq!(fs::read(&control).unwrap(), b"1 0 1\n");
}

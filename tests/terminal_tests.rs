use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::pty::{openpty, Winsize};
use nix::sys::termios::{tcgetattr, InputFlags, LocalFlags, Termios};
use xo_monitor::{RawMode, TerminalOutput};

fn pty() -> nix::pty::OpenptyResult {
    openpty(None::<&Winsize>, None::<&Termios>).unwrap()
}

fn is_nonblocking(fd: &std::os::fd::OwnedFd) -> bool {
    let bits = fcntl(fd, FcntlArg::F_GETFL).unwrap();
    OFlag::from_bits_truncate(bits).contains(OFlag::O_NONBLOCK)
}

#[test]
fn test_raw_mode_flags() {
    let pty = pty();
    let raw = RawMode::enable(&pty.slave).unwrap();
    let attrs = tcgetattr(&pty.slave).unwrap();
    assert!(!attrs.local_flags.contains(LocalFlags::ECHO));
    assert!(!attrs.local_flags.contains(LocalFlags::ICANON));
    assert!(!attrs.input_flags.contains(InputFlags::IXON));
    assert!(raw.is_active());
    assert!(is_nonblocking(&pty.slave));
}

#[test]
fn test_empty_read_returns_immediately() {
    let pty = pty();
    let _raw = RawMode::enable(&pty.slave).unwrap();
    let mut input = File::from(pty.slave.try_clone().unwrap());
    let mut byte = [0u8; 1];
    let err = input.read(&mut byte).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WouldBlock);
}

#[test]
fn test_disable_restores_original_attributes() {
    let pty = pty();
    let before = tcgetattr(&pty.slave).unwrap();

    let mut raw = RawMode::enable(&pty.slave).unwrap();
    assert_eq!(raw.original(), &before);
    raw.disable().unwrap();
    assert_eq!(tcgetattr(&pty.slave).unwrap(), before);
    assert!(!is_nonblocking(&pty.slave));

    // second call is harmless
    raw.disable().unwrap();
    assert!(!raw.is_active());
    assert_eq!(tcgetattr(&pty.slave).unwrap(), before);
}

#[test]
fn test_drop_restores_original_attributes() {
    let pty = pty();
    let before = tcgetattr(&pty.slave).unwrap();
    {
        let _raw = RawMode::enable(&pty.slave).unwrap();
        assert_ne!(tcgetattr(&pty.slave).unwrap(), before);
    }
    assert_eq!(tcgetattr(&pty.slave).unwrap(), before);
}

#[test]
fn test_non_terminal_is_rejected() {
    let file = tempfile::tempfile().unwrap();
    assert!(RawMode::enable(&file).is_err());
}

#[test]
fn test_output_waits_for_a_full_terminal() {
    const LEN: usize = 256 * 1024;

    let pty = pty();
    let mut master = File::from(pty.master);
    let slave = pty.slave;
    let raw = RawMode::enable(&slave).unwrap();

    let drain = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        let mut received = Vec::with_capacity(LEN);
        let mut buf = [0u8; 4096];
        while received.len() < LEN {
            match master.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => received.extend_from_slice(&buf[..n]),
            }
        }
        received
    });

    // without the wrapper this descriptor reports WouldBlock once full
    let mut screen = TerminalOutput::new(File::from(slave.try_clone().unwrap()));
    screen.write_all(&vec![b'x'; LEN]).unwrap();
    screen.flush().unwrap();

    let received = drain.join().unwrap();
    assert_eq!(received.len(), LEN);
    assert!(received.iter().all(|b| *b == b'x'));
    drop(screen);
    drop(raw);
}

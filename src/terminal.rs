#![cfg(feature = "std")]
//! Raw keyboard mode and terminal output for the interactive client.

use std::io::{self, ErrorKind, Write};
use std::os::fd::{AsFd, BorrowedFd};

use anyhow::Context;
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::termios::{tcgetattr, tcsetattr, InputFlags, LocalFlags, SetArg, Termios};

/// Scoped raw mode on a terminal descriptor.
///
/// While the guard lives, input is unechoed, not line buffered, flow control
/// keys are delivered as ordinary bytes, and reads never block. The original
/// attributes and file status flags are restored by [`RawMode::disable`] or,
/// failing that, when the guard is dropped.
pub struct RawMode<F: AsFd> {
    fd: F,
    original: Termios,
    original_flags: OFlag,
    active: bool,
}

impl<F: AsFd> RawMode<F> {
    /// Captures the current attributes of `fd` and switches it to raw,
    /// non-blocking input.
    pub fn enable(fd: F) -> anyhow::Result<Self> {
        let original = tcgetattr(fd.as_fd()).context("failed to read terminal attributes")?;
        let bits = fcntl(fd.as_fd(), FcntlArg::F_GETFL)
            .context("failed to read descriptor flags")?;
        let original_flags = OFlag::from_bits_truncate(bits);

        let mut raw = original.clone();
        raw.input_flags.remove(InputFlags::IXON);
        raw.local_flags.remove(LocalFlags::ECHO | LocalFlags::ICANON);

        // from here on a failure must still restore what was captured
        let guard = RawMode {
            fd,
            original,
            original_flags,
            active: true,
        };
        tcsetattr(guard.fd.as_fd(), SetArg::TCSAFLUSH, &raw)
            .context("failed to enter raw terminal mode")?;
        fcntl(
            guard.fd.as_fd(),
            FcntlArg::F_SETFL(original_flags | OFlag::O_NONBLOCK),
        )
        .context("failed to make terminal input non-blocking")?;
        log::debug!("raw terminal mode enabled");
        Ok(guard)
    }

    /// Restores the captured attributes. Calling it again is a no-op.
    pub fn disable(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let flags = fcntl(self.fd.as_fd(), FcntlArg::F_SETFL(self.original_flags))
            .context("failed to restore descriptor flags");
        tcsetattr(self.fd.as_fd(), SetArg::TCSAFLUSH, &self.original)
            .context("failed to restore terminal attributes")?;
        flags?;
        log::debug!("raw terminal mode disabled");
        Ok(())
    }

    /// Attributes captured before raw mode was entered.
    pub fn original(&self) -> &Termios {
        &self.original
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl<F: AsFd> Drop for RawMode<F> {
    fn drop(&mut self) {
        if let Err(e) = self.disable() {
            log::warn!("{:#}", e);
        }
    }
}

/// Writer for a terminal that may share a non-blocking file description with
/// the raw keyboard.
///
/// A write that would block waits until the descriptor drains and is then
/// retried, so slow terminals delay output instead of failing it.
pub struct TerminalOutput<W: Write + AsFd> {
    inner: W,
}

impl<W: Write + AsFd> TerminalOutput<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    fn wait_writable(&self) -> io::Result<()> {
        let mut fds = [PollFd::new(self.inner.as_fd(), PollFlags::POLLOUT)];
        loop {
            match poll(&mut fds, PollTimeout::NONE) {
                Ok(_) => return Ok(()),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(io::Error::from(e)),
            }
        }
    }
}

impl<W: Write + AsFd> Write for TerminalOutput<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            match self.inner.write(buf) {
                Err(e) if e.kind() == ErrorKind::WouldBlock => self.wait_writable()?,
                other => return other,
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        loop {
            match self.inner.flush() {
                Err(e) if e.kind() == ErrorKind::WouldBlock => self.wait_writable()?,
                other => return other,
            }
        }
    }
}

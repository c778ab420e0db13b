#![cfg(feature = "std")]
//! The interactive loop: keyboard and board device multiplexed on one
//! blocking wait.

use std::fs::File;
use std::io::{self, ErrorKind, Read, Write};
use std::os::fd::AsFd;
use std::time::Instant;

use anyhow::Context;
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use crate::config::{ClientConfig, CLEAR_SCREEN, MAX_BUFFER_SIZE, READY_TOKEN};
use crate::control::ControlChannel;
use crate::sampler::LatencySampler;
use crate::status::probe_status;
use crate::terminal::{RawMode, TerminalOutput};

/// Printed when the board display is paused.
pub const PAUSE_NOTICE: &str = "Stopping to display the chess board...";
/// Printed when the quit key is pressed.
pub const QUIT_NOTICE: &str = "Stopping the kernel space tic-tac-toe game...";

/// Single-byte keys the client reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keymap {
    pub pause: u8,
    pub quit: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    ToggleDisplay,
    Quit,
    Ignore,
}

impl Keymap {
    pub fn action(&self, byte: u8) -> KeyAction {
        if byte == self.pause {
            KeyAction::ToggleDisplay
        } else if byte == self.quit {
            KeyAction::Quit
        } else {
            KeyAction::Ignore
        }
    }
}

impl From<&ClientConfig> for Keymap {
    fn from(config: &ClientConfig) -> Self {
        Self {
            pause: config.pause_key,
            quit: config.quit_key,
        }
    }
}

/// Flags owned by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientState {
    pub display_enabled: bool,
    pub terminate: bool,
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            display_enabled: true,
            terminate: false,
        }
    }
}

/// Why [`EventLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The quit key was pressed.
    Quit,
    /// The latency sampler filled up.
    SamplesCollected,
}

#[derive(Debug, Clone, Copy, Default)]
struct Readiness {
    keyboard: bool,
    board: bool,
}

/// Waits on the keyboard `K` and board device `B`, writing snapshots and
/// notices to `W`.
pub struct EventLoop<K, B, W> {
    keyboard: K,
    board: B,
    output: W,
    control: ControlChannel,
    keymap: Keymap,
    buffer: Vec<u8>,
    state: ClientState,
    exit: Option<ExitReason>,
    sampler: Option<LatencySampler>,
}

impl<K, B, W> EventLoop<K, B, W>
where
    K: Read + AsFd,
    B: Read + AsFd,
    W: Write,
{
    /// `buffer_size` is clamped to `1..=MAX_BUFFER_SIZE`.
    pub fn new(
        keyboard: K,
        board: B,
        output: W,
        control: ControlChannel,
        keymap: Keymap,
        buffer_size: usize,
    ) -> Self {
        Self {
            keyboard,
            board,
            output,
            control,
            keymap,
            buffer: vec![0; buffer_size.clamp(1, MAX_BUFFER_SIZE)],
            state: ClientState::default(),
            exit: None,
            sampler: None,
        }
    }

    /// Times every board read with `sampler`; the loop stops once it is full.
    pub fn with_sampler(mut self, sampler: LatencySampler) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn sampler(&self) -> Option<&LatencySampler> {
        self.sampler.as_ref()
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Runs until the quit key is pressed or the sampler is full.
    pub fn run(&mut self) -> anyhow::Result<ExitReason> {
        if self.sampler.is_some() {
            writeln!(
                self.output,
                "Measuring the time taken to read the display buffer..."
            )?;
            self.output.flush()?;
        }
        while !self.state.terminate {
            self.step()?;
        }
        Ok(self.exit.unwrap_or(ExitReason::Quit))
    }

    /// One iteration: wait, then handle at most one event. Keyboard input
    /// wins when both sources are ready.
    pub fn step(&mut self) -> anyhow::Result<()> {
        let ready = self.wait()?;
        if ready.keyboard {
            self.handle_keyboard()
        } else if ready.board && self.state.display_enabled {
            self.refresh_board()
        } else {
            Ok(())
        }
    }

    fn wait(&self) -> anyhow::Result<Readiness> {
        let mut fds = [
            PollFd::new(self.keyboard.as_fd(), PollFlags::POLLIN),
            PollFd::new(self.board.as_fd(), PollFlags::POLLIN),
        ];
        loop {
            match poll(&mut fds, PollTimeout::NONE) {
                Ok(_) => break,
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e).context("error waiting on keyboard and board device"),
            }
        }
        // hang-up and error count as readable, the following read reports it
        let readable = PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR;
        let is_ready = |fd: &PollFd| fd.revents().is_some_and(|r| r.intersects(readable));
        Ok(Readiness {
            keyboard: is_ready(&fds[0]),
            board: is_ready(&fds[1]),
        })
    }

    fn handle_keyboard(&mut self) -> anyhow::Result<()> {
        let mut byte = [0u8; 1];
        match self.keyboard.read(&mut byte) {
            Ok(1) => self.handle_key(byte[0]),
            // readable with nothing to read: the terminal hung up or stdin hit EOF
            Ok(_) => anyhow::bail!("keyboard input closed"),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                log::debug!("keyboard woke without input: {}", e);
                Ok(())
            }
            Err(e) => Err(e).context("failed to read keyboard input"),
        }
    }

    /// Applies a single key press.
    pub fn handle_key(&mut self, byte: u8) -> anyhow::Result<()> {
        match self.keymap.action(byte) {
            KeyAction::ToggleDisplay => match self.control.toggle_display() {
                Ok(_) => {
                    self.state.display_enabled = !self.state.display_enabled;
                    if !self.state.display_enabled {
                        self.notice(PAUSE_NOTICE)?;
                    }
                }
                Err(e) => log::debug!(
                    "display toggle skipped, {}: {}",
                    self.control.path().display(),
                    e
                ),
            },
            KeyAction::Quit => {
                if let Err(e) = self.control.request_termination() {
                    log::warn!(
                        "could not signal termination through {}: {}",
                        self.control.path().display(),
                        e
                    );
                }
                self.state.display_enabled = false;
                self.state.terminate = true;
                self.exit = Some(ExitReason::Quit);
                self.notice(QUIT_NOTICE)?;
            }
            KeyAction::Ignore => {}
        }
        Ok(())
    }

    fn refresh_board(&mut self) -> anyhow::Result<()> {
        self.output.write_all(CLEAR_SCREEN)?;

        let started = Instant::now();
        let read = self.board.read(&mut self.buffer);
        let elapsed = started.elapsed();

        let len = match read {
            Ok(len) => len,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => 0,
            Err(e) => {
                log::warn!("board read failed: {}", e);
                0
            }
        };
        if len == 0 {
            log::debug!("no board update this cycle");
            self.output.flush()?;
            return Ok(());
        }

        self.output.write_all(&self.buffer[..len])?;
        if let Some(sampler) = self.sampler.as_mut() {
            sampler.record(elapsed);
            writeln!(self.output)?;
            writeln!(self.output, "Current measured time: {} us", elapsed.as_micros())?;
            writeln!(self.output, "Remaining measurements: {}", sampler.remaining())?;
            if sampler.is_full() {
                log::info!("collected {} samples", sampler.samples().len());
                self.state.terminate = true;
                self.exit = Some(ExitReason::SamplesCollected);
            }
        }
        self.output.flush().context("failed to write board snapshot")
    }

    fn notice(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)?;
        self.output.flush()
    }
}

/// Checks the engine, enters raw mode and runs the loop on stdin and stdout.
///
/// Raw mode is left before this returns, on success and on error. Collected
/// latency samples are saved afterwards when measuring is enabled.
pub fn run(config: &ClientConfig) -> anyhow::Result<ExitReason> {
    probe_status(&config.status, READY_TOKEN)?;
    let board = File::open(&config.device)
        .with_context(|| format!("failed to open {}", config.device.display()))?;

    let stdin = io::stdin();
    let mut raw = RawMode::enable(stdin.as_fd())?;
    let keyboard = File::from(
        raw.fd()
            .try_clone_to_owned()
            .context("failed to duplicate stdin")?,
    );

    // unbuffered so a write that would block can be retried without losing
    // anything held in a std buffer
    let screen = TerminalOutput::new(File::from(
        io::stdout()
            .as_fd()
            .try_clone_to_owned()
            .context("failed to duplicate stdout")?,
    ));

    let mut event_loop = EventLoop::new(
        keyboard,
        board,
        screen,
        ControlChannel::new(&config.control),
        Keymap::from(config),
        config.buffer_size,
    );
    if let Some(measure) = &config.measure {
        event_loop = event_loop.with_sampler(LatencySampler::from_config(measure));
    }

    let outcome = event_loop.run();
    let reason = restore_then(outcome, raw.disable())?;

    if let (Some(measure), Some(sampler)) = (&config.measure, event_loop.sampler()) {
        sampler
            .save(&measure.output)
            .with_context(|| format!("failed to write {}", measure.output.display()))?;
        log::info!(
            "wrote {} samples to {}",
            sampler.samples().len(),
            measure.output.display()
        );
    }
    Ok(reason)
}

/// Combines the loop result with the terminal restore result. A loop error
/// takes precedence; a restore failure next to it is only logged.
fn restore_then<T>(
    outcome: anyhow::Result<T>,
    restored: anyhow::Result<()>,
) -> anyhow::Result<T> {
    match (outcome, restored) {
        (Err(e), Err(restore)) => {
            log::warn!("{:#}", restore);
            Err(e)
        }
        (outcome, restored) => {
            restored?;
            outcome
        }
    }
}

#![cfg(feature = "std")]
//! Read-modify-write access to the engine's control record.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use crate::config::{CONTROL_RECORD_LEN, DISPLAY_FLAG_OFFSET, TERMINATE_FLAG_OFFSET};

/// The fixed-width status record. Bytes other than the two flags are
/// carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRecord([u8; CONTROL_RECORD_LEN]);

impl ControlRecord {
    pub const fn new(bytes: [u8; CONTROL_RECORD_LEN]) -> Self {
        ControlRecord(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; CONTROL_RECORD_LEN] {
        &self.0
    }

    pub fn display_flag(&self) -> u8 {
        self.0[DISPLAY_FLAG_OFFSET]
    }

    pub fn terminate_flag(&self) -> u8 {
        self.0[TERMINATE_FLAG_OFFSET]
    }

    /// `'0'` becomes `'1'`; anything else becomes `'0'`.
    pub fn toggle_display(&mut self) {
        let flag = &mut self.0[DISPLAY_FLAG_OFFSET];
        *flag = if *flag == b'0' { b'1' } else { b'0' };
    }

    pub fn request_termination(&mut self) {
        self.0[TERMINATE_FLAG_OFFSET] = b'1';
    }
}

impl fmt::Display for ControlRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

/// Handle on the control file. The file is opened for each operation and
/// closed before it returns; no descriptor outlives a call.
#[derive(Debug, Clone)]
pub struct ControlChannel {
    path: PathBuf,
}

impl ControlChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_record(&self) -> io::Result<ControlRecord> {
        let mut file = File::open(&self.path)?;
        Self::read_from(&mut file)
    }

    /// Flips the display flag and returns the record that was written.
    pub fn toggle_display(&self) -> io::Result<ControlRecord> {
        self.modify(ControlRecord::toggle_display)
    }

    /// Raises the terminate flag and returns the record that was written.
    pub fn request_termination(&self) -> io::Result<ControlRecord> {
        self.modify(ControlRecord::request_termination)
    }

    fn modify(&self, change: impl FnOnce(&mut ControlRecord)) -> io::Result<ControlRecord> {
        let mut file = OpenOptions::new().read(true).write(true).open(&self.path)?;
        let mut record = Self::read_from(&mut file)?;
        change(&mut record);
        // one positioned write so the whole record lands at once
        let written = file.write_at(record.as_bytes(), 0)?;
        if written != CONTROL_RECORD_LEN {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short control write: {} of {} bytes", written, CONTROL_RECORD_LEN),
            ));
        }
        log::debug!("control record now {}", record);
        Ok(record)
    }

    fn read_from(file: &mut File) -> io::Result<ControlRecord> {
        let mut bytes = [0u8; CONTROL_RECORD_LEN];
        file.read_exact(&mut bytes)?;
        Ok(ControlRecord(bytes))
    }
}

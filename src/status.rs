#![cfg(feature = "std")]
//! Readiness probe for the board engine.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Why the engine is not usable.
#[derive(Debug)]
pub enum StatusError {
    /// The probe file does not exist.
    NotLoaded,
    /// The probe reported something other than the ready token.
    NotReady(String),
    /// The probe exists but could not be read.
    Io(io::Error),
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusError::NotLoaded => write!(f, "engine status : not loaded"),
            StatusError::NotReady(state) => write!(f, "engine status : {}", state),
            StatusError::Io(e) => write!(f, "engine status : unreadable ({})", e),
        }
    }
}

impl std::error::Error for StatusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StatusError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Reads the first line of `path` and checks that, trimmed, it equals
/// `token`.
pub fn probe_status(path: &Path, token: &str) -> Result<(), StatusError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StatusError::NotLoaded),
        Err(e) => return Err(StatusError::Io(e)),
    };
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .map_err(StatusError::Io)?;
    let state = line.trim();
    if state == token {
        log::debug!("engine status {}", state);
        Ok(())
    } else {
        Err(StatusError::NotReady(state.to_string()))
    }
}

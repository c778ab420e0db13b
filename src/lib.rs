#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;
#[cfg(feature = "std")]
pub mod client;
pub mod config;
#[cfg(feature = "std")]
pub mod control;
pub mod draw;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod sampler;
#[cfg(feature = "std")]
pub mod status;
#[cfg(feature = "std")]
pub mod terminal;

pub use config::*;
pub use draw::aliases::{Packed4x4, PackedByte};
pub use draw::{decode_bits, decode_symbol, encode, DrawError, PackedCells, Symbol};

#[cfg(feature = "std")]
pub use client::{run, ClientState, EventLoop, ExitReason, KeyAction, Keymap};
#[cfg(feature = "std")]
pub use control::{ControlChannel, ControlRecord};
#[cfg(feature = "std")]
pub use logging::{init_logging, LOG_ENV};
#[cfg(feature = "std")]
pub use sampler::LatencySampler;
#[cfg(feature = "std")]
pub use status::{probe_status, StatusError};
#[cfg(feature = "std")]
pub use terminal::{RawMode, TerminalOutput};

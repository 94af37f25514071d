//! Fault taxonomy for the alarm node
//!
//! - [`HardwareFault`]: GPIO setup, read or write failure. Fatal at startup,
//!   fatal at runtime when an output cannot be confirmed idle.
//! - [`MediaFault`]: audio clip could not be played. Never fatal.
//! - [`TransportFault`]: controller session could not be opened or broke.
//!   Never fatal; only the session ends.
//! - [`ConfigError`]: startup configuration rejected before any pin is touched.
//!
//! Unknown command tokens are not an error and have no variant here.

use crate::hardware::{GpioPin, Level};
use alarm_shared::{codec::CodecError, Alarm};
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// GPIO failures
#[derive(Error, Debug)]
pub enum HardwareFault {
    #[error("GPIO setup failed for pin {pin}: {source}")]
    Setup {
        pin: GpioPin,
        #[source]
        source: io::Error,
    },

    #[error("Write of {level} to pin {pin} failed: {source}")]
    Write {
        pin: GpioPin,
        level: Level,
        #[source]
        source: io::Error,
    },

    #[error("Read from pin {pin} failed: {source}")]
    Read {
        pin: GpioPin,
        #[source]
        source: io::Error,
    },

    #[error("Unexpected value {value:?} read from pin {pin}")]
    InvalidValue { pin: GpioPin, value: String },

    #[error("Pin {0} is not configured")]
    UnknownPin(GpioPin),

    #[error("No actuator channel bound to {0}")]
    Unbound(Alarm),

    #[error("{channel} output on pin {pin} not confirmed idle: {detail}")]
    IdleNotConfirmed {
        channel: Alarm,
        pin: GpioPin,
        detail: String,
    },
}

impl HardwareFault {
    /// A fatal fault means an output may be stuck at its active level
    pub fn is_fatal(&self) -> bool {
        matches!(self, HardwareFault::IdleNotConfirmed { .. })
    }
}

/// Audio playback failures
#[derive(Error, Debug)]
pub enum MediaFault {
    #[error("Audio clip not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to start audio player for {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Playback of {} failed: player exited with {status}", .path.display())]
    Playback { path: PathBuf, status: ExitStatus },

    #[error("Audio queue full, dropped {0} alert")]
    QueueFull(Alarm),

    #[error("Audio worker stopped, dropped {0} alert")]
    WorkerStopped(Alarm),
}

/// Controller session failures
#[derive(Error, Debug)]
pub enum TransportFault {
    #[error("Connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    #[error("Read error: {0}")]
    Read(#[source] io::Error),

    #[error("Write error: {0}")]
    Write(#[source] io::Error),

    #[error("Encode error: {0}")]
    Codec(#[from] CodecError),
}

/// Configuration rejected at startup
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Pin {pin} bound to both {first} and {second}")]
    PinConflict {
        pin: GpioPin,
        first: &'static str,
        second: &'static str,
    },
}

/// Any fault the node can surface
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Hardware fault: {0}")]
    Hardware(#[from] HardwareFault),

    #[error("Media fault: {0}")]
    Media(#[from] MediaFault),

    #[error("Transport fault: {0}")]
    Transport(#[from] TransportFault),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

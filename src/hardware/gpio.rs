//! GPIO capability trait shared by all pin backends

use crate::error::HardwareFault;
use std::fmt;
use std::ops::Not;

/// A GPIO line number (BCM numbering on a Raspberry Pi)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpioPin(pub u32);

impl fmt::Display for GpioPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// Electrical level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Low,
    High,
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "Low"),
            Level::High => write!(f, "High"),
        }
    }
}

/// How a pin is set up at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// Output driven to `initial` as soon as it is configured
    Output { initial: Level },
    Input,
}

/// Startup configuration for one pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinSetup {
    pub pin: GpioPin,
    pub mode: PinMode,
}

/// Pin-level read/write capability
///
/// Calls are short and synchronous; timing is owned by the callers.
pub trait GpioController: Send + Sync {
    /// Sample the current level of a pin
    fn read(&self, pin: GpioPin) -> Result<Level, HardwareFault>;

    /// Drive an output pin to `level`
    fn write(&self, pin: GpioPin, level: Level) -> Result<(), HardwareFault>;
}

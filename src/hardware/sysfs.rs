//! Linux sysfs GPIO backend (`/sys/class/gpio`)

use super::gpio::{GpioController, GpioPin, Level, PinMode, PinSetup};
use crate::error::HardwareFault;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default sysfs mount point for GPIO lines
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/class/gpio";

/// GPIO controller backed by the sysfs character files
#[derive(Debug)]
pub struct SysfsGpio {
    root: PathBuf,
    pins: HashMap<GpioPin, PinMode>,
}

impl SysfsGpio {
    /// Export and configure every pin in `setup`
    ///
    /// Outputs are configured with direction `high`/`low`, which sets the
    /// direction and the initial level in one write so no output glitches
    /// to its active level during startup.
    pub fn open(root: impl Into<PathBuf>, setup: &[PinSetup]) -> Result<Self, HardwareFault> {
        let root = root.into();
        let mut pins = HashMap::with_capacity(setup.len());

        for entry in setup {
            let dir = pin_dir(&root, entry.pin);
            if !dir.exists() {
                debug!("[GPIO] Exporting {}", entry.pin);
                fs::write(root.join("export"), entry.pin.0.to_string()).map_err(|source| {
                    HardwareFault::Setup {
                        pin: entry.pin,
                        source,
                    }
                })?;
            }

            let direction = match entry.mode {
                PinMode::Output {
                    initial: Level::High,
                } => "high",
                PinMode::Output {
                    initial: Level::Low,
                } => "low",
                PinMode::Input => "in",
            };
            fs::write(dir.join("direction"), direction).map_err(|source| {
                HardwareFault::Setup {
                    pin: entry.pin,
                    source,
                }
            })?;

            info!("[GPIO] {} configured as {}", entry.pin, direction);
            pins.insert(entry.pin, entry.mode);
        }

        Ok(Self { root, pins })
    }

    fn value_path(&self, pin: GpioPin) -> Result<PathBuf, HardwareFault> {
        if !self.pins.contains_key(&pin) {
            return Err(HardwareFault::UnknownPin(pin));
        }
        Ok(pin_dir(&self.root, pin).join("value"))
    }
}

fn pin_dir(root: &Path, pin: GpioPin) -> PathBuf {
    root.join(format!("gpio{}", pin.0))
}

impl GpioController for SysfsGpio {
    fn read(&self, pin: GpioPin) -> Result<Level, HardwareFault> {
        let raw = fs::read_to_string(self.value_path(pin)?)
            .map_err(|source| HardwareFault::Read { pin, source })?;

        match raw.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            other => Err(HardwareFault::InvalidValue {
                pin,
                value: other.to_string(),
            }),
        }
    }

    fn write(&self, pin: GpioPin, level: Level) -> Result<(), HardwareFault> {
        let value = match level {
            Level::Low => "0",
            Level::High => "1",
        };
        fs::write(self.value_path(pin)?, value)
            .map_err(|source| HardwareFault::Write { pin, level, source })
    }
}

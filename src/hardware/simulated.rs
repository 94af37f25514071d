//! In-memory GPIO backend for bench runs without hardware

use super::gpio::{GpioController, GpioPin, Level, PinMode, PinSetup};
use crate::error::HardwareFault;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

/// Simulated pins: outputs remember the last written level, inputs report a
/// fixed level
#[derive(Debug)]
pub struct SimulatedGpio {
    levels: Mutex<HashMap<GpioPin, Level>>,
}

impl SimulatedGpio {
    /// Configure pins; inputs start at `input_level`
    pub fn new(setup: &[PinSetup], input_level: Level) -> Self {
        let levels = setup
            .iter()
            .map(|entry| {
                let level = match entry.mode {
                    PinMode::Output { initial } => initial,
                    PinMode::Input => input_level,
                };
                (entry.pin, level)
            })
            .collect();

        info!("[GPIO] Simulated backend with {} pins", setup.len());
        Self {
            levels: Mutex::new(levels),
        }
    }
}

impl GpioController for SimulatedGpio {
    fn read(&self, pin: GpioPin) -> Result<Level, HardwareFault> {
        let levels = self.levels.lock().unwrap_or_else(|e| e.into_inner());
        levels.get(&pin).copied().ok_or(HardwareFault::UnknownPin(pin))
    }

    fn write(&self, pin: GpioPin, level: Level) -> Result<(), HardwareFault> {
        let mut levels = self.levels.lock().unwrap_or_else(|e| e.into_inner());
        let slot = levels.get_mut(&pin).ok_or(HardwareFault::UnknownPin(pin))?;
        *slot = level;
        info!("[GPIO] (simulated) {} -> {}", pin, level);
        Ok(())
    }
}

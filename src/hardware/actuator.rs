//! Actuator pulse protocol
//!
//! A pulse drives a channel to its active level, holds it for the channel's
//! pulse duration, restores the idle level and confirms it by reading the pin
//! back. Each channel has its own lock, held for the whole pulse, so two
//! triggers on the same channel are serialized and never interleave.

use super::gpio::GpioController;
use super::registry::{ActuatorChannel, ChannelRegistry};
use crate::error::HardwareFault;
use alarm_shared::Alarm;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

struct ChannelSlot {
    channel: ActuatorChannel,
    lock: Mutex<()>,
}

/// Pulses actuator outputs through the GPIO capability
pub struct ActuatorController {
    gpio: Arc<dyn GpioController>,
    channels: HashMap<Alarm, ChannelSlot>,
}

impl ActuatorController {
    /// Create a controller for every actuator in the registry
    pub fn new(gpio: Arc<dyn GpioController>, registry: &ChannelRegistry) -> Self {
        let channels = registry
            .actuators()
            .map(|channel| {
                (
                    channel.alarm,
                    ChannelSlot {
                        channel: *channel,
                        lock: Mutex::new(()),
                    },
                )
            })
            .collect();

        Self { gpio, channels }
    }

    /// Pulse the channel bound to `alarm`
    ///
    /// Returns only after the idle level has been restored and read back.
    /// A fault for which [`HardwareFault::is_fatal`] holds means the output
    /// may still be active.
    pub async fn pulse(&self, alarm: Alarm) -> Result<(), HardwareFault> {
        let slot = self
            .channels
            .get(&alarm)
            .ok_or(HardwareFault::Unbound(alarm))?;
        let _guard = slot.lock.lock().await;
        let channel = &slot.channel;

        debug!(
            "[ACTUATOR] {} on {} -> {} for {:?}",
            alarm,
            channel.pin,
            channel.active(),
            channel.pulse
        );

        if let Err(fault) = self.gpio.write(channel.pin, channel.active()) {
            error!("[ACTUATOR] Failed to activate {}: {}", alarm, fault);
            // One restore attempt; an unconfirmed idle level supersedes the
            // activation fault
            self.restore_idle(channel)?;
            return Err(fault);
        }

        tokio::time::sleep(channel.pulse).await;

        self.restore_idle(channel)?;
        info!("[ACTUATOR] {} pulsed on {}", alarm, channel.pin);
        Ok(())
    }

    /// Drive every channel to its idle level, one attempt each
    ///
    /// Waits for any pulse in progress on a channel before touching it.
    /// Returns the last fault seen, after attempting all channels.
    pub async fn release_all(&self) -> Result<(), HardwareFault> {
        let mut result = Ok(());

        for slot in self.channels.values() {
            let _guard = slot.lock.lock().await;
            if let Err(fault) = self.restore_idle(&slot.channel) {
                error!("[ACTUATOR] Release failed: {}", fault);
                result = Err(fault);
            }
        }

        result
    }

    fn restore_idle(&self, channel: &ActuatorChannel) -> Result<(), HardwareFault> {
        let not_confirmed = |detail: String| HardwareFault::IdleNotConfirmed {
            channel: channel.alarm,
            pin: channel.pin,
            detail,
        };

        self.gpio
            .write(channel.pin, channel.idle)
            .map_err(|fault| not_confirmed(fault.to_string()))?;

        match self.gpio.read(channel.pin) {
            Ok(level) if level == channel.idle => Ok(()),
            Ok(level) => Err(not_confirmed(format!("read back {}", level))),
            Err(fault) => Err(not_confirmed(fault.to_string())),
        }
    }
}

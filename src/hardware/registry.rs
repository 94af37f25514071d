//! Immutable channel bindings built once at startup

use super::gpio::{GpioPin, Level, PinMode, PinSetup};
use alarm_shared::Alarm;
use std::collections::BTreeMap;
use std::time::Duration;

/// An actuator output bound to an alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorChannel {
    pub alarm: Alarm,
    pub pin: GpioPin,
    /// Safe/inactive level the output rests at
    pub idle: Level,
    pub pulse: Duration,
}

impl ActuatorChannel {
    /// Level the output is driven to during a pulse
    pub fn active(&self) -> Level {
        !self.idle
    }
}

/// The smoke sensor input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorChannel {
    pub pin: GpioPin,
    /// Level the sensor reports while smoke is present
    pub smoke_level: Level,
}

/// Logical-to-physical channel map
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    actuators: BTreeMap<Alarm, ActuatorChannel>,
    smoke_sensor: SensorChannel,
}

impl ChannelRegistry {
    pub fn new(actuators: impl IntoIterator<Item = ActuatorChannel>, smoke_sensor: SensorChannel) -> Self {
        Self {
            actuators: actuators.into_iter().map(|ch| (ch.alarm, ch)).collect(),
            smoke_sensor,
        }
    }

    pub fn actuator(&self, alarm: Alarm) -> Option<&ActuatorChannel> {
        self.actuators.get(&alarm)
    }

    pub fn actuators(&self) -> impl Iterator<Item = &ActuatorChannel> {
        self.actuators.values()
    }

    pub fn smoke_sensor(&self) -> SensorChannel {
        self.smoke_sensor
    }

    /// Pin configuration for backend startup: outputs start idle
    pub fn pin_setup(&self) -> Vec<PinSetup> {
        let mut setup: Vec<PinSetup> = self
            .actuators
            .values()
            .map(|ch| PinSetup {
                pin: ch.pin,
                mode: PinMode::Output { initial: ch.idle },
            })
            .collect();
        setup.push(PinSetup {
            pin: self.smoke_sensor.pin,
            mode: PinMode::Input,
        });
        setup
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ChannelRegistry {
        ChannelRegistry::new(
            [
                ActuatorChannel {
                    alarm: Alarm::Fire,
                    pin: GpioPin(22),
                    idle: Level::High,
                    pulse: Duration::from_millis(250),
                },
                ActuatorChannel {
                    alarm: Alarm::Environmental,
                    pin: GpioPin(24),
                    idle: Level::High,
                    pulse: Duration::from_millis(250),
                },
            ],
            SensorChannel {
                pin: GpioPin(13),
                smoke_level: Level::Low,
            },
        )
    }

    #[test]
    fn test_active_level_is_inverse_of_idle() {
        let registry = registry();
        let fire = registry.actuator(Alarm::Fire).unwrap();
        assert_eq!(fire.active(), Level::Low);
        assert!(registry.actuator(Alarm::Shooter).is_none());
    }

    #[test]
    fn test_pin_setup_starts_outputs_idle() {
        let setup = registry().pin_setup();
        assert_eq!(setup.len(), 3);
        assert!(setup.contains(&PinSetup {
            pin: GpioPin(24),
            mode: PinMode::Output {
                initial: Level::High
            },
        }));
        assert!(setup.contains(&PinSetup {
            pin: GpioPin(13),
            mode: PinMode::Input,
        }));
    }
}

//! Node configuration
//!
//! Command-line flags (with `ALARM_NODE_*` environment fallbacks) are parsed
//! into an immutable [`NodeConfig`], which builds the channel registry and
//! clip table once at startup.

use crate::audio::{ClipTable, DEFAULT_PLAYER_PROGRAM, DEFAULT_QUEUE_CAPACITY};
use crate::error::ConfigError;
use crate::hardware::{
    ActuatorChannel, ChannelRegistry, GpioPin, Level, SensorChannel, DEFAULT_SYSFS_ROOT,
};
use alarm_shared::{defaults, timing, Alarm};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// GPIO backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GpioBackend {
    /// Linux sysfs GPIO (requires hardware)
    #[default]
    Sysfs,
    /// In-memory pins (for development)
    Simulated,
}

/// Electrical level as a CLI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    Low,
    High,
}

impl From<LevelArg> for Level {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Low => Level::Low,
            LevelArg::High => Level::High,
        }
    }
}

/// Alarm actuator node
#[derive(Debug, Parser)]
#[command(name = "alarm-node", version, about)]
pub struct Cli {
    /// Controller address to dial
    #[arg(long, env = "ALARM_NODE_CONTROLLER", default_value = defaults::CONTROLLER_ADDR)]
    pub controller: String,

    /// Identity line announced to the controller
    #[arg(long, env = "ALARM_NODE_IDENTITY", default_value = defaults::NODE_IDENTITY)]
    pub identity: String,

    /// Connect timeout in milliseconds
    #[arg(long, env = "ALARM_NODE_CONNECT_TIMEOUT_MS", default_value_t = timing::CONNECT_TIMEOUT_MS)]
    pub connect_timeout_ms: u64,

    /// Redial with exponential backoff after an established session ends
    #[arg(long, env = "ALARM_NODE_RECONNECT")]
    pub reconnect: bool,

    /// GPIO backend
    #[arg(long, env = "ALARM_NODE_GPIO", value_enum, default_value_t = GpioBackend::Sysfs)]
    pub gpio: GpioBackend,

    /// sysfs GPIO root
    #[arg(long, env = "ALARM_NODE_SYSFS_ROOT", default_value = DEFAULT_SYSFS_ROOT)]
    pub sysfs_root: PathBuf,

    #[arg(long, env = "ALARM_NODE_FIRE_PIN", default_value_t = defaults::FIRE_PIN)]
    pub fire_pin: u32,

    #[arg(long, env = "ALARM_NODE_SHOOTER_PIN", default_value_t = defaults::SHOOTER_PIN)]
    pub shooter_pin: u32,

    #[arg(long, env = "ALARM_NODE_ENVIRONMENTAL_PIN", default_value_t = defaults::ENVIRONMENTAL_PIN)]
    pub environmental_pin: u32,

    #[arg(long, env = "ALARM_NODE_SMOKE_PIN", default_value_t = defaults::SMOKE_SENSOR_PIN)]
    pub smoke_pin: u32,

    /// Level the smoke sensor reports while smoke is present
    #[arg(long, env = "ALARM_NODE_SMOKE_LEVEL", value_enum, default_value_t = LevelArg::Low)]
    pub smoke_level: LevelArg,

    #[arg(long, env = "ALARM_NODE_FIRE_CLIP", default_value = defaults::FIRE_CLIP)]
    pub fire_clip: PathBuf,

    #[arg(long, env = "ALARM_NODE_SHOOTER_CLIP", default_value = defaults::SHOOTER_CLIP)]
    pub shooter_clip: PathBuf,

    #[arg(long, env = "ALARM_NODE_ENVIRONMENTAL_CLIP", default_value = defaults::ENVIRONMENTAL_CLIP)]
    pub environmental_clip: PathBuf,

    /// Program used to decode and play clips
    #[arg(long, env = "ALARM_NODE_PLAYER", default_value = DEFAULT_PLAYER_PROGRAM)]
    pub player: PathBuf,

    /// Arguments passed to the player before the clip path
    #[arg(
        long = "player-arg",
        env = "ALARM_NODE_PLAYER_ARGS",
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_value = "-q"
    )]
    pub player_args: Vec<String>,

    /// Alerts that may wait behind the one playing
    #[arg(long, env = "ALARM_NODE_AUDIO_QUEUE", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub audio_queue: usize,

    /// Actuator pulse duration in milliseconds
    #[arg(long, env = "ALARM_NODE_PULSE_MS", default_value_t = timing::PULSE_DURATION_MS)]
    pub pulse_ms: u64,

    /// Minimum spacing between smoke-triggered alarms in milliseconds
    #[arg(long, env = "ALARM_NODE_SMOKE_COOLDOWN_MS", default_value_t = timing::SMOKE_COOLDOWN_MS)]
    pub smoke_cooldown_ms: u64,

    /// Smoke sensor poll interval in milliseconds
    #[arg(long, env = "ALARM_NODE_SMOKE_POLL_MS", default_value_t = timing::SMOKE_POLL_INTERVAL_MS)]
    pub smoke_poll_ms: u64,
}

/// Pin bindings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    pub fire: GpioPin,
    pub shooter: GpioPin,
    pub environmental: GpioPin,
    pub smoke_sensor: GpioPin,
    pub smoke_level: Level,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            fire: GpioPin(defaults::FIRE_PIN),
            shooter: GpioPin(defaults::SHOOTER_PIN),
            environmental: GpioPin(defaults::ENVIRONMENTAL_PIN),
            smoke_sensor: GpioPin(defaults::SMOKE_SENSOR_PIN),
            smoke_level: Level::Low,
        }
    }
}

/// Audio configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioConfig {
    pub fire_clip: PathBuf,
    pub shooter_clip: PathBuf,
    pub environmental_clip: PathBuf,
    pub player: PathBuf,
    pub player_args: Vec<String>,
    pub queue_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fire_clip: defaults::FIRE_CLIP.into(),
            shooter_clip: defaults::SHOOTER_CLIP.into(),
            environmental_clip: defaults::ENVIRONMENTAL_CLIP.into(),
            player: DEFAULT_PLAYER_PROGRAM.into(),
            player_args: vec!["-q".into()],
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Complete node configuration, read-only after startup
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub controller_addr: String,
    pub identity: String,
    pub connect_timeout: Duration,
    pub reconnect: bool,
    /// Initial redial delay (doubles up to `max_reconnect_delay`)
    pub reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
    pub gpio: GpioBackend,
    pub sysfs_root: PathBuf,
    pub pins: PinConfig,
    pub audio: AudioConfig,
    pub pulse: Duration,
    pub smoke_cooldown: Duration,
    pub smoke_poll_interval: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            controller_addr: defaults::CONTROLLER_ADDR.into(),
            identity: defaults::NODE_IDENTITY.into(),
            connect_timeout: Duration::from_millis(timing::CONNECT_TIMEOUT_MS),
            reconnect: false,
            reconnect_delay: Duration::from_millis(timing::RECONNECT_DELAY_MS),
            max_reconnect_delay: Duration::from_millis(timing::MAX_RECONNECT_DELAY_MS),
            gpio: GpioBackend::Sysfs,
            sysfs_root: DEFAULT_SYSFS_ROOT.into(),
            pins: PinConfig::default(),
            audio: AudioConfig::default(),
            pulse: Duration::from_millis(timing::PULSE_DURATION_MS),
            smoke_cooldown: Duration::from_millis(timing::SMOKE_COOLDOWN_MS),
            smoke_poll_interval: Duration::from_millis(timing::SMOKE_POLL_INTERVAL_MS),
        }
    }
}

impl TryFrom<Cli> for NodeConfig {
    type Error = ConfigError;

    fn try_from(cli: Cli) -> Result<Self, ConfigError> {
        let config = Self {
            controller_addr: cli.controller,
            identity: cli.identity,
            connect_timeout: Duration::from_millis(cli.connect_timeout_ms),
            reconnect: cli.reconnect,
            gpio: cli.gpio,
            sysfs_root: cli.sysfs_root,
            pins: PinConfig {
                fire: GpioPin(cli.fire_pin),
                shooter: GpioPin(cli.shooter_pin),
                environmental: GpioPin(cli.environmental_pin),
                smoke_sensor: GpioPin(cli.smoke_pin),
                smoke_level: cli.smoke_level.into(),
            },
            audio: AudioConfig {
                fire_clip: cli.fire_clip,
                shooter_clip: cli.shooter_clip,
                environmental_clip: cli.environmental_clip,
                player: cli.player,
                player_args: cli.player_args,
                queue_capacity: cli.audio_queue,
            },
            pulse: Duration::from_millis(cli.pulse_ms),
            smoke_cooldown: Duration::from_millis(cli.smoke_cooldown_ms),
            smoke_poll_interval: Duration::from_millis(cli.smoke_poll_ms),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }
}

impl NodeConfig {
    /// Reject a pin bound to more than one channel. Channel locks are per
    /// alarm, so aliased outputs could interleave writes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bindings = [
            ("fire", self.pins.fire),
            ("shooter", self.pins.shooter),
            ("environmental", self.pins.environmental),
            ("smoke sensor", self.pins.smoke_sensor),
        ];

        for (i, (first, pin)) in bindings.iter().enumerate() {
            if let Some((second, _)) = bindings[i + 1..].iter().find(|(_, other)| other == pin) {
                return Err(ConfigError::PinConflict {
                    pin: *pin,
                    first: *first,
                    second: *second,
                });
            }
        }
        Ok(())
    }

    /// Build the logical-to-physical channel map. Outputs idle High and are
    /// active Low.
    pub fn registry(&self) -> ChannelRegistry {
        let actuator = |alarm, pin| ActuatorChannel {
            alarm,
            pin,
            idle: Level::High,
            pulse: self.pulse,
        };

        ChannelRegistry::new(
            [
                actuator(Alarm::Fire, self.pins.fire),
                actuator(Alarm::Shooter, self.pins.shooter),
                actuator(Alarm::Environmental, self.pins.environmental),
            ],
            SensorChannel {
                pin: self.pins.smoke_sensor,
                smoke_level: self.pins.smoke_level,
            },
        )
    }

    /// Build the alarm-to-clip table
    pub fn clips(&self) -> ClipTable {
        ClipTable::new([
            (Alarm::Fire, self.audio.fire_clip.clone()),
            (Alarm::Shooter, self.audio.shooter_clip.clone()),
            (Alarm::Environmental, self.audio.environmental_clip.clone()),
        ])
    }
}

//! Alarm Node Shared Protocol Types
//!
//! This crate provides the command protocol and line codec for communication
//! between alarm nodes and the controller.

pub mod codec;
pub mod protocol;

pub use protocol::{tokens, Alarm, Command};

/// Timing parameters for actuators and the smoke watchdog
pub mod timing {
    /// How long an actuator output is held at its active level
    pub const PULSE_DURATION_MS: u64 = 250;

    /// Minimum spacing between smoke-triggered fire alarms
    pub const SMOKE_COOLDOWN_MS: u64 = 5000;

    /// How often the smoke sensor is sampled while idle
    pub const SMOKE_POLL_INTERVAL_MS: u64 = 100;

    /// Dial timeout for the controller connection
    pub const CONNECT_TIMEOUT_MS: u64 = 5000;

    /// Initial delay before redialing a lost controller session
    pub const RECONNECT_DELAY_MS: u64 = 1000;

    /// Upper bound for the reconnect backoff
    pub const MAX_RECONNECT_DELAY_MS: u64 = 30000;

    /// How long the controller waits for a new node's identity line
    pub const IDENTITY_TIMEOUT_MS: u64 = 5000;
}

/// Deployment defaults
pub mod defaults {
    /// Controller address the node dials
    pub const CONTROLLER_ADDR: &str = "192.168.2.50:65432";

    /// Address the controller listens on
    pub const CONTROLLER_BIND_ADDR: &str = "0.0.0.0:65432";

    /// Identity line announced by the node
    pub const NODE_IDENTITY: &str = "client2";

    pub const FIRE_PIN: u32 = 22;
    pub const SHOOTER_PIN: u32 = 23;
    pub const ENVIRONMENTAL_PIN: u32 = 24;
    pub const SMOKE_SENSOR_PIN: u32 = 13;

    pub const FIRE_CLIP: &str = "./audio/fire.mp3";
    pub const SHOOTER_CLIP: &str = "./audio/shooter.mp3";
    pub const ENVIRONMENTAL_CLIP: &str = "./audio/env.mp3";
}

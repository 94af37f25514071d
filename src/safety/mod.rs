//! Safety Module
//!
//! Watches the smoke sensor and raises fire alarms on its own, independent
//! of the controller session.

mod watchdog;

pub use watchdog::{SmokeWatchdog, WatchdogHandle};

//! Hardware Module
//!
//! GPIO capability, its backends, the channel registry and the actuator
//! pulse protocol.

mod actuator;
mod gpio;
mod registry;
mod simulated;
mod sysfs;

pub use actuator::ActuatorController;
pub use gpio::{GpioController, GpioPin, Level, PinMode, PinSetup};
pub use registry::{ActuatorChannel, ChannelRegistry, SensorChannel};
pub use simulated::SimulatedGpio;
pub use sysfs::{SysfsGpio, DEFAULT_SYSFS_ROOT};

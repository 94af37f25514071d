//! Command dispatch for the alarm node
//!
//! This module handles:
//! - Decoding controller lines into commands
//! - Mapping each command to its actuator channel and audio clip
//! - Containing actuator and audio faults so they never end the session
//! - Escalating faults that may leave an output stuck active

mod dispatcher;

pub use dispatcher::{CommandDispatcher, DispatchOutcome, TriggerSource};

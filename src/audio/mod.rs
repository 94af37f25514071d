//! Audio Module
//!
//! Audio alert playback behind the `AudioPlayer` capability.

mod alert;
mod player;

pub use alert::{AudioAlertPlayer, AudioClip, ClipTable, DEFAULT_QUEUE_CAPACITY};
pub use player::{AudioPlayer, ProcessAudioPlayer, DEFAULT_PLAYER_PROGRAM};

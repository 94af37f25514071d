//! Test doubles for the GPIO and audio capabilities

use crate::audio::{AudioAlertPlayer, AudioPlayer, ClipTable, DEFAULT_QUEUE_CAPACITY};
use crate::command::CommandDispatcher;
use crate::error::{HardwareFault, MediaFault};
use crate::hardware::{
    ActuatorChannel, ActuatorController, ChannelRegistry, GpioController, GpioPin, Level,
    SensorChannel,
};
use alarm_shared::Alarm;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const FIRE_PIN: GpioPin = GpioPin(22);
pub const SHOOTER_PIN: GpioPin = GpioPin(23);
pub const ENV_PIN: GpioPin = GpioPin(24);
pub const SMOKE_PIN: GpioPin = GpioPin(13);
pub const PULSE: Duration = Duration::from_millis(250);

/// Registry matching the default wiring
pub fn test_registry() -> ChannelRegistry {
    ChannelRegistry::new(
        [
            (Alarm::Fire, FIRE_PIN),
            (Alarm::Shooter, SHOOTER_PIN),
            (Alarm::Environmental, ENV_PIN),
        ]
        .map(|(alarm, pin)| ActuatorChannel {
            alarm,
            pin,
            idle: Level::High,
            pulse: PULSE,
        }),
        SensorChannel {
            pin: SMOKE_PIN,
            smoke_level: Level::Low,
        },
    )
}

/// Clip path used for an alarm in tests
pub fn clip_path(alarm: Alarm) -> PathBuf {
    PathBuf::from(format!("./audio/{}.mp3", alarm))
}

/// Dispatcher over the mocks with every alarm bound to its clip. Escalated
/// faults are discarded; the audio worker handle is returned so callers can
/// wait for queued alerts.
pub fn test_dispatcher(
    gpio: &Arc<MockGpio>,
    player: &Arc<MockAudioPlayer>,
) -> (Arc<CommandDispatcher>, JoinHandle<()>) {
    let actuators = Arc::new(ActuatorController::new(gpio.clone(), &test_registry()));
    let (alerts, worker) = AudioAlertPlayer::spawn(player.clone(), DEFAULT_QUEUE_CAPACITY);
    let clips = ClipTable::new(Alarm::ALL.map(|alarm| (alarm, clip_path(alarm))));
    let (fatal_tx, _) = tokio::sync::mpsc::unbounded_channel();

    let dispatcher = CommandDispatcher::new(actuators, alerts, clips, fatal_tx);
    (Arc::new(dispatcher), worker)
}

/// A successful write as seen by the mock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinWrite {
    pub pin: GpioPin,
    pub level: Level,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct MockGpioState {
    levels: HashMap<GpioPin, Level>,
    writes: Vec<PinWrite>,
    reads: HashMap<GpioPin, usize>,
    failing_writes: HashSet<(GpioPin, Level)>,
    failing_reads: HashSet<GpioPin>,
    stuck: HashMap<GpioPin, Level>,
}

/// Recording GPIO controller
#[derive(Debug, Default)]
pub struct MockGpio {
    state: Mutex<MockGpioState>,
}

impl MockGpio {
    /// All default pins present, outputs idle High, sensor clear (High)
    pub fn new() -> Self {
        let gpio = Self::default();
        for pin in [FIRE_PIN, SHOOTER_PIN, ENV_PIN, SMOKE_PIN] {
            gpio.set_level(pin, Level::High);
        }
        gpio
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockGpioState> {
        self.state.lock().unwrap()
    }

    /// Set the level a pin reports (for inputs, or to seed outputs)
    pub fn set_level(&self, pin: GpioPin, level: Level) {
        self.state().levels.insert(pin, level);
    }

    pub fn level(&self, pin: GpioPin) -> Option<Level> {
        self.state().levels.get(&pin).copied()
    }

    /// Every write of `level` to `pin` fails from now on
    pub fn fail_writes(&self, pin: GpioPin, level: Level) {
        self.state().failing_writes.insert((pin, level));
    }

    pub fn fail_reads(&self, pin: GpioPin) {
        self.state().failing_reads.insert(pin);
    }

    /// Writes succeed but reads of `pin` keep reporting `level`
    pub fn stick_at(&self, pin: GpioPin, level: Level) {
        self.state().stuck.insert(pin, level);
    }

    pub fn writes(&self) -> Vec<PinWrite> {
        self.state().writes.clone()
    }

    pub fn writes_to(&self, pin: GpioPin) -> Vec<PinWrite> {
        self.writes().into_iter().filter(|w| w.pin == pin).collect()
    }

    pub fn read_count(&self, pin: GpioPin) -> usize {
        self.state().reads.get(&pin).copied().unwrap_or(0)
    }
}

impl GpioController for MockGpio {
    fn read(&self, pin: GpioPin) -> Result<Level, HardwareFault> {
        let mut state = self.state();
        *state.reads.entry(pin).or_default() += 1;

        if state.failing_reads.contains(&pin) {
            return Err(HardwareFault::Read {
                pin,
                source: io::Error::new(io::ErrorKind::Other, "mock read failure"),
            });
        }
        if let Some(level) = state.stuck.get(&pin) {
            return Ok(*level);
        }
        state
            .levels
            .get(&pin)
            .copied()
            .ok_or(HardwareFault::UnknownPin(pin))
    }

    fn write(&self, pin: GpioPin, level: Level) -> Result<(), HardwareFault> {
        let mut state = self.state();

        if state.failing_writes.contains(&(pin, level)) {
            return Err(HardwareFault::Write {
                pin,
                level,
                source: io::Error::new(io::ErrorKind::Other, "mock write failure"),
            });
        }
        if !state.levels.contains_key(&pin) {
            return Err(HardwareFault::UnknownPin(pin));
        }

        state.levels.insert(pin, level);
        state.writes.push(PinWrite {
            pin,
            level,
            at: Instant::now(),
        });
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MockAudioState {
    attempts: Vec<(PathBuf, Instant)>,
    failing: bool,
    delay: Duration,
}

/// Recording audio player
#[derive(Debug, Default)]
pub struct MockAudioPlayer {
    state: Mutex<MockAudioState>,
}

impl MockAudioPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every playback fails with a missing-file fault
    pub fn failing() -> Self {
        let player = Self::default();
        player.state.lock().unwrap().failing = true;
        player
    }

    /// Every playback takes `delay` to complete
    pub fn slow(delay: Duration) -> Self {
        let player = Self::default();
        player.state.lock().unwrap().delay = delay;
        player
    }

    pub fn attempts(&self) -> Vec<PathBuf> {
        self.state
            .lock()
            .unwrap()
            .attempts
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.state
            .lock()
            .unwrap()
            .attempts
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }
}

#[async_trait]
impl AudioPlayer for MockAudioPlayer {
    async fn play(&self, clip: &Path) -> Result<(), MediaFault> {
        let (failing, delay) = {
            let mut state = self.state.lock().unwrap();
            state.attempts.push((clip.to_path_buf(), Instant::now()));
            (state.failing, state.delay)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if failing {
            return Err(MediaFault::NotFound(clip.to_path_buf()));
        }
        Ok(())
    }
}

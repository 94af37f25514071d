//! Smoke Watchdog
//!
//! Runs a background task that samples the smoke sensor and triggers the
//! fire alarm through the same dispatch path the controller uses. While the
//! sensor stays asserted, at most one trigger fires per cooldown window; the
//! window starts when the trigger fires.

use crate::command::{CommandDispatcher, TriggerSource};
use crate::hardware::{GpioController, SensorChannel};
use alarm_shared::Command;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{error, info, warn};

/// Polls the smoke sensor and raises fire alarms
pub struct SmokeWatchdog {
    gpio: Arc<dyn GpioController>,
    sensor: SensorChannel,
    dispatcher: Arc<CommandDispatcher>,
    poll_interval: Duration,
    cooldown: Duration,
}

impl SmokeWatchdog {
    /// Create a new smoke watchdog
    pub fn new(
        gpio: Arc<dyn GpioController>,
        sensor: SensorChannel,
        dispatcher: Arc<CommandDispatcher>,
        poll_interval: Duration,
        cooldown: Duration,
    ) -> Self {
        Self {
            gpio,
            sensor,
            dispatcher,
            poll_interval,
            cooldown,
        }
    }

    /// Start the watchdog background task
    /// Returns a handle that can be used to stop it
    pub fn start(self) -> WatchdogHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(shutdown_rx));

        WatchdogHandle { shutdown_tx, task }
    }

    /// Poll until `shutdown` flips to true (or its sender is dropped)
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "[WATCHDOG] Listening for smoke on {} (poll {:?}, cooldown {:?})",
            self.sensor.pin, self.poll_interval, self.cooldown
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let next_poll = match self.gpio.read(self.sensor.pin) {
                Ok(level) if level == self.sensor.smoke_level => {
                    let triggered_at = Instant::now();
                    warn!("[WATCHDOG] SMOKE DETECTED");
                    self.dispatcher
                        .dispatch(&Command::Fire, TriggerSource::SmokeSensor)
                        .await;
                    triggered_at + self.cooldown
                }
                Ok(_) => Instant::now() + self.poll_interval,
                Err(fault) => {
                    error!("[WATCHDOG] Node degraded, sensor read failed: {}", fault);
                    Instant::now() + self.poll_interval
                }
            };

            tokio::select! {
                _ = sleep_until(next_poll) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("[WATCHDOG] Monitoring stopped");
    }
}

/// Handle to stop the smoke watchdog
pub struct WatchdogHandle {
    shutdown_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl WatchdogHandle {
    /// Signal the watchdog to stop and wait for it. A trigger in progress
    /// completes first.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!("[WATCHDOG] Task ended abnormally: {}", e);
        }
    }
}

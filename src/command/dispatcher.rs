//! Command dispatcher - maps commands to actuator pulses and audio alerts

use crate::audio::{AudioAlertPlayer, ClipTable};
use crate::error::HardwareFault;
use crate::hardware::ActuatorController;
use alarm_shared::{Alarm, Command};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Where a trigger came from (log context only)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Controller,
    SmokeSensor,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerSource::Controller => write!(f, "controller"),
            TriggerSource::SmokeSensor => write!(f, "smoke sensor"),
        }
    }
}

/// Result of dispatching one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Controller handshake, session is live
    Acknowledged,
    /// Channel pulsed and alert queued
    Triggered { alarm: Alarm },
    /// All-clear marker, nothing to do
    AllClear,
    /// Unknown token, ignored
    Ignored { raw: String },
    /// Pulse failed; `fatal` faults were escalated
    Faulted { alarm: Alarm, fatal: bool },
}

/// Dispatches decoded commands to the actuators and the audio worker
///
/// Stateless between calls: the outcome depends only on the command.
pub struct CommandDispatcher {
    actuators: Arc<ActuatorController>,
    alerts: AudioAlertPlayer,
    clips: ClipTable,
    /// Faults that may have left an output active
    fatal_tx: mpsc::UnboundedSender<HardwareFault>,
}

impl CommandDispatcher {
    /// Create a new command dispatcher
    pub fn new(
        actuators: Arc<ActuatorController>,
        alerts: AudioAlertPlayer,
        clips: ClipTable,
        fatal_tx: mpsc::UnboundedSender<HardwareFault>,
    ) -> Self {
        Self {
            actuators,
            alerts,
            clips,
            fatal_tx,
        }
    }

    /// Decode a line received from the controller and dispatch it
    pub async fn handle_line(&self, line: &str) -> DispatchOutcome {
        self.dispatch(&Command::parse(line), TriggerSource::Controller)
            .await
    }

    /// Dispatch a command
    ///
    /// Shared trigger entry point for the controller session and the smoke
    /// watchdog. Never fails: faults are logged, and fatal ones escalated.
    pub async fn dispatch(&self, command: &Command, source: TriggerSource) -> DispatchOutcome {
        match command {
            Command::Handshake => {
                info!("[DISPATCH] Message from server: {}", command);
                DispatchOutcome::Acknowledged
            }
            Command::Fire => self.trigger(Alarm::Fire, source).await,
            Command::Shooter => self.trigger(Alarm::Shooter, source).await,
            Command::Environmental => self.trigger(Alarm::Environmental, source).await,
            Command::Safety => {
                info!("[DISPATCH] All clear from {}", source);
                DispatchOutcome::AllClear
            }
            Command::Unknown(raw) => {
                debug!("[DISPATCH] Ignoring unknown token {:?}", raw);
                DispatchOutcome::Ignored { raw: raw.clone() }
            }
        }
    }

    async fn trigger(&self, alarm: Alarm, source: TriggerSource) -> DispatchOutcome {
        warn!("[DISPATCH] {} alarm from {}", alarm.to_string().to_uppercase(), source);

        let outcome = match self.actuators.pulse(alarm).await {
            Ok(()) => DispatchOutcome::Triggered { alarm },
            Err(fault) => self.report_fault(alarm, fault),
        };

        // The alert is still wanted when the pulse failed
        match self.clips.clip(alarm) {
            Some(clip) => {
                if let Err(fault) = self.alerts.play(clip) {
                    warn!("[DISPATCH] {}", fault);
                }
            }
            None => debug!("[DISPATCH] No audio clip bound to {}", alarm),
        }

        outcome
    }

    fn report_fault(&self, alarm: Alarm, fault: HardwareFault) -> DispatchOutcome {
        let fatal = fault.is_fatal();

        if fatal {
            error!("[DISPATCH] {} output may be stuck active: {}", alarm, fault);
            if let Err(unsent) = self.fatal_tx.send(fault) {
                error!(
                    "[DISPATCH] Supervisor gone, fatal fault not delivered: {}",
                    unsent.0
                );
            }
        } else {
            error!("[DISPATCH] Node degraded, {} pulse failed: {}", alarm, fault);
        }

        DispatchOutcome::Faulted { alarm, fatal }
    }
}

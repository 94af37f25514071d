mod audio;
mod command;
mod config;
mod connection;
mod error;
mod hardware;
mod safety;
mod transport;

#[cfg(test)]
mod testing;

use alarm_shared::Alarm;
use audio::{AudioAlertPlayer, ProcessAudioPlayer};
use clap::Parser;
use command::CommandDispatcher;
use config::{Cli, GpioBackend, NodeConfig};
use connection::ConnectionClient;
use error::{HardwareFault, NodeError};
use hardware::{ActuatorController, ChannelRegistry, GpioController, SimulatedGpio, SysfsGpio};
use safety::SmokeWatchdog;
use std::sync::Arc;
use tokio::sync::mpsc;
use transport::{TcpConnector, TransportConnector};

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = NodeConfig::try_from(Cli::parse()).map_err(|e| {
        error!("Invalid configuration: {}", e);
        NodeError::from(e)
    })?;

    info!("Alarm node starting: {}", config.identity);
    info!("  Controller: {}", config.controller_addr);
    info!("  GPIO backend: {:?}", config.gpio);

    // Pin setup failure is fatal before the session is opened
    let registry = config.registry();
    for alarm in Alarm::ALL {
        match registry.actuator(alarm) {
            Some(channel) => info!("  {} -> {} (idle {})", alarm, channel.pin, channel.idle),
            None => warn!("  {} has no output", alarm),
        }
    }
    let gpio = open_gpio(&config, &registry).map_err(|fault| {
        error!("GPIO initialization failed: {}", fault);
        NodeError::from(fault)
    })?;
    info!("Pins initialized");

    let actuators = Arc::new(ActuatorController::new(gpio.clone(), &registry));

    let player = Arc::new(ProcessAudioPlayer::new(
        config.audio.player.clone(),
        config.audio.player_args.clone(),
    ));
    let (alerts, audio_worker) = AudioAlertPlayer::spawn(player, config.audio.queue_capacity);

    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel();
    let dispatcher = Arc::new(CommandDispatcher::new(
        actuators.clone(),
        alerts,
        config.clips(),
        fatal_tx,
    ));

    let watchdog = SmokeWatchdog::new(
        gpio,
        registry.smoke_sensor(),
        dispatcher.clone(),
        config.smoke_poll_interval,
        config.smoke_cooldown,
    )
    .start();
    info!("Smoke watchdog started");

    let client = ConnectionClient::new(
        TcpConnector::new(config.controller_addr.clone()),
        config.identity.clone(),
        config.connect_timeout,
        dispatcher,
    );

    let result: anyhow::Result<()> = tokio::select! {
        () = run_sessions(&client, &config) => Ok(()),
        Some(fault) = fatal_rx.recv() => {
            error!("[MAIN] Disabling node: {}", fault);
            Err(NodeError::from(fault).into())
        }
        _ = tokio::signal::ctrl_c() => {
            info!("[MAIN] Shutdown requested");
            Ok(())
        }
    };

    // A session dropped mid-pulse may have left an output active
    watchdog.stop().await;
    if let Err(fault) = actuators.release_all().await {
        error!("[MAIN] Outputs not confirmed idle at shutdown: {}", fault);
    }
    audio_worker.abort();

    info!("Alarm node stopped");
    result
}

fn open_gpio(
    config: &NodeConfig,
    registry: &ChannelRegistry,
) -> Result<Arc<dyn GpioController>, HardwareFault> {
    let setup = registry.pin_setup();

    let gpio: Arc<dyn GpioController> = match config.gpio {
        GpioBackend::Sysfs => Arc::new(SysfsGpio::open(config.sysfs_root.clone(), &setup)?),
        GpioBackend::Simulated => {
            // Simulated sensor reports clear air
            Arc::new(SimulatedGpio::new(&setup, !registry.smoke_sensor().smoke_level))
        }
    };
    Ok(gpio)
}

/// Serve controller sessions for the lifetime of the node
///
/// A dial or read failure only ends the current session; the smoke watchdog
/// keeps running either way. With reconnect enabled the controller is
/// redialed with exponential backoff, otherwise the node stays up on local
/// detection alone. Never returns.
async fn run_sessions<C: TransportConnector>(client: &ConnectionClient<C>, config: &NodeConfig) {
    let mut reconnect_delay = config.reconnect_delay;

    loop {
        match client.connect().await {
            Ok(stream) => {
                reconnect_delay = config.reconnect_delay;
                match client.serve(stream).await {
                    Ok(summary) => warn!(
                        "[MAIN] Session ended after {} lines ({} alarms, {} ignored)",
                        summary.lines, summary.triggered, summary.ignored
                    ),
                    Err(fault) => error!("[MAIN] Session failed: {}", fault),
                }
            }
            Err(fault) => error!("[MAIN] {}", fault),
        }

        if !config.reconnect {
            warn!("[MAIN] No controller session; smoke watchdog remains active");
            return std::future::pending().await;
        }

        tokio::time::sleep(reconnect_delay).await;
        // Exponential backoff
        reconnect_delay = std::cmp::min(reconnect_delay * 2, config.max_reconnect_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_dispatcher, MockAudioPlayer, MockGpio};
    use crate::transport::TransportStream;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::io::{duplex, AsyncWriteExt, DuplexStream};
    use tokio::time::{timeout, Instant};

    impl TransportStream for DuplexStream {}

    /// Accepts or refuses dials in script order, refusing once the script
    /// runs out. Accepted sessions send a handshake and close.
    #[derive(Default)]
    struct Script {
        accept: Mutex<VecDeque<bool>>,
        attempts: Mutex<Vec<Instant>>,
        controllers: Mutex<Vec<DuplexStream>>,
    }

    impl Script {
        /// Seconds between consecutive dial attempts
        fn gaps(&self) -> Vec<u64> {
            let attempts = self.attempts.lock().unwrap();
            attempts.windows(2).map(|w| (w[1] - w[0]).as_secs()).collect()
        }

        fn attempt_count(&self) -> usize {
            self.attempts.lock().unwrap().len()
        }
    }

    struct ScriptedConnector(Arc<Script>);

    #[async_trait]
    impl TransportConnector for ScriptedConnector {
        type Stream = DuplexStream;

        async fn connect(&self) -> anyhow::Result<DuplexStream> {
            self.0.attempts.lock().unwrap().push(Instant::now());
            let accept = self.0.accept.lock().unwrap().pop_front().unwrap_or(false);
            if !accept {
                anyhow::bail!("connection refused");
            }

            let (node, mut controller) = duplex(1024);
            controller.write_all(b"serverhandshake\n").await?;
            controller.shutdown().await?;
            // Keep the controller end open so the identity write succeeds
            self.0.controllers.lock().unwrap().push(controller);
            Ok(node)
        }

        fn name(&self) -> &'static str {
            "Scripted"
        }

        fn address(&self) -> &str {
            "192.168.2.50:65432"
        }
    }

    fn scripted_client(accept: &[bool]) -> (ConnectionClient<ScriptedConnector>, Arc<Script>) {
        let script = Arc::new(Script::default());
        script.accept.lock().unwrap().extend(accept.iter().copied());

        let gpio = Arc::new(MockGpio::new());
        let player = Arc::new(MockAudioPlayer::new());
        let (dispatcher, _worker) = test_dispatcher(&gpio, &player);

        let client = ConnectionClient::new(
            ScriptedConnector(script.clone()),
            "client2",
            Duration::from_secs(5),
            dispatcher,
        );
        (client, script)
    }

    fn reconnecting() -> NodeConfig {
        NodeConfig {
            reconnect: true,
            ..NodeConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_end_keeps_node_running() {
        let (client, script) = scripted_client(&[true]);

        let outcome = timeout(
            Duration::from_secs(3600),
            run_sessions(&client, &NodeConfig::default()),
        )
        .await;

        assert!(outcome.is_err(), "session loop returned after session end");
        assert_eq!(script.attempt_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_dial_failure_keeps_node_running() {
        let (client, script) = scripted_client(&[]);

        let outcome = timeout(
            Duration::from_secs(3600),
            run_sessions(&client, &NodeConfig::default()),
        )
        .await;

        assert!(outcome.is_err(), "session loop returned after dial failure");
        assert_eq!(script.attempt_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_backoff_doubles_up_to_cap() {
        let (client, script) = scripted_client(&[true]);

        let _ = timeout(Duration::from_secs(200), run_sessions(&client, &reconnecting())).await;

        let gaps = script.gaps();
        assert_eq!(gaps[..8], [1u64, 2, 4, 8, 16, 30, 30, 30]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_resets_after_successful_reconnect() {
        let (client, script) = scripted_client(&[true, false, false, true]);

        let _ = timeout(Duration::from_secs(12), run_sessions(&client, &reconnecting())).await;

        assert_eq!(script.gaps()[..5], [1u64, 2, 4, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_after_initial_dial_failure() {
        let (client, script) = scripted_client(&[false, false, true]);

        let _ = timeout(Duration::from_secs(5), run_sessions(&client, &reconnecting())).await;

        // Two refusals, then a session that ends and is redialed after 1 s
        assert_eq!(script.gaps()[..3], [1u64, 2, 1]);
    }
}

//! Connection client: connect, identify, serve

use crate::command::{CommandDispatcher, DispatchOutcome};
use crate::error::TransportFault;
use crate::transport::TransportConnector;
use alarm_shared::codec::{self, LineDecoder};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Counters for one served session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Lines received from the controller
    pub lines: u64,
    /// Alarm commands dispatched (including faulted pulses)
    pub triggered: u64,
    /// Unknown tokens ignored
    pub ignored: u64,
}

impl SessionSummary {
    fn record(&mut self, outcome: &DispatchOutcome) {
        self.lines += 1;
        match outcome {
            DispatchOutcome::Triggered { .. } | DispatchOutcome::Faulted { .. } => {
                self.triggered += 1
            }
            DispatchOutcome::Ignored { .. } => self.ignored += 1,
            DispatchOutcome::Acknowledged | DispatchOutcome::AllClear => {}
        }
    }
}

/// Owns the controller session lifecycle
pub struct ConnectionClient<C: TransportConnector> {
    connector: C,
    identity: String,
    connect_timeout: Duration,
    dispatcher: Arc<CommandDispatcher>,
}

impl<C: TransportConnector> ConnectionClient<C> {
    /// Create a new connection client
    pub fn new(
        connector: C,
        identity: impl Into<String>,
        connect_timeout: Duration,
        dispatcher: Arc<CommandDispatcher>,
    ) -> Self {
        Self {
            connector,
            identity: identity.into(),
            connect_timeout,
            dispatcher,
        }
    }

    /// Dial the controller
    pub async fn connect(&self) -> Result<C::Stream, TransportFault> {
        let addr = self.connector.address();
        info!("[SESSION] Connecting to {} via {}", addr, self.connector.name());

        match timeout(self.connect_timeout, self.connector.connect()).await {
            Ok(Ok(stream)) => {
                info!("[SESSION] Connected to {}", addr);
                Ok(stream)
            }
            Ok(Err(source)) => Err(TransportFault::Connect {
                addr: addr.to_string(),
                source,
            }),
            Err(_) => Err(TransportFault::ConnectTimeout {
                addr: addr.to_string(),
                timeout: self.connect_timeout,
            }),
        }
    }

    /// Announce the identity and dispatch every received line until the
    /// controller closes the connection
    ///
    /// Unknown tokens and dispatch faults never end the loop; only a read or
    /// write error does.
    pub async fn serve<S>(&self, stream: S) -> Result<SessionSummary, TransportFault>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let (mut reader, mut writer) = tokio::io::split(stream);

        let hello = codec::encode_line(&self.identity)?;
        writer.write_all(&hello).await.map_err(TransportFault::Write)?;
        writer.flush().await.map_err(TransportFault::Write)?;
        info!("[SESSION] Announced identity {:?}", self.identity);

        let mut decoder = LineDecoder::new();
        let mut read_buf = vec![0u8; 4096];
        let mut summary = SessionSummary::default();

        loop {
            // Process all complete lines
            loop {
                match decoder.decode_next() {
                    Ok(Some(line)) => {
                        let outcome = self.dispatcher.handle_line(&line).await;
                        summary.record(&outcome);
                    }
                    Ok(None) => break,
                    Err(e) => warn!("[SESSION] Discarding input: {}", e),
                }
            }

            match reader.read(&mut read_buf).await {
                Ok(0) => {
                    if decoder.buffer_len() > 0 {
                        debug!(
                            "[SESSION] Dropping {} bytes of unterminated input",
                            decoder.buffer_len()
                        );
                    }
                    info!(
                        "[SESSION] Controller closed connection ({} lines, {} alarms)",
                        summary.lines, summary.triggered
                    );
                    if let Err(e) = writer.shutdown().await {
                        debug!("[SESSION] Shutdown after close failed: {}", e);
                    }
                    return Ok(summary);
                }
                Ok(n) => decoder.extend(&read_buf[..n]),
                Err(e) => return Err(TransportFault::Read(e)),
            }
        }
    }
}

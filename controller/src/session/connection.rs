//! Individual node session handling

use alarm_shared::codec::{self, LineDecoder};
use alarm_shared::{timing, tokens};
use anyhow::{bail, Result};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::warn;

type BoxReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Handle to send lines to a specific node
#[derive(Clone)]
pub struct SessionHandle {
    pub identity: String,
    pub addr: SocketAddr,
    pub connected_at: Instant,
    writer: Arc<Mutex<BoxWriter>>,
}

impl SessionHandle {
    /// Send one newline-terminated line to this node
    pub async fn send_line(&self, line: &str) -> Result<()> {
        let encoded = codec::encode_line(line)?;
        let mut writer = self.writer.lock().await;
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Active node session
pub struct NodeSession {
    handle: SessionHandle,
    reader: BoxReader,
    decoder: LineDecoder,
    read_buf: Vec<u8>,
}

impl NodeSession {
    /// Wait for the node's identity line, then answer with the handshake
    ///
    /// A node that stays silent for longer than the identity timeout is
    /// rejected.
    pub async fn accept<S>(stream: S, addr: SocketAddr) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let mut reader: BoxReader = Box::new(reader);
        let mut decoder = LineDecoder::new();
        let mut read_buf = vec![0u8; 4096];

        let identity_timeout = Duration::from_millis(timing::IDENTITY_TIMEOUT_MS);
        let first_line = tokio::time::timeout(
            identity_timeout,
            next_line(&mut reader, &mut decoder, &mut read_buf),
        )
        .await;

        let identity = match first_line {
            Ok(Ok(Some(line))) => line.trim().to_string(),
            Ok(Ok(None)) => bail!("{} closed before identifying", addr),
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => bail!("{} sent no identity within {:?}", addr, identity_timeout),
        };
        if identity.is_empty() {
            bail!("{} sent an empty identity", addr);
        }

        let handle = SessionHandle {
            identity,
            addr,
            connected_at: Instant::now(),
            writer: Arc::new(Mutex::new(Box::new(writer))),
        };
        handle.send_line(tokens::HANDSHAKE).await?;

        Ok(Self {
            handle,
            reader,
            decoder,
            read_buf,
        })
    }

    /// Get a cloneable handle for sending lines
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn identity(&self) -> &str {
        &self.handle.identity
    }

    /// Read the next line from the node
    /// Returns None once the connection is closed
    pub async fn recv(&mut self) -> Option<String> {
        match next_line(&mut self.reader, &mut self.decoder, &mut self.read_buf).await {
            Ok(line) => line,
            Err(e) => {
                warn!("Read error from {}: {}", self.handle.addr, e);
                None
            }
        }
    }
}

async fn next_line(
    reader: &mut BoxReader,
    decoder: &mut LineDecoder,
    read_buf: &mut [u8],
) -> io::Result<Option<String>> {
    loop {
        match decoder.decode_next() {
            Ok(Some(line)) => return Ok(Some(line)),
            Ok(None) => {}
            Err(e) => {
                warn!("Discarding input: {}", e);
                continue;
            }
        }

        let n = reader.read(read_buf).await?;
        if n == 0 {
            return Ok(None);
        }
        decoder.extend(&read_buf[..n]);
    }
}

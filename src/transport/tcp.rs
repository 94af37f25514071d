//! TCP transport implementation for the controller connection

use crate::transport::traits::{TransportConnector, TransportStream};
use anyhow::Result;
use async_trait::async_trait;
use tokio::net::TcpStream;

impl TransportStream for TcpStream {}

/// TCP connector for the controller address
pub struct TcpConnector {
    address: String,
}

impl TcpConnector {
    /// Create a new TCP connector
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl TransportConnector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self) -> Result<Self::Stream> {
        let stream = TcpStream::connect(&self.address).await?;
        // Tokens are tiny; send them as soon as they are written
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn name(&self) -> &'static str {
        "TCP"
    }

    fn address(&self) -> &str {
        &self.address
    }
}

//! Session manager for tracking all connected nodes

use super::connection::SessionHandle;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::RwLock;
use tracing::info;

/// Manages all active node sessions
#[derive(Default)]
pub struct SessionManager {
    /// Map of identity -> session handle
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node session
    ///
    /// A node reconnecting under the same identity replaces its previous
    /// session, which is returned.
    pub async fn register(&self, handle: SessionHandle) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let previous = sessions.insert(handle.identity.clone(), handle);
        if let Some(previous) = &previous {
            info!(
                "Node {} reconnected, replacing session from {}",
                previous.identity, previous.addr
            );
        }
        previous
    }

    /// Unregister a node session
    ///
    /// Only removes the entry if it still belongs to the connection at
    /// `addr`, so a stale disconnect cannot drop a newer session.
    pub async fn unregister(&self, identity: &str, addr: SocketAddr) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get(identity) {
            Some(handle) if handle.addr == addr => {
                sessions.remove(identity);
                true
            }
            _ => false,
        }
    }

    /// Get a session handle for a specific node
    pub async fn get(&self, identity: &str) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(identity).cloned()
    }

    /// Send a token line to a specific node
    pub async fn send_to(&self, identity: &str, token: &str) -> anyhow::Result<()> {
        let handle = self
            .get(identity)
            .await
            .ok_or_else(|| anyhow::anyhow!("Node not connected: {}", identity))?;
        handle.send_line(token).await
    }

    /// Get the identities of all connected nodes, sorted
    pub async fn connected_nodes(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        let mut nodes: Vec<String> = sessions.keys().cloned().collect();
        nodes.sort();
        nodes
    }

    /// Get the number of connected nodes
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

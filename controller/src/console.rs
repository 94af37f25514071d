//! Operator console
//!
//! One command per stdin line:
//! - `list` prints connected nodes
//! - `<identity> <token>` sends the token line to that node, verbatim

use crate::session::SessionManager;
use alarm_shared::Command;
use tracing::{info, warn};

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    List,
    Send { identity: String, token: String },
}

impl ConsoleCommand {
    /// Parse an operator line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if line == "list" {
            return Ok(Some(ConsoleCommand::List));
        }

        match line.split_once(char::is_whitespace) {
            Some((identity, token)) if !token.trim().is_empty() => {
                Ok(Some(ConsoleCommand::Send {
                    identity: identity.to_string(),
                    token: token.trim().to_string(),
                }))
            }
            _ => Err(format!(
                "Expected `list` or `<identity> <token>`, got {:?}",
                line
            )),
        }
    }
}

/// Run one console command, returning the operator-facing reply
pub async fn execute(manager: &SessionManager, command: ConsoleCommand) -> String {
    match command {
        ConsoleCommand::List => {
            let nodes = manager.connected_nodes().await;
            if nodes.is_empty() {
                return "No nodes connected".to_string();
            }

            let mut out = format!("{} node(s) connected:", nodes.len());
            for identity in nodes {
                if let Some(handle) = manager.get(&identity).await {
                    out.push_str(&format!(
                        "\n  {} from {} ({}s)",
                        identity,
                        handle.addr,
                        handle.connected_at.elapsed().as_secs()
                    ));
                }
            }
            out
        }
        ConsoleCommand::Send { identity, token } => {
            if let Command::Unknown(_) = Command::parse(&token) {
                warn!("Sending unknown token {:?} to {}", token, identity);
            }

            match manager.send_to(&identity, &token).await {
                Ok(()) => {
                    info!("Sent {:?} to {}", token, identity);
                    format!("Sent {} to {}", token, identity)
                }
                Err(e) => format!("Send failed: {}", e),
            }
        }
    }
}

mod console;
mod session;

use alarm_shared::defaults;
use clap::Parser;
use console::ConsoleCommand;
use session::{NodeSession, SessionManager};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Controller for alarm nodes: accepts node sessions and relays operator
/// commands typed on stdin
#[derive(Debug, Parser)]
#[command(name = "alarm-controller", version)]
struct Cli {
    /// Address to listen on for node connections
    #[arg(long, env = "ALARM_CONTROLLER_BIND", default_value = defaults::CONTROLLER_BIND_ADDR)]
    bind: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let manager = Arc::new(SessionManager::new());

    let listener = TcpListener::bind(&cli.bind).await?;
    info!("Controller listening on {}", cli.bind);

    tokio::spawn(run_console(manager.clone()));

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (socket, addr) = accepted?;
                info!("Connection from: {}", addr);
                tokio::spawn(handle_connection(manager.clone(), socket, addr));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down with {} node(s) connected", manager.count().await);
                return Ok(());
            }
        }
    }
}

async fn handle_connection(manager: Arc<SessionManager>, socket: TcpStream, addr: SocketAddr) {
    let mut session = match NodeSession::accept(socket, addr).await {
        Ok(session) => session,
        Err(e) => {
            warn!("Handshake with {} failed: {}", addr, e);
            return;
        }
    };

    let identity = session.identity().to_string();
    manager.register(session.handle()).await;
    info!("Node {} registered from {}", identity, addr);

    // Nodes do not send anything after their identity
    while let Some(line) = session.recv().await {
        info!("[{}] {}", identity, line);
    }

    if manager.unregister(&identity, addr).await {
        info!("Node {} disconnected", identity);
    }
}

async fn run_console(manager: Arc<SessionManager>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Console closed");
                return;
            }
            Err(e) => {
                warn!("Console read error: {}", e);
                return;
            }
        };

        match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => println!("{}", console::execute(&manager, command).await),
            Ok(None) => {}
            Err(e) => println!("{}", e),
        }
    }
}

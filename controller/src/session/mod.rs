//! Session management for connected alarm nodes
//!
//! This module handles:
//! - Reading each node's identity line and answering the handshake
//! - Tracking live sessions by identity
//! - Routing operator tokens to a specific node

mod connection;
mod manager;

pub use connection::{NodeSession, SessionHandle};
pub use manager::SessionManager;

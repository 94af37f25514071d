//! Controller session handling
//!
//! This module handles:
//! - Dialing the controller with a connect timeout
//! - Announcing the node identity
//! - Reading newline-delimited commands and feeding them to the dispatcher

mod client;

pub use client::{ConnectionClient, SessionSummary};

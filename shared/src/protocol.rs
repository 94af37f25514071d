//! Controller Protocol
//!
//! Maps the literal command tokens sent by the controller onto a closed set
//! of commands, and commands onto the alarm they raise.

use std::fmt;

/// Literal wire tokens (exact, case-sensitive)
pub mod tokens {
    /// Sent by the controller once it has registered the node
    pub const HANDSHAKE: &str = "serverhandshake";
    pub const FIRE: &str = "fire";
    pub const SHOOTER: &str = "shooter";
    /// Spelling is part of the wire protocol
    pub const ENVIRONMENTAL: &str = "enviormental";
    pub const SAFETY: &str = "safety";
}

/// Alarm kinds that drive a physical output and an audio alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Alarm {
    Fire,
    Shooter,
    Environmental,
}

impl Alarm {
    /// All alarm kinds, in channel order
    pub const ALL: [Alarm; 3] = [Alarm::Fire, Alarm::Shooter, Alarm::Environmental];

    /// The command that raises this alarm
    pub fn command(self) -> Command {
        match self {
            Alarm::Fire => Command::Fire,
            Alarm::Shooter => Command::Shooter,
            Alarm::Environmental => Command::Environmental,
        }
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alarm::Fire => write!(f, "fire"),
            Alarm::Shooter => write!(f, "shooter"),
            Alarm::Environmental => write!(f, "environmental"),
        }
    }
}

/// A decoded controller command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Controller acknowledged our identity
    Handshake,
    Fire,
    Shooter,
    Environmental,
    /// All clear, no side effect
    Safety,
    /// Anything that is not a known token (raw, trimmed)
    Unknown(String),
}

impl Command {
    /// Parse a received line. Surrounding whitespace is ignored, the match
    /// itself is exact and case-sensitive.
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            tokens::HANDSHAKE => Command::Handshake,
            tokens::FIRE => Command::Fire,
            tokens::SHOOTER => Command::Shooter,
            tokens::ENVIRONMENTAL => Command::Environmental,
            tokens::SAFETY => Command::Safety,
            other => Command::Unknown(other.to_string()),
        }
    }

    /// Wire token for this command
    pub fn token(&self) -> &str {
        match self {
            Command::Handshake => tokens::HANDSHAKE,
            Command::Fire => tokens::FIRE,
            Command::Shooter => tokens::SHOOTER,
            Command::Environmental => tokens::ENVIRONMENTAL,
            Command::Safety => tokens::SAFETY,
            Command::Unknown(raw) => raw,
        }
    }

    /// The alarm raised by this command, if any
    pub fn alarm(&self) -> Option<Alarm> {
        match self {
            Command::Fire => Some(Alarm::Fire),
            Command::Shooter => Some(Alarm::Shooter),
            Command::Environmental => Some(Alarm::Environmental),
            Command::Handshake | Command::Safety | Command::Unknown(_) => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Unknown(raw) => write!(f, "unknown({:?})", raw),
            other => f.write_str(other.token()),
        }
    }
}

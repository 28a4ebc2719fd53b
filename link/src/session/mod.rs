pub(crate) mod actor;
pub(crate) mod commands;
pub mod handle;
pub mod state;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::uci::Move;

pub use handle::SessionHandle;
pub use state::{EngineIdentity, EngineSession, Reaction, SearchRequest, SessionSnapshot};

/// Identifies one engine connection for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Where a session is in the handshake/search lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Connecting,
    Handshaking,
    Ready,
    Searching,
    Disconnected,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Connecting,
        Phase::Handshaking,
        Phase::Ready,
        Phase::Searching,
        Phase::Disconnected,
    ];

    /// The transition table. Staying in the same phase is not a transition.
    pub fn can_transition_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Connecting, Phase::Handshaking)
                | (Phase::Handshaking, Phase::Ready)
                | (Phase::Ready, Phase::Searching)
                | (Phase::Searching, Phase::Ready)
                | (
                    Phase::Connecting | Phase::Handshaking | Phase::Ready | Phase::Searching,
                    Phase::Disconnected
                )
        )
    }

    pub fn is_live(self) -> bool {
        self != Phase::Disconnected
    }

    pub fn is_handshake(self) -> bool {
        matches!(self, Phase::Connecting | Phase::Handshaking)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Connecting => "connecting",
            Phase::Handshaking => "handshaking",
            Phase::Ready => "ready",
            Phase::Searching => "searching",
            Phase::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// What to do with a command that arrives in the wrong phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhasePolicy {
    /// Reject outbound commands; close the session on inbound violations.
    #[default]
    Strict,
    /// Log, report, and carry on.
    Lenient,
}

impl FromStr for PhasePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(PhasePolicy::Strict),
            "lenient" => Ok(PhasePolicy::Lenient),
            other => Err(format!("unknown phase policy: {}", other)),
        }
    }
}

/// Result of a finished search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestMove {
    pub best: Move,
    pub ponder: Option<Move>,
}

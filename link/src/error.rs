use std::time::Duration;

use crate::session::{Phase, SessionId};
use crate::uci::MalformedCommand;

/// Errors surfaced by sessions, the dispatcher and the connection manager.
///
/// Every variant is scoped to one session; none of them affects other
/// sessions. Cloneable so one failure can be handed to every pending caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
    #[error(transparent)]
    MalformedCommand(#[from] MalformedCommand),
    #[error("protocol violation: expected {expected}, session is {actual}")]
    ProtocolViolation { expected: Phase, actual: Phase },
    #[error("engine did not finish the handshake within {0:?}")]
    HandshakeTimeout(Duration),
    #[error("Session not found: {0}")]
    UnknownSession(SessionId),
    #[error("session is not ready (phase: {phase})")]
    SessionNotReady { phase: Phase },
    #[error("session closed")]
    SessionClosed,
    #[error("search cancelled before the engine reported a move")]
    SearchCancelled,
    #[error("cannot open more than {limit} sessions")]
    SessionLimit { limit: usize },
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("'{keyword}' is sent by engines, not controllers")]
    WrongDirection { keyword: String },
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::Transport(err.to_string())
    }
}

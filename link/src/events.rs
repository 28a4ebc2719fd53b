use serde::Serialize;
use std::time::Duration;

use crate::session::{Phase, SessionId};
use crate::uci::{Info, MalformedCommand, Move};

/// Events broadcast to every subscriber of an [`EngineLink`](crate::EngineLink).
///
/// This is the only way state flows out of the link: UI-side stores are
/// expected to update themselves from these, never by reaching into sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LinkEvent {
    /// Transport is up; the handshake starts.
    Connected {
        session_id: SessionId,
        endpoint: String,
    },
    /// Handshake finished (`uciok` and `readyok` both seen).
    SessionReady {
        session_id: SessionId,
        name: Option<String>,
        author: Option<String>,
    },
    BestMoveReceived {
        session_id: SessionId,
        best: Move,
        ponder: Option<Move>,
    },
    InfoUpdated {
        session_id: SessionId,
        info: Info,
    },
    NewGameAcknowledged {
        session_id: SessionId,
    },
    ProtocolViolation {
        session_id: SessionId,
        expected: Phase,
        actual: Phase,
        line: String,
    },
    MalformedLine {
        session_id: SessionId,
        error: MalformedCommand,
    },
    LineTooLong {
        session_id: SessionId,
        limit: usize,
    },
    /// Raw protocol log entry, only emitted when traffic events are enabled.
    Traffic {
        session_id: SessionId,
        direction: Direction,
        line: String,
    },
    SessionClosed {
        session_id: SessionId,
        reason: CloseReason,
    },
}

impl LinkEvent {
    pub fn session_id(&self) -> SessionId {
        match self {
            LinkEvent::Connected { session_id, .. }
            | LinkEvent::SessionReady { session_id, .. }
            | LinkEvent::BestMoveReceived { session_id, .. }
            | LinkEvent::InfoUpdated { session_id, .. }
            | LinkEvent::NewGameAcknowledged { session_id }
            | LinkEvent::ProtocolViolation { session_id, .. }
            | LinkEvent::MalformedLine { session_id, .. }
            | LinkEvent::LineTooLong { session_id, .. }
            | LinkEvent::Traffic { session_id, .. }
            | LinkEvent::SessionClosed { session_id, .. } => *session_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ToEngine,
    FromEngine,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CloseReason {
    /// `disconnect` or `quit` from the controller.
    Requested,
    /// The engine closed its end of the stream.
    EngineExited,
    HandshakeTimeout { after_ms: u64 },
    ProtocolViolation { expected: Phase, actual: Phase },
    ConnectFailed { error: String },
    TransportError { error: String },
}

impl CloseReason {
    pub fn handshake_timeout(after: Duration) -> Self {
        CloseReason::HandshakeTimeout {
            after_ms: after.as_millis() as u64,
        }
    }
}

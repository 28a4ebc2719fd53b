use serde::Serialize;

use super::{Phase, PhasePolicy, SessionId};
use crate::error::LinkError;
use crate::events::{CloseReason, LinkEvent};
use crate::uci::{Command, GoParams, Info, Origin, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandshakeStep {
    AwaitingUciOk,
    AwaitingReadyOk,
}

/// What the engine reported about itself via `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineIdentity {
    pub name: Option<String>,
    pub author: Option<String>,
}

/// The one search a session may have in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub params: GoParams,
    pub stop_requested: bool,
}

/// Read-only view of a session for callers outside its actor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub phase: Phase,
    pub identity: EngineIdentity,
    pub position: Option<Position>,
    pub search: Option<SearchRequest>,
    pub last_info: Option<Info>,
    pub awaiting_new_game: bool,
}

/// Outcome of feeding one inbound command to a session.
#[derive(Debug, Default, PartialEq)]
pub struct Reaction {
    /// Application-visible event, if any.
    pub event: Option<LinkEvent>,
    /// Line the session must write back to the engine (handshake).
    pub reply: Option<Command>,
    /// Set when the session has to be torn down.
    pub close: Option<CloseReason>,
}

impl Reaction {
    fn none() -> Self {
        Self::default()
    }

    fn event(event: LinkEvent) -> Self {
        Self {
            event: Some(event),
            ..Self::default()
        }
    }

    fn reply(cmd: Command) -> Self {
        Self {
            reply: Some(cmd),
            ..Self::default()
        }
    }
}

/// Protocol state of one engine session. Synchronous and I/O free: the
/// session actor feeds it commands and acts on what it returns.
#[derive(Debug)]
pub struct EngineSession {
    id: SessionId,
    policy: PhasePolicy,
    phase: Phase,
    handshake: HandshakeStep,
    identity: EngineIdentity,
    position: Option<Position>,
    search: Option<SearchRequest>,
    last_info: Option<Info>,
    awaiting_new_game: bool,
}

impl EngineSession {
    pub fn new(id: SessionId, policy: PhasePolicy) -> Self {
        Self {
            id,
            policy,
            phase: Phase::Connecting,
            handshake: HandshakeStep::AwaitingUciOk,
            identity: EngineIdentity::default(),
            position: None,
            search: None,
            last_info: None,
            awaiting_new_game: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn identity(&self) -> &EngineIdentity {
        &self.identity
    }

    pub fn search(&self) -> Option<&SearchRequest> {
        self.search.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            phase: self.phase,
            identity: self.identity.clone(),
            position: self.position.clone(),
            search: self.search.clone(),
            last_info: self.last_info.clone(),
            awaiting_new_game: self.awaiting_new_game,
        }
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal transition {} -> {}",
            self.phase,
            next
        );
        tracing::debug!("Phase {} -> {}", self.phase, next);
        self.phase = next;
    }

    /// Transport is up: start the handshake. Returns the `uci` line to send.
    pub fn on_transport_connected(&mut self) -> Result<Command, LinkError> {
        if self.phase != Phase::Connecting {
            return Err(LinkError::ProtocolViolation {
                expected: Phase::Connecting,
                actual: self.phase,
            });
        }
        self.advance(Phase::Handshaking);
        self.handshake = HandshakeStep::AwaitingUciOk;
        Ok(Command::Uci)
    }

    /// Transport is gone. Returns the search that was still running, if any.
    pub fn on_disconnected(&mut self) -> Option<SearchRequest> {
        if self.phase.is_live() {
            self.advance(Phase::Disconnected);
        }
        self.search.take()
    }

    /// Check whether `cmd` may be sent in the current phase.
    ///
    /// Never changes state. A command that does not fit on one wire line
    /// fails with [`LinkError::MalformedCommand`] under both policies.
    /// Commands that need `Ready` fail with [`LinkError::SessionNotReady`]
    /// while the handshake is running and with
    /// [`LinkError::ProtocolViolation`] otherwise; the lenient policy lets
    /// the latter through with a warning.
    pub fn check_outbound(&self, cmd: &Command) -> Result<(), LinkError> {
        if !self.phase.is_live() {
            return Err(LinkError::SessionClosed);
        }

        if cmd.origin() == Origin::Engine {
            return Err(LinkError::WrongDirection {
                keyword: cmd.keyword().to_string(),
            });
        }
        cmd.check_wire()?;

        let required = match cmd {
            Command::UciNewGame { .. }
            | Command::SetOption { .. }
            | Command::Position(_)
            | Command::Go(_) => Phase::Ready,
            Command::Stop => Phase::Searching,
            _ => return Ok(()),
        };

        if self.phase == required {
            return Ok(());
        }
        if self.phase.is_handshake() {
            return Err(LinkError::SessionNotReady { phase: self.phase });
        }
        match self.policy {
            PhasePolicy::Strict => Err(LinkError::ProtocolViolation {
                expected: required,
                actual: self.phase,
            }),
            PhasePolicy::Lenient => {
                tracing::warn!(
                    "Forwarding '{}' in phase {} (expected {})",
                    cmd.keyword(),
                    self.phase,
                    required
                );
                Ok(())
            }
        }
    }

    /// Record a command that was written to the engine.
    pub fn commit_outbound(&mut self, cmd: &Command) {
        match cmd {
            Command::Go(params) => {
                if self.phase == Phase::Ready {
                    self.advance(Phase::Searching);
                }
                self.search = Some(SearchRequest {
                    params: params.clone(),
                    stop_requested: false,
                });
                self.last_info = None;
            }
            Command::Stop => {
                if let Some(search) = self.search.as_mut() {
                    search.stop_requested = true;
                }
            }
            Command::Position(position) => {
                self.position = Some(position.clone());
            }
            Command::UciNewGame { .. } => {
                self.position = None;
                self.awaiting_new_game = true;
            }
            _ => {}
        }
    }

    /// Feed one command received from the engine.
    pub fn on_inbound(&mut self, cmd: Command) -> Reaction {
        if !self.phase.is_live() {
            return Reaction::none();
        }

        match cmd {
            Command::Id { field, value } => {
                match field.as_str() {
                    "name" => self.identity.name = Some(value),
                    "author" => self.identity.author = Some(value),
                    _ => tracing::debug!("Ignoring id field {}", field),
                }
                Reaction::none()
            }
            Command::UciOk => match (self.phase, self.handshake) {
                (Phase::Handshaking, HandshakeStep::AwaitingUciOk) => {
                    tracing::debug!("Received uciok");
                    self.handshake = HandshakeStep::AwaitingReadyOk;
                    Reaction::reply(Command::IsReady)
                }
                (Phase::Ready | Phase::Searching, _) => Reaction::none(),
                _ => {
                    tracing::warn!("Ignoring repeated uciok during handshake");
                    Reaction::none()
                }
            },
            Command::ReadyOk => match (self.phase, self.handshake) {
                (Phase::Handshaking, HandshakeStep::AwaitingReadyOk) => {
                    tracing::debug!("Received readyok, engine ready");
                    self.advance(Phase::Ready);
                    Reaction::event(LinkEvent::SessionReady {
                        session_id: self.id,
                        name: self.identity.name.clone(),
                        author: self.identity.author.clone(),
                    })
                }
                (Phase::Ready | Phase::Searching, _) => Reaction::none(),
                _ => {
                    tracing::warn!("Ignoring readyok received before uciok");
                    Reaction::none()
                }
            },
            Command::BestMove { best, ponder } => {
                if self.phase != Phase::Searching {
                    let line = Command::BestMove { best, ponder }.to_string();
                    return self.violation(Phase::Searching, line);
                }
                tracing::info!("Received bestmove: {}", best);
                self.advance(Phase::Ready);
                self.search = None;
                Reaction::event(LinkEvent::BestMoveReceived {
                    session_id: self.id,
                    best,
                    ponder,
                })
            }
            Command::Info(info) => {
                tracing::trace!("Received info: {:?}", info);
                self.last_info = Some(info.clone());
                Reaction::event(LinkEvent::InfoUpdated {
                    session_id: self.id,
                    info,
                })
            }
            Command::NewGameOk => {
                self.awaiting_new_game = false;
                Reaction::event(LinkEvent::NewGameAcknowledged {
                    session_id: self.id,
                })
            }
            Command::Unknown { raw } => {
                tracing::trace!("Ignoring UCI message: {}", raw);
                Reaction::none()
            }
            other => {
                tracing::warn!("Engine sent controller command '{}', ignoring", other);
                Reaction::none()
            }
        }
    }

    fn violation(&self, expected: Phase, line: String) -> Reaction {
        tracing::warn!(
            "Protocol violation: '{}' in phase {} (expected {})",
            line,
            self.phase,
            expected
        );
        let close = match self.policy {
            PhasePolicy::Strict => Some(CloseReason::ProtocolViolation {
                expected,
                actual: self.phase,
            }),
            PhasePolicy::Lenient => None,
        };
        Reaction {
            event: Some(LinkEvent::ProtocolViolation {
                session_id: self.id,
                expected,
                actual: self.phase,
                line,
            }),
            reply: None,
            close,
        }
    }
}

use std::future::pending;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::SinkExt;
use tokio::process::Child;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Sleep};
use tokio_util::codec::FramedWrite;
use tracing::Instrument;

use super::commands::{Reply, SessionCommand};
use super::state::EngineSession;
use super::{BestMove, Phase, SessionId};
use crate::config::LinkConfig;
use crate::connection::reader::{spawn_reader, Inbound};
use crate::connection::registry::Registry;
use crate::connection::transport::{BoxedWriter, Transport};
use crate::error::LinkError;
use crate::events::{CloseReason, Direction, LinkEvent};
use crate::uci::{parse_command, Command, LineCodec};

/// How long a child process gets to exit after `quit` before it is killed.
const CHILD_EXIT_GRACE: Duration = Duration::from_secs(1);

pub(crate) type Connector = BoxFuture<'static, io::Result<Transport>>;

/// Owns one engine session: its protocol state, its writer and its child
/// process. Everything that touches the session goes through this task.
pub(crate) struct SessionActor {
    session: EngineSession,
    config: LinkConfig,
    endpoint: String,
    event_tx: broadcast::Sender<LinkEvent>,
    registry: Registry,
    writer: Option<FramedWrite<BoxedWriter, LineCodec>>,
    inbound_rx: Option<mpsc::Receiver<Inbound>>,
    reader_task: Option<JoinHandle<()>>,
    child: Option<Child>,
    handshake_deadline: Option<Pin<Box<Sleep>>>,
    ready_waiters: Vec<Reply<()>>,
    move_waiters: Vec<Reply<BestMove>>,
    closed: bool,
}

/// The main session actor loop.
pub(crate) async fn run_session_actor(
    actor: SessionActor,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    connector: Connector,
) {
    let session_id = actor.session.id();
    actor
        .run(cmd_rx, connector)
        .instrument(tracing::info_span!("session", id = %session_id))
        .await;
}

async fn next_inbound(rx: &mut Option<mpsc::Receiver<Inbound>>) -> Option<Inbound> {
    match rx {
        Some(rx) => rx.recv().await,
        None => pending().await,
    }
}

async fn connection(connector: &mut Option<Connector>) -> io::Result<Transport> {
    match connector {
        Some(connector) => connector.await,
        None => pending().await,
    }
}

async fn deadline(deadline: &mut Option<Pin<Box<Sleep>>>) {
    match deadline {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}

impl SessionActor {
    pub(crate) fn new(
        session: EngineSession,
        config: LinkConfig,
        endpoint: String,
        event_tx: broadcast::Sender<LinkEvent>,
        registry: Registry,
    ) -> Self {
        Self {
            session,
            config,
            endpoint,
            event_tx,
            registry,
            writer: None,
            inbound_rx: None,
            reader_task: None,
            child: None,
            handshake_deadline: None,
            ready_waiters: Vec::new(),
            move_waiters: Vec::new(),
            closed: false,
        }
    }

    fn id(&self) -> SessionId {
        self.session.id()
    }

    async fn run(mut self, mut cmd_rx: mpsc::Receiver<SessionCommand>, connector: Connector) {
        tracing::info!("Session actor started for {}", self.endpoint);
        let mut connector = Some(connector);

        while !self.closed {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => self.close(CloseReason::Requested).await,
                },

                result = connection(&mut connector) => {
                    connector = None;
                    match result {
                        Ok(transport) => self.on_connected(transport).await,
                        Err(e) => {
                            tracing::error!("Failed to connect to {}: {}", self.endpoint, e);
                            self.close(CloseReason::ConnectFailed { error: e.to_string() }).await;
                        }
                    }
                }

                item = next_inbound(&mut self.inbound_rx) => self.on_inbound(item).await,

                _ = deadline(&mut self.handshake_deadline) => {
                    tracing::warn!(
                        "Engine did not finish the handshake within {:?}",
                        self.config.handshake_timeout
                    );
                    self.close(CloseReason::handshake_timeout(self.config.handshake_timeout)).await;
                }
            }
        }

        tracing::info!("Session actor exited");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Send { command, reply } => {
                let result = self.send(command).await;
                let _ = reply.send(result);
            }
            SessionCommand::Route { line, reply } => {
                let result = self.route_line(&line).await;
                let _ = reply.send(result);
            }
            SessionCommand::Search {
                params,
                reply,
                best_move,
            } => match self.send(Command::Go(params)).await {
                Ok(()) => {
                    self.move_waiters.push(best_move);
                    let _ = reply.send(Ok(()));
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            },
            SessionCommand::AwaitBestMove { reply } => {
                if self.session.search().is_some() {
                    self.move_waiters.push(reply);
                } else {
                    let _ = reply.send(Err(LinkError::ProtocolViolation {
                        expected: Phase::Searching,
                        actual: self.session.phase(),
                    }));
                }
            }
            SessionCommand::AwaitReady { reply } => match self.session.phase() {
                Phase::Ready | Phase::Searching => {
                    let _ = reply.send(Ok(()));
                }
                Phase::Connecting | Phase::Handshaking => self.ready_waiters.push(reply),
                Phase::Disconnected => {
                    let _ = reply.send(Err(LinkError::SessionClosed));
                }
            },
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(self.session.snapshot());
            }
            SessionCommand::Disconnect { reply } => {
                self.disconnect().await;
                let _ = reply.send(());
            }
        }
    }

    async fn on_connected(&mut self, transport: Transport) {
        let (reader, writer, child) = transport.into_parts();
        let max = self.config.max_line_length;
        let (inbound_tx, inbound_rx) = mpsc::channel(self.config.command_capacity);

        self.writer = Some(FramedWrite::new(writer, LineCodec::new(max)));
        self.child = child;
        self.reader_task = Some(spawn_reader(reader, max, inbound_tx));
        self.inbound_rx = Some(inbound_rx);

        tracing::info!("Connected to {}", self.endpoint);
        self.emit(LinkEvent::Connected {
            session_id: self.id(),
            endpoint: self.endpoint.clone(),
        });

        match self.session.on_transport_connected() {
            Ok(uci) => {
                self.handshake_deadline = Some(Box::pin(sleep(self.config.handshake_timeout)));
                if let Err(e) = self.write(&uci).await {
                    tracing::error!("Failed to start handshake: {}", e);
                }
            }
            Err(e) => {
                tracing::error!("Unexpected transport connect: {}", e);
                self.close(CloseReason::TransportError {
                    error: e.to_string(),
                })
                .await;
            }
        }
    }

    async fn on_inbound(&mut self, item: Option<Inbound>) {
        match item {
            Some(Inbound::Line(line)) => {
                if let Err(e) = self.route_line(&line).await {
                    tracing::debug!("Inbound line rejected: {}", e);
                }
            }
            Some(Inbound::TooLong { limit }) => {
                self.emit(LinkEvent::LineTooLong {
                    session_id: self.id(),
                    limit,
                });
            }
            Some(Inbound::Closed(None)) | None => {
                tracing::info!("Engine closed the connection");
                self.close(CloseReason::EngineExited).await;
            }
            Some(Inbound::Closed(Some(error))) => {
                self.close(CloseReason::TransportError { error }).await;
            }
        }
    }

    /// Parse one engine line and apply it. Blank lines are skipped.
    async fn route_line(&mut self, line: &str) -> Result<Option<LinkEvent>, LinkError> {
        if !self.session.phase().is_live() {
            return Err(LinkError::SessionClosed);
        }
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if self.config.traffic_events {
            self.emit(LinkEvent::Traffic {
                session_id: self.id(),
                direction: Direction::FromEngine,
                line: line.to_string(),
            });
        }

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!("Malformed engine line: {}", e);
                self.emit(LinkEvent::MalformedLine {
                    session_id: self.id(),
                    error: e.clone(),
                });
                return Err(e.into());
            }
        };

        let reaction = self.session.on_inbound(command);

        match &reaction.event {
            Some(LinkEvent::SessionReady { name, .. }) => {
                tracing::info!("Engine ready: {}", name.as_deref().unwrap_or("unnamed"));
                self.handshake_deadline = None;
                for waiter in self.ready_waiters.drain(..) {
                    let _ = waiter.send(Ok(()));
                }
            }
            Some(LinkEvent::BestMoveReceived { best, ponder, .. }) => {
                let result = BestMove {
                    best: best.clone(),
                    ponder: ponder.clone(),
                };
                for waiter in self.move_waiters.drain(..) {
                    let _ = waiter.send(Ok(result.clone()));
                }
            }
            _ => {}
        }

        if let Some(event) = &reaction.event {
            self.emit(event.clone());
        }
        // The event stands even if the reply cannot be written
        if let Some(reply) = &reaction.reply {
            self.write(reply).await?;
        }
        if let Some(reason) = reaction.close {
            self.close(reason).await;
        }
        Ok(reaction.event)
    }

    async fn send(&mut self, command: Command) -> Result<(), LinkError> {
        self.session.check_outbound(&command)?;
        self.write(&command).await?;
        self.session.commit_outbound(&command);
        if command == Command::Quit {
            self.close(CloseReason::Requested).await;
        }
        Ok(())
    }

    /// Serialize and write one line. A failed write closes the session.
    async fn write(&mut self, command: &Command) -> Result<(), LinkError> {
        if self.writer.is_none() {
            return Err(LinkError::SessionNotReady {
                phase: self.session.phase(),
            });
        }

        let line = command.to_string();
        tracing::trace!("UCI >> {}", line);
        if self.config.traffic_events {
            self.emit(LinkEvent::Traffic {
                session_id: self.id(),
                direction: Direction::ToEngine,
                line: line.clone(),
            });
        }

        let result = match self.writer.as_mut() {
            Some(writer) => writer.send(line).await,
            None => Ok(()),
        };
        if let Err(e) = result {
            tracing::error!("Failed to write to engine: {}", e);
            let error = e.to_string();
            self.close(CloseReason::TransportError {
                error: error.clone(),
            })
            .await;
            return Err(LinkError::Transport(error));
        }
        Ok(())
    }

    async fn disconnect(&mut self) {
        if self.writer.is_some() {
            tracing::info!("Sending quit command to engine");
            let _ = self.write(&Command::Quit).await;
        }
        self.close(CloseReason::Requested).await;
    }

    /// Tear the session down. Idempotent.
    async fn close(&mut self, reason: CloseReason) {
        if self.closed {
            return;
        }
        self.closed = true;

        let outstanding = self.session.on_disconnected();
        self.handshake_deadline = None;
        self.registry.remove(self.id()).await;

        let ready_error = match reason {
            CloseReason::HandshakeTimeout { .. } => {
                LinkError::HandshakeTimeout(self.config.handshake_timeout)
            }
            _ => LinkError::SessionClosed,
        };
        for waiter in self.ready_waiters.drain(..) {
            let _ = waiter.send(Err(ready_error.clone()));
        }

        let move_error = match outstanding {
            Some(search) if search.stop_requested => LinkError::SearchCancelled,
            _ => LinkError::SessionClosed,
        };
        for waiter in self.move_waiters.drain(..) {
            let _ = waiter.send(Err(move_error.clone()));
        }

        tracing::info!("Session closed: {:?}", reason);
        self.emit(LinkEvent::SessionClosed {
            session_id: self.id(),
            reason,
        });

        // Dropping the writer closes the engine's stdin / our socket half
        self.writer = None;
        self.inbound_rx = None;
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        if let Some(child) = self.child.take() {
            reap_child(child).await;
        }
    }

    fn emit(&self, event: LinkEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}

async fn reap_child(mut child: Child) {
    match tokio::time::timeout(CHILD_EXIT_GRACE, child.wait()).await {
        Ok(Ok(status)) => tracing::debug!("Engine process exited: {}", status),
        Ok(Err(e)) => tracing::warn!("Failed to wait for engine process: {}", e),
        Err(_) => {
            tracing::warn!("Engine process did not exit, killing it");
            if let Err(e) = child.kill().await {
                tracing::error!("Failed to kill engine process: {}", e);
            }
        }
    }
}

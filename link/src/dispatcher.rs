use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::connection::registry::Registry;
use crate::error::LinkError;
use crate::events::LinkEvent;
use crate::session::{BestMove, SessionId, SessionSnapshot};
use crate::uci::{Command, GoParams};

/// Routes commands to sessions by id and fans engine events out to
/// observers.
///
/// Holds no session state of its own: every call looks the session up in the
/// registry and is executed by that session's actor, which keeps per-session
/// ordering without any cross-session lock.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Registry,
    event_tx: broadcast::Sender<LinkEvent>,
}

impl Dispatcher {
    pub(crate) fn new(registry: Registry, event_tx: broadcast::Sender<LinkEvent>) -> Self {
        Self { registry, event_tx }
    }

    /// Serialize `command` and write it to the session's engine.
    pub async fn send(&self, id: SessionId, command: Command) -> Result<(), LinkError> {
        tracing::debug!("Dispatching '{}' to {}", command, id);
        self.registry.get(id).await?.send(command).await
    }

    /// Feed a raw engine line to the session, as its reader would.
    ///
    /// Returns the event the line produced, which is also broadcast.
    pub async fn route(&self, id: SessionId, line: &str) -> Result<Option<LinkEvent>, LinkError> {
        self.registry.get(id).await?.route(line).await
    }

    /// Send `go` and wait for the engine's `bestmove`.
    pub async fn search(&self, id: SessionId, params: GoParams) -> Result<BestMove, LinkError> {
        let handle = self.registry.get(id).await?;
        handle.search(params).await
    }

    pub async fn await_best_move(&self, id: SessionId) -> Result<BestMove, LinkError> {
        self.registry.get(id).await?.await_best_move().await
    }

    /// Ask the engine to stop searching. Pending searches still resolve with
    /// the engine's `bestmove`.
    pub async fn stop(&self, id: SessionId) -> Result<(), LinkError> {
        self.send(id, Command::Stop).await
    }

    pub async fn wait_ready(&self, id: SessionId) -> Result<(), LinkError> {
        self.registry.get(id).await?.wait_ready().await
    }

    pub async fn snapshot(&self, id: SessionId) -> Result<SessionSnapshot, LinkError> {
        self.registry.get(id).await?.snapshot().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.event_tx.subscribe()
    }

    /// All events as a stream. Events missed by a lagging consumer are
    /// logged and skipped.
    pub fn events(&self) -> impl Stream<Item = LinkEvent> + Send + 'static {
        BroadcastStream::new(self.subscribe()).filter_map(|item| match item {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                tracing::warn!("Event stream lagged, skipped {} events", n);
                None
            }
        })
    }
}

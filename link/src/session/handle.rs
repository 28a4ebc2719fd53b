use tokio::sync::{mpsc, oneshot};

use super::commands::SessionCommand;
use super::state::SessionSnapshot;
use super::{BestMove, SessionId};
use crate::error::LinkError;
use crate::events::LinkEvent;
use crate::uci::{Command, GoParams};

/// Cheap, cloneable handle to a session actor.
///
/// Every call is queued on the actor's single command channel, so commands
/// reach the engine in the order they were issued.
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(id: SessionId, cmd_tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { id, cmd_tx }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, LinkError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| LinkError::SessionClosed)?;
        rx.await.map_err(|_| LinkError::SessionClosed)
    }

    pub async fn send(&self, command: Command) -> Result<(), LinkError> {
        self.request(|reply| SessionCommand::Send { command, reply })
            .await?
    }

    pub async fn route(&self, line: impl Into<String>) -> Result<Option<LinkEvent>, LinkError> {
        let line = line.into();
        self.request(|reply| SessionCommand::Route { line, reply })
            .await?
    }

    /// Send `go` and wait for the engine's `bestmove`.
    pub async fn search(&self, params: GoParams) -> Result<BestMove, LinkError> {
        let (best_tx, best_rx) = oneshot::channel();
        self.request(|reply| SessionCommand::Search {
            params,
            reply,
            best_move: best_tx,
        })
        .await??;
        best_rx.await.map_err(|_| LinkError::SessionClosed)?
    }

    /// Wait for the `bestmove` of the search already running.
    pub async fn await_best_move(&self) -> Result<BestMove, LinkError> {
        self.request(|reply| SessionCommand::AwaitBestMove { reply })
            .await?
    }

    pub async fn stop(&self) -> Result<(), LinkError> {
        self.send(Command::Stop).await
    }

    /// Resolves once the handshake has finished.
    pub async fn wait_ready(&self) -> Result<(), LinkError> {
        self.request(|reply| SessionCommand::AwaitReady { reply })
            .await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, LinkError> {
        self.request(|reply| SessionCommand::Snapshot { reply })
            .await
    }

    /// Send `quit`, stop the engine and close the session.
    pub async fn disconnect(&self) -> Result<(), LinkError> {
        self.request(|reply| SessionCommand::Disconnect { reply })
            .await
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle").field("id", &self.id).finish()
    }
}

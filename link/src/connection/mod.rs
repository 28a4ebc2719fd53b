pub mod endpoint;
pub(crate) mod reader;
pub(crate) mod registry;
pub mod transport;

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};

use crate::config::LinkConfig;
use crate::error::LinkError;
use crate::events::LinkEvent;
use crate::session::actor::{run_session_actor, Connector, SessionActor};
use crate::session::{EngineSession, SessionHandle, SessionId};
pub use endpoint::Endpoint;
use registry::Registry;
pub use transport::Transport;

/// Opens and closes engine sessions. Spawns an actor task per session.
///
/// Owns nothing but the registry entries: each actor owns its transport and
/// child process, and removes itself from the registry when it closes.
#[derive(Clone)]
pub struct ConnectionManager {
    config: LinkConfig,
    registry: Registry,
    event_tx: broadcast::Sender<LinkEvent>,
}

impl ConnectionManager {
    pub(crate) fn new(
        config: LinkConfig,
        registry: Registry,
        event_tx: broadcast::Sender<LinkEvent>,
    ) -> Self {
        Self {
            config,
            registry,
            event_tx,
        }
    }

    /// Open a session to `endpoint`. Returns as soon as the session exists;
    /// connect and handshake progress arrive as events.
    pub async fn connect(&self, endpoint: Endpoint) -> Result<SessionId, LinkError> {
        let label = endpoint.to_string();
        let connector = async move { Transport::open(&endpoint).await }.boxed();
        self.spawn_session(label, connector).await
    }

    /// Start a session over an already open transport.
    pub async fn attach(&self, transport: Transport) -> Result<SessionId, LinkError> {
        let label = transport.label().to_string();
        self.spawn_session(label, futures::future::ready(Ok(transport)).boxed())
            .await
    }

    pub async fn disconnect(&self, id: SessionId) -> Result<(), LinkError> {
        let handle = self.registry.get(id).await?;
        tracing::info!("Disconnecting session {}", id);
        handle.disconnect().await
    }

    /// Ids of live sessions, sorted.
    pub async fn sessions(&self) -> Vec<SessionId> {
        self.registry.ids().await
    }

    async fn spawn_session(
        &self,
        endpoint: String,
        connector: Connector,
    ) -> Result<SessionId, LinkError> {
        let session_id = SessionId::new();
        let (cmd_tx, cmd_rx) = mpsc::channel(self.config.command_capacity);
        let handle = SessionHandle::new(session_id, cmd_tx);

        if let Err(e) = self
            .registry
            .insert(handle, self.config.max_sessions)
            .await
        {
            tracing::warn!("Refusing session for {}: {}", endpoint, e);
            return Err(e);
        }

        let actor = SessionActor::new(
            EngineSession::new(session_id, self.config.phase_policy),
            self.config.clone(),
            endpoint.clone(),
            self.event_tx.clone(),
            self.registry.clone(),
        );
        tokio::spawn(run_session_actor(actor, cmd_rx, connector));

        tracing::info!("Created session {} for {}", session_id, endpoint);
        Ok(session_id)
    }
}

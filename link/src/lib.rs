pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod history;
pub mod session;
pub mod uci;

pub use config::LinkConfig;
pub use connection::{ConnectionManager, Endpoint, Transport};
pub use dispatcher::Dispatcher;
pub use error::LinkError;
pub use events::{CloseReason, Direction, LinkEvent};
pub use history::{MoveHistory, Side};
pub use session::{
    BestMove, EngineIdentity, Phase, PhasePolicy, SessionHandle, SessionId, SessionSnapshot,
};
pub use uci::{Command, GoParams, Info, Move, Position, Score};

use tokio::sync::broadcast;
use tokio_stream::Stream;

use connection::registry::Registry;

/// Controller side of the engine protocol: one connection manager and one
/// dispatcher sharing a session registry and an event channel.
///
/// Cloning is cheap; clones drive the same sessions.
#[derive(Clone)]
pub struct EngineLink {
    manager: ConnectionManager,
    dispatcher: Dispatcher,
}

impl EngineLink {
    pub fn new(config: LinkConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let registry = Registry::new();
        Self {
            dispatcher: Dispatcher::new(registry.clone(), event_tx.clone()),
            manager: ConnectionManager::new(config, registry, event_tx),
        }
    }

    pub fn from_env() -> Self {
        Self::new(LinkConfig::from_env())
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn connect(&self, endpoint: Endpoint) -> Result<SessionId, LinkError> {
        self.manager.connect(endpoint).await
    }

    pub async fn attach(&self, transport: Transport) -> Result<SessionId, LinkError> {
        self.manager.attach(transport).await
    }

    pub async fn disconnect(&self, id: SessionId) -> Result<(), LinkError> {
        self.manager.disconnect(id).await
    }

    pub async fn sessions(&self) -> Vec<SessionId> {
        self.manager.sessions().await
    }

    pub async fn send(&self, id: SessionId, command: Command) -> Result<(), LinkError> {
        self.dispatcher.send(id, command).await
    }

    pub async fn wait_ready(&self, id: SessionId) -> Result<(), LinkError> {
        self.dispatcher.wait_ready(id).await
    }

    pub async fn search(&self, id: SessionId, params: GoParams) -> Result<BestMove, LinkError> {
        self.dispatcher.search(id, params).await
    }

    pub async fn stop(&self, id: SessionId) -> Result<(), LinkError> {
        self.dispatcher.stop(id).await
    }

    pub async fn snapshot(&self, id: SessionId) -> Result<SessionSnapshot, LinkError> {
        self.dispatcher.snapshot(id).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.dispatcher.subscribe()
    }

    pub fn events(&self) -> impl Stream<Item = LinkEvent> + Send + 'static {
        self.dispatcher.events()
    }
}

impl Default for EngineLink {
    fn default() -> Self {
        Self::new(LinkConfig::default())
    }
}

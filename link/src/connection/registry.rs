use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::LinkError;
use crate::session::{SessionHandle, SessionId};

/// Live sessions by id. Shared by the connection manager, the dispatcher and
/// each session actor (which removes itself on exit).
#[derive(Clone, Default)]
pub(crate) struct Registry {
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert unless `limit` sessions are already live.
    pub(crate) async fn insert(&self, handle: SessionHandle, limit: usize) -> Result<(), LinkError> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= limit {
            return Err(LinkError::SessionLimit { limit });
        }
        sessions.insert(handle.id(), handle);
        Ok(())
    }

    pub(crate) async fn get(&self, id: SessionId) -> Result<SessionHandle, LinkError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(LinkError::UnknownSession(id))
    }

    pub(crate) async fn remove(&self, id: SessionId) -> Option<SessionHandle> {
        self.sessions.write().await.remove(&id)
    }

    pub(crate) async fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.read().await.keys().copied().collect();
        ids.sort();
        ids
    }
}

//! Registry of attached observers.
//!
//! A session is anything that can accept serialized snapshot frames: in the server
//! binary, the sending half of a channel drained by one WebSocket task. Sessions have
//! no ordering or priority among themselves.

use std::{collections::HashMap, sync::Arc};

use thiserror::Error;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::protocol::Frame;

/// Session identifier (UUID assigned on registration)
pub type SessionId = String;

/// Errors that can occur while delivering to a session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The receiving side of the session went away.
    #[error("Session closed")]
    Closed,
}

/// Destination for snapshot frames.
///
/// `deliver` must not block: the hub calls it while holding the engine lock, so that
/// every session sees frames in mutation order.
pub trait SessionSink: Send + Sync {
    fn deliver(&self, frame: Frame) -> Result<(), SessionError>;
}

impl SessionSink for mpsc::UnboundedSender<Frame> {
    fn deliver(&self, frame: Frame) -> Result<(), SessionError> {
        self.send(frame).map_err(|_| SessionError::Closed)
    }
}

/// In-memory set of attached sessions.
///
/// Sessions are ephemeral and lost on server restart.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, Arc<dyn SessionSink>>>>,
}

impl SessionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink and return the identifier it was registered under.
    pub async fn register(&self, sink: Arc<dyn SessionSink>) -> SessionId {
        let id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        sessions.insert(id.clone(), sink);
        id
    }

    /// Remove a session. Returns false if it was not registered.
    pub async fn remove(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id).is_some()
    }

    /// Copy of the current membership, so callers can iterate while sessions come
    /// and go.
    pub async fn snapshot(&self) -> Vec<(SessionId, Arc<dyn SessionSink>)> {
        let sessions = self.sessions.read().await;
        sessions
            .iter()
            .map(|(id, sink)| (id.clone(), Arc::clone(sink)))
            .collect()
    }

    pub async fn contains(&self, id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(id)
    }

    /// Get the number of attached sessions
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}

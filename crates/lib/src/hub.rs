//! Serialization point between clients and the reservation engine.
//!
//! The [`Hub`] owns the [`ReservationEngine`] behind a single async mutex together
//! with the [`SessionRegistry`]. Every inbound request runs as one critical section:
//! apply the mutation, serialize the resulting snapshot, and hand the identical frame
//! to every session. Handing a frame over is a non-blocking channel push, so a slow
//! client only delays its own socket task and never the engine. Because the push
//! happens under the lock, each session receives frames in the order mutations were
//! applied.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::Result;
use crate::engine::{Outcome, ReservationEngine};
use crate::protocol::{Frame, Request, Snapshot};
use crate::session::{SessionId, SessionRegistry, SessionSink};

/// Point-in-time counters for health and stats endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub sessions: usize,
    pub users: usize,
    pub devices: usize,
}

/// Shared engine plus the observers that mirror its state.
#[derive(Default)]
pub struct Hub {
    engine: Mutex<ReservationEngine>,
    sessions: SessionRegistry,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(engine: ReservationEngine) -> Self {
        Self {
            engine: Mutex::new(engine),
            sessions: SessionRegistry::new(),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Attaches a new observer.
    ///
    /// The current snapshot is delivered to `sink` before it joins the registry, and
    /// the engine stays locked until it has joined, so no later frame can overtake the
    /// bootstrap one. Other sessions receive nothing.
    pub async fn attach(&self, sink: Arc<dyn SessionSink>) -> Result<SessionId> {
        let engine = self.engine.lock().await;
        let frame = Snapshot::new(engine.store(), None).to_frame()?;
        sink.deliver(frame)?;
        let id = self.sessions.register(sink).await;
        tracing::info!(session = %id, "Session attached");
        Ok(id)
    }

    /// Detaches an observer. The store is not touched.
    pub async fn detach(&self, id: &str) {
        if self.sessions.remove(id).await {
            tracing::info!(session = %id, "Session detached");
        }
    }

    /// Decodes and dispatches one inbound text message.
    ///
    /// Messages that do not decode are dropped without a broadcast.
    pub async fn handle_message(&self, text: &str) -> Result<Outcome> {
        let request = Request::decode(text).inspect_err(|e| {
            tracing::warn!("Dropping inbound message: {e}");
        })?;
        self.dispatch(request).await
    }

    /// Applies a request and broadcasts the resulting state to every session.
    ///
    /// The broadcast happens even when the engine rejected the request, so clients can
    /// always treat the latest frame as authoritative. A `device_available`
    /// notification rides along only on the frame that follows its release.
    ///
    /// A store that no longer satisfies [`EntityStore::verify`](crate::EntityStore::verify)
    /// after the request is reported as [`Error::Store`](crate::Error::Store) and is
    /// not broadcast.
    pub async fn dispatch(&self, request: Request) -> Result<Outcome> {
        let mut engine = self.engine.lock().await;
        let outcome = engine.apply(request);
        engine.store().verify().inspect_err(|e| {
            tracing::error!("Store invariant broken, withholding broadcast: {e}");
        })?;
        let notification = outcome.as_ref().ok().and_then(|effect| effect.notification());
        let frame = Snapshot::new(engine.store(), notification).to_frame()?;
        self.broadcast(frame).await;
        Ok(outcome)
    }

    /// Serialized current state, without any notification.
    pub async fn current_frame(&self) -> Result<Frame> {
        let engine = self.engine.lock().await;
        Ok(Snapshot::new(engine.store(), None).to_frame()?)
    }

    pub async fn stats(&self) -> HubStats {
        let (users, devices) = {
            let engine = self.engine.lock().await;
            (engine.store().users().len(), engine.store().devices().len())
        };
        HubStats {
            sessions: self.sessions.session_count().await,
            users,
            devices,
        }
    }

    // Callers hold the engine lock.
    async fn broadcast(&self, frame: Frame) {
        for (id, sink) in self.sessions.snapshot().await {
            if let Err(e) = sink.deliver(Arc::clone(&frame)) {
                tracing::warn!(session = %id, "Delivery failed, removing session: {e}");
                self.sessions.remove(&id).await;
            }
        }
    }
}

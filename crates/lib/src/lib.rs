//!
//! devqueue: fair, live-synchronized reservations for a small pool of shared devices.
//!
//! ## Core Concepts
//!
//! * **Entity store (`store::EntityStore`)**: in-memory users and devices. Devices point at users by
//!   identifier only.
//! * **Reservation engine (`engine::ReservationEngine`)**: the per-device state machine. A device is
//!   free or held; waiting users form a FIFO queue, except that a preempted holder goes back to the
//!   front. Failed preconditions leave the store untouched.
//! * **Sessions (`session::SessionRegistry`)**: observers that receive every state change.
//! * **Hub (`hub::Hub`)**: the single serialization point. It applies one request at a time and
//!   pushes the resulting full-state snapshot to every session.
//! * **Protocol (`protocol`)**: JSON envelopes in, snapshots (with an optional one-shot
//!   notification) out.

pub mod constants;
pub mod engine;
pub mod hub;
pub mod protocol;
pub mod session;
pub mod store;

pub use engine::{Effect, Outcome, Rejection, ReservationEngine};
pub use hub::{Hub, HubStats};
pub use store::{Device, DeviceId, EntityStore, User, UserId};

/// Result type used throughout the devqueue library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the devqueue library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured wire-format errors from the protocol module
    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),

    /// Structured delivery errors from the session module
    #[error(transparent)]
    Session(#[from] session::SessionError),

    /// Broken data-model invariants reported by the store
    #[error(transparent)]
    Store(#[from] store::StoreError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Protocol(_) => "protocol",
            Error::Session(_) => "session",
            Error::Store(_) => "store",
        }
    }

    /// Check if this error came from a message that could not be decoded.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Error::Protocol(
                protocol::ProtocolError::MalformedEnvelope(_)
                    | protocol::ProtocolError::InvalidPayload { .. }
            )
        )
    }

    /// Check if this error means a session can no longer receive frames.
    pub fn is_session_closed(&self) -> bool {
        matches!(self, Error::Session(session::SessionError::Closed))
    }
}

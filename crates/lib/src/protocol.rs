//! Wire format for client communication.
//!
//! Clients send one JSON envelope per message, `{"action": ..., "payload": {...}}`,
//! and receive full-state [`Snapshot`]s. The format is transport-agnostic; the
//! server binary carries it over WebSocket text frames.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::constants::actions;
use crate::store::{Device, DeviceId, EntityStore, User, UserId};

/// A serialized snapshot, shared by every session it is delivered to.
pub type Frame = Arc<str>;

/// Errors raised while decoding inbound messages or encoding snapshots.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    #[error("Invalid payload for action '{action}': {source}")]
    InvalidPayload {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A decoded client request, ready for the
/// [`ReservationEngine`](crate::engine::ReservationEngine).
///
/// Missing payload fields decode to empty values; the engine's preconditions turn
/// those into no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    AddUser {
        name: String,
        owner_token: String,
    },
    DeleteUser {
        user_id: UserId,
        owner_token: String,
    },
    AddDevice {
        name: String,
        details: String,
    },
    EditDevice {
        device_id: DeviceId,
        name: Option<String>,
        details: Option<String>,
    },
    DeleteDevice {
        device_id: DeviceId,
    },
    UseDevice(Assignment),
    QueueDevice(Assignment),
    PreemptDevice(Assignment),
    ReleaseDevice(Assignment),
    LeaveQueue(Assignment),
    /// An action this server does not know. Ignored, but still rebroadcast.
    Unknown {
        action: String,
    },
}

/// A (user, device) pair, the payload shared by all holding and queueing actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub user_id: UserId,
    pub device_id: DeviceId,
}

impl Assignment {
    pub fn new(user_id: impl Into<UserId>, device_id: impl Into<DeviceId>) -> Self {
        Self {
            user_id: user_id.into(),
            device_id: device_id.into(),
        }
    }
}

impl Request {
    /// Decodes one inbound text message.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(ProtocolError::MalformedEnvelope)?;
        Self::from_envelope(envelope)
    }

    /// The wire name of this request's action.
    pub fn action(&self) -> &str {
        match self {
            Request::AddUser { .. } => actions::ADD_USER,
            Request::DeleteUser { .. } => actions::DELETE_USER,
            Request::AddDevice { .. } => actions::ADD_DEVICE,
            Request::EditDevice { .. } => actions::EDIT_DEVICE,
            Request::DeleteDevice { .. } => actions::DELETE_DEVICE,
            Request::UseDevice(_) => actions::USE_DEVICE,
            Request::QueueDevice(_) => actions::QUEUE_DEVICE,
            Request::PreemptDevice(_) => actions::PREEMPT_DEVICE,
            Request::ReleaseDevice(_) => actions::RELEASE_DEVICE,
            Request::LeaveQueue(_) => actions::LEAVE_QUEUE,
            Request::Unknown { action } => action,
        }
    }

    fn from_envelope(envelope: Envelope) -> Result<Self, ProtocolError> {
        let Envelope { action, payload } = envelope;
        // Missing, null or non-string actions match nothing and fall through to Unknown
        let action = match action {
            serde_json::Value::String(action) => action,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        let request = match action.as_str() {
            actions::ADD_USER => {
                let p: UserPayload = parse_payload(&action, payload)?;
                Request::AddUser {
                    name: p.name.unwrap_or_default(),
                    owner_token: p.browser_id.unwrap_or_default(),
                }
            }
            actions::DELETE_USER => {
                let p: UserPayload = parse_payload(&action, payload)?;
                Request::DeleteUser {
                    user_id: p.id.unwrap_or_default().into(),
                    owner_token: p.browser_id.unwrap_or_default(),
                }
            }
            actions::ADD_DEVICE => {
                let p: DevicePayload = parse_payload(&action, payload)?;
                Request::AddDevice {
                    name: p.name.unwrap_or_default(),
                    details: p.details.unwrap_or_default(),
                }
            }
            actions::EDIT_DEVICE => {
                let p: DevicePayload = parse_payload(&action, payload)?;
                Request::EditDevice {
                    device_id: p.id.unwrap_or_default().into(),
                    name: p.name,
                    details: p.details,
                }
            }
            actions::DELETE_DEVICE => {
                let p: DevicePayload = parse_payload(&action, payload)?;
                Request::DeleteDevice {
                    device_id: p.id.unwrap_or_default().into(),
                }
            }
            actions::USE_DEVICE => Request::UseDevice(parse_assignment(&action, payload)?),
            actions::QUEUE_DEVICE => Request::QueueDevice(parse_assignment(&action, payload)?),
            actions::PREEMPT_DEVICE => {
                Request::PreemptDevice(parse_assignment(&action, payload)?)
            }
            actions::RELEASE_DEVICE => {
                Request::ReleaseDevice(parse_assignment(&action, payload)?)
            }
            actions::LEAVE_QUEUE => Request::LeaveQueue(parse_assignment(&action, payload)?),
            _ => Request::Unknown { action },
        };
        Ok(request)
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    action: serde_json::Value,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct UserPayload {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    browser_id: Option<String>,
}

#[derive(Deserialize)]
struct DevicePayload {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentPayload {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    device_id: Option<String>,
}

fn parse_payload<T: DeserializeOwned>(
    action: &str,
    payload: serde_json::Value,
) -> Result<T, ProtocolError> {
    // An absent payload means "no fields", not a malformed message.
    let payload = if payload.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        payload
    };
    serde_json::from_value(payload).map_err(|source| ProtocolError::InvalidPayload {
        action: action.to_string(),
        source,
    })
}

fn parse_assignment(action: &str, payload: serde_json::Value) -> Result<Assignment, ProtocolError> {
    let p: AssignmentPayload = parse_payload(action, payload)?;
    Ok(Assignment::new(
        p.user_id.unwrap_or_default(),
        p.device_id.unwrap_or_default(),
    ))
}

/// Kind of a one-shot notification carried by a snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A waiting user was promoted to holder when the previous holder released.
    DeviceAvailable,
}

/// One-shot event attached to the snapshot that follows the mutation producing it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub user_id: UserId,
    pub device_name: String,
    pub device_id: DeviceId,
}

impl Notification {
    pub fn device_available(user_id: UserId, device: &Device) -> Self {
        Self {
            kind: NotificationKind::DeviceAvailable,
            user_id,
            device_name: device.name.clone(),
            device_id: device.id.clone(),
        }
    }
}

/// Full state of the store, borrowed for serialization.
#[derive(Serialize, Debug)]
pub struct Snapshot<'a> {
    users: &'a IndexMap<UserId, User>,
    devices: &'a IndexMap<DeviceId, Device>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<&'a Notification>,
}

impl<'a> Snapshot<'a> {
    pub fn new(store: &'a EntityStore, notification: Option<&'a Notification>) -> Self {
        Self {
            users: store.users(),
            devices: store.devices(),
            notification,
        }
    }

    /// Serializes the snapshot into a frame ready for delivery.
    pub fn to_frame(&self) -> Result<Frame, ProtocolError> {
        let text = serde_json::to_string(self).map_err(ProtocolError::Encode)?;
        Ok(Frame::from(text))
    }
}

/// Owned, decoded form of a [`Snapshot`], as a client sees it.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StateView {
    pub users: IndexMap<UserId, User>,
    pub devices: IndexMap<DeviceId, Device>,
    #[serde(default)]
    pub notification: Option<Notification>,
}

impl StateView {
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::MalformedEnvelope)
    }
}

//! Error types for the entity store
use thiserror::Error;

use super::{DeviceId, UserId};

/// A broken data-model invariant, reported by [`EntityStore::verify`](super::EntityStore::verify).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Device {device_id} holder {user_id} is also waiting in its queue")]
    HolderInQueue { device_id: DeviceId, user_id: UserId },

    #[error("Device {device_id} queues user {user_id} more than once")]
    DuplicateInQueue { device_id: DeviceId, user_id: UserId },

    #[error("Device {device_id} references missing user {user_id}")]
    DanglingReference { device_id: DeviceId, user_id: UserId },
}

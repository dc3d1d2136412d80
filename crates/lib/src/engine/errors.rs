//! Error types for the reservation engine
use thiserror::Error;

use crate::store::{DeviceId, UserId};

/// Why an engine operation left the store unchanged.
///
/// Rejections never reach clients; the next broadcast simply shows the unchanged
/// state. They exist for logging and for tests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Required field is empty: {field}")]
    EmptyField { field: &'static str },

    #[error("User '{name}' already exists for this client")]
    DuplicateUser { name: String },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: UserId },

    #[error("User {user_id} belongs to a different client")]
    OwnerMismatch { user_id: UserId },

    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: DeviceId },

    #[error("Device {device_id} is already held by {holder}")]
    DeviceOccupied { device_id: DeviceId, holder: UserId },

    #[error("User {user_id} already holds device {device_id}")]
    AlreadyHolder { user_id: UserId, device_id: DeviceId },

    #[error("User {user_id} is already waiting for device {device_id}")]
    AlreadyQueued { user_id: UserId, device_id: DeviceId },

    #[error("User {user_id} does not hold device {device_id}")]
    NotHolder { user_id: UserId, device_id: DeviceId },

    #[error("User {user_id} is not waiting for device {device_id}")]
    NotQueued { user_id: UserId, device_id: DeviceId },
}

impl Rejection {
    /// Check if this rejection indicates a referenced entity was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Rejection::UserNotFound { .. } | Rejection::DeviceNotFound { .. }
        )
    }

    /// Check if this rejection is an ownership failure.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Rejection::OwnerMismatch { .. } | Rejection::NotHolder { .. })
    }

    /// Check if this rejection is a conflict with the current state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Rejection::DuplicateUser { .. }
                | Rejection::DeviceOccupied { .. }
                | Rejection::AlreadyHolder { .. }
                | Rejection::AlreadyQueued { .. }
        )
    }
}

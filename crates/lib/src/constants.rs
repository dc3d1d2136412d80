//! Constants used throughout devqueue.
//!
//! This module provides central definitions for wire names shared by the protocol
//! decoder and the bundled client.

/// Action names accepted in the `action` field of an inbound envelope.
pub mod actions {
    pub const ADD_USER: &str = "addUser";
    pub const DELETE_USER: &str = "deleteUser";
    pub const ADD_DEVICE: &str = "addDevice";
    pub const EDIT_DEVICE: &str = "editDevice";
    pub const DELETE_DEVICE: &str = "deleteDevice";
    pub const USE_DEVICE: &str = "useDevice";
    pub const QUEUE_DEVICE: &str = "queueDevice";
    pub const PREEMPT_DEVICE: &str = "preemptDevice";
    pub const RELEASE_DEVICE: &str = "releaseDevice";
    pub const LEAVE_QUEUE: &str = "leaveQueue";

    /// Every action the server understands, in protocol order.
    pub const ALL: [&str; 10] = [
        ADD_USER,
        DELETE_USER,
        ADD_DEVICE,
        EDIT_DEVICE,
        DELETE_DEVICE,
        USE_DEVICE,
        QUEUE_DEVICE,
        PREEMPT_DEVICE,
        RELEASE_DEVICE,
        LEAVE_QUEUE,
    ];
}

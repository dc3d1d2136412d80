//! Shared setup and assertion helpers.

#![allow(dead_code)]

use std::collections::VecDeque;

use devqueue::{
    Device, DeviceId, Effect, ReservationEngine, UserId,
    protocol::{Frame, StateView},
};
use tokio::sync::mpsc;

/// Owner token used by helpers that do not care about ownership.
pub const TOKEN: &str = "browser-1";

/// Create a user owned by [`TOKEN`] and return its id
pub fn add_user(engine: &mut ReservationEngine, name: &str) -> UserId {
    match engine.add_user(name, TOKEN).expect("Failed to add user") {
        Effect::UserAdded(id) => id,
        other => panic!("Unexpected effect from add_user: {other:?}"),
    }
}

/// Create a device and return its id
pub fn add_device(engine: &mut ReservationEngine, name: &str) -> DeviceId {
    match engine.add_device(name, "").expect("Failed to add device") {
        Effect::DeviceAdded(id) => id,
        other => panic!("Unexpected effect from add_device: {other:?}"),
    }
}

/// Engine with users A, B, C and one free device D
pub fn setup_abc() -> (ReservationEngine, [UserId; 3], DeviceId) {
    let mut engine = ReservationEngine::new();
    let a = add_user(&mut engine, "A");
    let b = add_user(&mut engine, "B");
    let c = add_user(&mut engine, "C");
    let d = add_device(&mut engine, "D");
    (engine, [a, b, c], d)
}

pub fn device<'a>(engine: &'a ReservationEngine, id: &DeviceId) -> &'a Device {
    engine.store().device(id).expect("Device should exist")
}

/// Assert holder and queue of a device in one go
pub fn assert_device_state(
    engine: &ReservationEngine,
    id: &DeviceId,
    holder: Option<&UserId>,
    queue: &[&UserId],
) {
    let device = device(engine, id);
    assert_eq!(device.holder.as_ref(), holder, "unexpected holder");
    let expected: VecDeque<UserId> = queue.iter().map(|u| (*u).clone()).collect();
    assert_eq!(device.queue, expected, "unexpected queue");
}

/// Build a wire envelope for a (user, device) action
pub fn assignment_envelope(action: &str, user: &UserId, device: &DeviceId) -> String {
    serde_json::json!({
        "action": action,
        "payload": { "userId": user, "deviceId": device },
    })
    .to_string()
}

/// Drain every frame currently waiting on a session channel
pub fn drain(rx: &mut mpsc::UnboundedReceiver<Frame>) -> Vec<StateView> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(StateView::decode(&frame).expect("Frame should decode"));
    }
    frames
}

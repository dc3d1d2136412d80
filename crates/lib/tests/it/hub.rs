//! Broadcast fan-out, session bootstrap and session cleanup.

use std::sync::Arc;

use devqueue::{
    Device, DeviceId, Effect, EntityStore, Error, Hub, HubStats, Rejection, ReservationEngine,
    User, UserId,
    constants::actions,
    protocol::{Frame, Request},
    session::{SessionError, SessionSink},
    store::StoreError,
};
use serde_json::json;
use tokio::sync::mpsc;

use crate::helpers::*;

fn channel() -> (
    Arc<dyn SessionSink>,
    mpsc::UnboundedReceiver<Frame>,
) {
    let (tx, rx) = mpsc::unbounded_channel::<Frame>();
    let sink: Arc<dyn SessionSink> = Arc::new(tx);
    (sink, rx)
}

async fn add_user(hub: &Hub, name: &str) -> UserId {
    let text = json!({ "action": actions::ADD_USER, "payload": { "name": name, "browser_id": TOKEN } });
    match hub.handle_message(&text.to_string()).await.unwrap() {
        Ok(Effect::UserAdded(id)) => id,
        other => panic!("Unexpected outcome: {other:?}"),
    }
}

async fn add_device(hub: &Hub, name: &str) -> DeviceId {
    let text = json!({ "action": actions::ADD_DEVICE, "payload": { "name": name } });
    match hub.handle_message(&text.to_string()).await.unwrap() {
        Ok(Effect::DeviceAdded(id)) => id,
        other => panic!("Unexpected outcome: {other:?}"),
    }
}

/// Sink that refuses every frame, as a disconnected client would.
struct ClosedSink;

impl SessionSink for ClosedSink {
    fn deliver(&self, _frame: Frame) -> Result<(), SessionError> {
        Err(SessionError::Closed)
    }
}

#[tokio::test]
async fn test_attach_sends_bootstrap_snapshot_only_to_new_session() {
    let hub = Hub::new();
    let (first, mut first_rx) = channel();
    hub.attach(first).await.unwrap();
    let user = add_user(&hub, "A").await;
    drain(&mut first_rx);

    let (second, mut second_rx) = channel();
    hub.attach(second).await.unwrap();

    let bootstrap = drain(&mut second_rx);
    assert_eq!(bootstrap.len(), 1);
    assert!(bootstrap[0].users.contains_key(&user));
    assert!(bootstrap[0].notification.is_none());

    // Attaching does not broadcast to anyone else
    assert!(drain(&mut first_rx).is_empty());
}

#[tokio::test]
async fn test_every_session_gets_identical_frames() {
    let hub = Hub::new();
    let (s1, mut rx1) = channel();
    let (s2, mut rx2) = channel();
    hub.attach(s1).await.unwrap();
    hub.attach(s2).await.unwrap();

    add_user(&hub, "A").await;
    add_device(&hub, "D").await;

    let frames1: Vec<Frame> = std::iter::from_fn(|| rx1.try_recv().ok()).collect();
    let frames2: Vec<Frame> = std::iter::from_fn(|| rx2.try_recv().ok()).collect();
    assert_eq!(frames1.len(), 3);
    assert_eq!(frames1, frames2);
}

#[tokio::test]
async fn test_rejected_and_unknown_actions_still_broadcast() {
    let hub = Hub::new();
    let (sink, mut rx) = channel();
    hub.attach(sink).await.unwrap();
    drain(&mut rx);

    let outcome = hub
        .dispatch(Request::AddUser {
            name: String::new(),
            owner_token: TOKEN.to_string(),
        })
        .await
        .unwrap();
    assert_eq!(outcome, Err(Rejection::EmptyField { field: "name" }));
    assert_eq!(drain(&mut rx).len(), 1);

    let outcome = hub
        .handle_message(r#"{"action":"teleport","payload":{}}"#)
        .await
        .unwrap();
    assert_eq!(outcome, Ok(Effect::Applied));
    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 1);
    assert!(frames[0].users.is_empty());
}

#[tokio::test]
async fn test_malformed_message_is_not_broadcast() {
    let hub = Hub::new();
    let (sink, mut rx) = channel();
    hub.attach(sink).await.unwrap();
    drain(&mut rx);

    let err = hub.handle_message("{{{").await.unwrap_err();
    assert!(err.is_malformed_input());
    assert_eq!(err.module(), "protocol");
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_envelope_without_action_still_broadcasts() {
    let hub = Hub::new();
    let (sink, mut rx) = channel();
    hub.attach(sink).await.unwrap();
    drain(&mut rx);

    for text in [r#"{"payload":{}}"#, r#"{"action":null}"#, r#"{"action":5}"#] {
        assert_eq!(hub.handle_message(text).await.unwrap(), Ok(Effect::Applied));
    }
    assert_eq!(drain(&mut rx).len(), 3);
}

#[tokio::test]
async fn test_broken_store_is_reported_and_not_broadcast() {
    let mut store = EntityStore::new();
    store.insert_user(User {
        id: UserId::new("a"),
        name: "A".to_string(),
        owner_token: TOKEN.to_string(),
    });
    let mut device = Device::new(DeviceId::new("d"), "scope", "");
    device.holder = Some(UserId::new("a"));
    device.queue.push_back(UserId::new("a"));
    store.insert_device(device);

    let hub = Hub::with_engine(ReservationEngine::with_store(store));
    let (sink, mut rx) = channel();
    hub.attach(sink).await.unwrap();
    drain(&mut rx);

    let err = hub
        .dispatch(Request::Unknown {
            action: "noop".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.module(), "store");
    assert!(matches!(
        err,
        Error::Store(StoreError::HolderInQueue { .. })
    ));
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_notification_rides_only_on_release_frame() {
    let hub = Hub::new();
    let (sink, mut rx) = channel();
    hub.attach(sink).await.unwrap();

    let a = add_user(&hub, "A").await;
    let b = add_user(&hub, "B").await;
    let c = add_user(&hub, "C").await;
    let d = add_device(&hub, "D").await;

    for (action, user) in [
        (actions::USE_DEVICE, &a),
        (actions::QUEUE_DEVICE, &b),
        (actions::PREEMPT_DEVICE, &c),
    ] {
        hub.handle_message(&assignment_envelope(action, user, &d))
            .await
            .unwrap()
            .unwrap();
    }
    let frames = drain(&mut rx);
    let last = frames.last().unwrap();
    assert_eq!(last.devices[&d].holder.as_ref(), Some(&c));
    assert_eq!(last.devices[&d].queue, [a.clone(), b.clone()]);
    assert!(frames.iter().all(|f| f.notification.is_none()));

    hub.handle_message(&assignment_envelope(actions::RELEASE_DEVICE, &c, &d))
        .await
        .unwrap()
        .unwrap();
    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 1);
    let notification = frames[0].notification.as_ref().expect("notification expected");
    assert_eq!(notification.user_id, a);
    assert_eq!(notification.device_name, "D");
    assert_eq!(frames[0].devices[&d].holder.as_ref(), Some(&a));
    assert_eq!(frames[0].devices[&d].queue, [b.clone()]);

    // The next frame is back to plain state
    hub.handle_message(&assignment_envelope(actions::LEAVE_QUEUE, &b, &d))
        .await
        .unwrap()
        .unwrap();
    let frames = drain(&mut rx);
    assert!(frames[0].notification.is_none());
}

#[tokio::test]
async fn test_failed_session_is_removed_without_affecting_others() {
    let hub = Hub::new();
    let (healthy, mut rx) = channel();
    hub.attach(healthy).await.unwrap();

    let (doomed, doomed_rx) = channel();
    let doomed_id = hub.attach(doomed).await.unwrap();
    assert_eq!(hub.sessions().session_count().await, 2);

    drop(doomed_rx);
    add_user(&hub, "A").await;

    assert!(!hub.sessions().contains(&doomed_id).await);
    assert_eq!(hub.sessions().session_count().await, 1);
    let frames = drain(&mut rx);
    assert_eq!(frames.last().unwrap().users.len(), 1);
}

#[tokio::test]
async fn test_attach_to_closed_sink_fails() {
    let hub = Hub::new();
    let err = hub.attach(Arc::new(ClosedSink)).await.unwrap_err();
    assert!(err.is_session_closed());
    assert_eq!(hub.sessions().session_count().await, 0);
}

#[tokio::test]
async fn test_detach_stops_delivery() {
    let hub = Hub::new();
    let (sink, mut rx) = channel();
    let id = hub.attach(sink).await.unwrap();
    drain(&mut rx);

    hub.detach(&id).await;
    add_user(&hub, "A").await;

    assert!(drain(&mut rx).is_empty());
    assert_eq!(hub.stats().await.users, 1);
}

#[tokio::test]
async fn test_concurrent_requests_keep_per_session_order() {
    let hub = Arc::new(Hub::new());
    let (sink, mut rx) = channel();
    hub.attach(sink).await.unwrap();
    drain(&mut rx);

    let mut tasks = Vec::new();
    for i in 0..16 {
        let hub = Arc::clone(&hub);
        tasks.push(tokio::spawn(async move {
            let text = json!({
                "action": actions::ADD_DEVICE,
                "payload": { "name": format!("device-{i}") },
            });
            hub.handle_message(&text.to_string()).await.unwrap()
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // Each frame reflects exactly one more device than the one before it
    let frames = drain(&mut rx);
    assert_eq!(frames.len(), 16);
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.devices.len(), i + 1);
    }
}

#[tokio::test]
async fn test_stats_and_current_frame() {
    let hub = Hub::new();
    let (sink, _rx) = channel();
    hub.attach(sink).await.unwrap();
    add_user(&hub, "A").await;
    add_device(&hub, "D").await;

    assert_eq!(
        hub.stats().await,
        HubStats {
            sessions: 1,
            users: 1,
            devices: 1,
        }
    );

    let frame = hub.current_frame().await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert!(value.get("notification").is_none());
    assert_eq!(value["devices"].as_object().unwrap().len(), 1);
}

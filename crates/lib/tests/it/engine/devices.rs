//! Device creation, editing and deletion.

use devqueue::{DeviceId, Effect, Rejection, ReservationEngine};

use crate::helpers::*;

#[test]
fn test_add_device_starts_free() {
    let mut engine = ReservationEngine::new();
    let id = match engine.add_device("Oscilloscope", "Bench 3") {
        Ok(Effect::DeviceAdded(id)) => id,
        other => panic!("Unexpected outcome: {other:?}"),
    };

    let device = device(&engine, &id);
    assert_eq!(device.name, "Oscilloscope");
    assert_eq!(device.details, "Bench 3");
    assert!(!device.is_held());
    assert!(device.queue.is_empty());
}

#[test]
fn test_add_device_requires_name() {
    let mut engine = ReservationEngine::new();
    assert_eq!(
        engine.add_device("", "details"),
        Err(Rejection::EmptyField { field: "name" })
    );
    assert!(engine.store().devices().is_empty());
}

#[test]
fn test_edit_device_updates_only_provided_fields() {
    let mut engine = ReservationEngine::new();
    let id = add_device(&mut engine, "Scope");
    engine
        .edit_device(&id, None, Some("Rack 2".to_string()))
        .unwrap();
    assert_eq!(device(&engine, &id).name, "Scope");
    assert_eq!(device(&engine, &id).details, "Rack 2");

    engine
        .edit_device(&id, Some("Scope B".to_string()), None)
        .unwrap();
    assert_eq!(device(&engine, &id).name, "Scope B");
    assert_eq!(device(&engine, &id).details, "Rack 2");
}

#[test]
fn test_edit_keeps_reservation_state() {
    let (mut engine, [a, b, _], d) = setup_abc();
    engine.use_device(&a, &d).unwrap();
    engine.queue_device(&b, &d).unwrap();

    engine
        .edit_device(&d, Some("renamed".to_string()), None)
        .unwrap();
    assert_device_state(&engine, &d, Some(&a), &[&b]);
}

#[test]
fn test_edit_and_delete_missing_device() {
    let mut engine = ReservationEngine::new();
    let ghost = DeviceId::new("ghost");

    assert!(
        engine
            .edit_device(&ghost, Some("x".to_string()), None)
            .unwrap_err()
            .is_not_found()
    );
    assert!(engine.delete_device(&ghost).unwrap_err().is_not_found());
}

#[test]
fn test_delete_device_leaves_users() {
    let (mut engine, [a, b, _], d) = setup_abc();
    engine.use_device(&a, &d).unwrap();
    engine.queue_device(&b, &d).unwrap();

    assert_eq!(engine.delete_device(&d), Ok(Effect::Applied));
    assert!(engine.store().device(&d).is_none());
    assert_eq!(engine.store().users().len(), 3);
}

//! In-memory registry of users and devices.
//!
//! The store owns every [`User`] and [`Device`]. Devices refer to users by
//! [`UserId`] only; keeping those references valid is the job of the
//! [`ReservationEngine`](crate::engine::ReservationEngine), and [`EntityStore::verify`]
//! checks that it did.
//!
//! Both maps iterate in insertion order, so serialized snapshots are deterministic.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

mod errors;
mod id;

pub use errors::StoreError;
pub use id::{DeviceId, UserId};

/// A person who can hold or wait for devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Opaque identity of the client that created this user. Only that client may
    /// delete it.
    #[serde(rename = "browser_id")]
    pub owner_token: String,
}

/// A shared device with at most one holder and a wait queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub details: String,
    #[serde(rename = "in_use_by")]
    pub holder: Option<UserId>,
    pub queue: VecDeque<UserId>,
}

impl Device {
    /// Creates a free device with an empty queue.
    pub fn new(id: DeviceId, name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            details: details.into(),
            holder: None,
            queue: VecDeque::new(),
        }
    }

    pub fn is_held(&self) -> bool {
        self.holder.is_some()
    }

    pub fn is_held_by(&self, user: &UserId) -> bool {
        self.holder.as_ref() == Some(user)
    }

    pub fn is_queued(&self, user: &UserId) -> bool {
        self.queue.contains(user)
    }

    /// Removes `user` from the queue, returning whether it was present.
    pub fn remove_from_queue(&mut self, user: &UserId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|queued| queued != user);
        self.queue.len() != before
    }
}

/// Registry of all users and devices, in insertion order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct EntityStore {
    users: IndexMap<UserId, User>,
    devices: IndexMap<DeviceId, Device>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> &IndexMap<UserId, User> {
        &self.users
    }

    pub fn devices(&self) -> &IndexMap<DeviceId, Device> {
        &self.devices
    }

    pub fn user(&self, id: &UserId) -> Option<&User> {
        self.users.get(id)
    }

    pub fn contains_user(&self, id: &UserId) -> bool {
        self.users.contains_key(id)
    }

    /// Finds a user by its (name, owner token) pair, the store's uniqueness key.
    pub fn find_user(&self, name: &str, owner_token: &str) -> Option<&User> {
        self.users
            .values()
            .find(|u| u.name == name && u.owner_token == owner_token)
    }

    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    /// Removes a user record. Device references are not touched.
    pub fn remove_user(&mut self, id: &UserId) -> Option<User> {
        self.users.shift_remove(id)
    }

    pub fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn device_mut(&mut self, id: &DeviceId) -> Option<&mut Device> {
        self.devices.get_mut(id)
    }

    pub fn devices_mut(&mut self) -> impl Iterator<Item = &mut Device> {
        self.devices.values_mut()
    }

    pub fn insert_device(&mut self, device: Device) {
        self.devices.insert(device.id.clone(), device);
    }

    pub fn remove_device(&mut self, id: &DeviceId) -> Option<Device> {
        self.devices.shift_remove(id)
    }

    /// Checks the data-model invariants over every device.
    ///
    /// Returns the first violation found: a holder that also waits in its own queue,
    /// a user queued twice, or a reference to a user that no longer exists.
    pub fn verify(&self) -> Result<(), StoreError> {
        for device in self.devices.values() {
            if let Some(holder) = &device.holder {
                if !self.users.contains_key(holder) {
                    return Err(StoreError::DanglingReference {
                        device_id: device.id.clone(),
                        user_id: holder.clone(),
                    });
                }
                if device.queue.contains(holder) {
                    return Err(StoreError::HolderInQueue {
                        device_id: device.id.clone(),
                        user_id: holder.clone(),
                    });
                }
            }

            let mut seen = HashSet::with_capacity(device.queue.len());
            for queued in &device.queue {
                if !seen.insert(queued) {
                    return Err(StoreError::DuplicateInQueue {
                        device_id: device.id.clone(),
                        user_id: queued.clone(),
                    });
                }
                if !self.users.contains_key(queued) {
                    return Err(StoreError::DanglingReference {
                        device_id: device.id.clone(),
                        user_id: queued.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

//! The reservation state machine.
//!
//! Each device is either free or held by one user, with an ordered wait queue in
//! front of it. [`ReservationEngine`] owns the [`EntityStore`] and exposes one
//! operation per client action. Every operation either commits its whole effect or
//! leaves the store untouched and returns a [`Rejection`].
//!
//! ```text
//!   Free --use--> Held
//!   Held --preempt--> Held            (caller holds, old holder at queue front)
//!   Held --release, queue empty--> Free
//!   Held --release, queue waiting--> Held   (queue head promoted, notification)
//! ```
//!
//! Queue, leave and edit operations never change whether a device is free or held.

use crate::protocol::{Notification, Request};
use crate::store::{Device, DeviceId, EntityStore, User, UserId};

mod errors;

pub use errors::Rejection;

/// What a successful operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// State changed; nothing else to report.
    Applied,
    /// A user was created with this identifier.
    UserAdded(UserId),
    /// A device was created with this identifier.
    DeviceAdded(DeviceId),
    /// A release handed the device to the next waiting user.
    Promoted(Notification),
}

impl Effect {
    /// The notification to attach to the next broadcast, if any.
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            Effect::Promoted(notification) => Some(notification),
            _ => None,
        }
    }
}

/// Result of one engine operation.
pub type Outcome = std::result::Result<Effect, Rejection>;

/// Owner of all reservation state. Not synchronized; callers serialize access
/// (see [`Hub`](crate::hub::Hub)).
#[derive(Debug, Default)]
pub struct ReservationEngine {
    store: EntityStore,
}

impl ReservationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing store. The store is expected to satisfy
    /// [`EntityStore::verify`].
    pub fn with_store(store: EntityStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Dispatches a decoded request to its operation and logs rejections.
    pub fn apply(&mut self, request: Request) -> Outcome {
        let action = request.action().to_string();
        let outcome = match request {
            Request::AddUser { name, owner_token } => self.add_user(&name, &owner_token),
            Request::DeleteUser {
                user_id,
                owner_token,
            } => self.delete_user(&user_id, &owner_token),
            Request::AddDevice { name, details } => self.add_device(&name, &details),
            Request::EditDevice {
                device_id,
                name,
                details,
            } => self.edit_device(&device_id, name, details),
            Request::DeleteDevice { device_id } => self.delete_device(&device_id),
            Request::UseDevice(a) => self.use_device(&a.user_id, &a.device_id),
            Request::QueueDevice(a) => self.queue_device(&a.user_id, &a.device_id),
            Request::PreemptDevice(a) => self.preempt_device(&a.user_id, &a.device_id),
            Request::ReleaseDevice(a) => self.release_device(&a.user_id, &a.device_id),
            Request::LeaveQueue(a) => self.leave_queue(&a.user_id, &a.device_id),
            Request::Unknown { action } => {
                tracing::debug!(%action, "Ignoring unknown action");
                return Ok(Effect::Applied);
            }
        };

        match &outcome {
            Ok(effect) => tracing::debug!(%action, ?effect, "Applied action"),
            Err(rejection) => tracing::debug!(%action, %rejection, "Rejected action"),
        }
        outcome
    }

    /// Creates a user. Names are unique per owner token only.
    pub fn add_user(&mut self, name: &str, owner_token: &str) -> Outcome {
        if name.is_empty() {
            return Err(Rejection::EmptyField { field: "name" });
        }
        if owner_token.is_empty() {
            return Err(Rejection::EmptyField {
                field: "browser_id",
            });
        }
        if self.store.find_user(name, owner_token).is_some() {
            return Err(Rejection::DuplicateUser {
                name: name.to_string(),
            });
        }

        let id = UserId::generate();
        self.store.insert_user(User {
            id: id.clone(),
            name: name.to_string(),
            owner_token: owner_token.to_string(),
        });
        Ok(Effect::UserAdded(id))
    }

    /// Deletes a user created by the same client, purging every device reference
    /// to it. Devices the user held are vacated without promoting their queue.
    pub fn delete_user(&mut self, user_id: &UserId, owner_token: &str) -> Outcome {
        let user = self
            .store
            .user(user_id)
            .ok_or_else(|| Rejection::UserNotFound {
                user_id: user_id.clone(),
            })?;
        if user.owner_token != owner_token {
            return Err(Rejection::OwnerMismatch {
                user_id: user_id.clone(),
            });
        }

        for device in self.store.devices_mut() {
            if device.is_held_by(user_id) {
                device.holder = None;
            }
            device.remove_from_queue(user_id);
        }
        self.store.remove_user(user_id);
        Ok(Effect::Applied)
    }

    pub fn add_device(&mut self, name: &str, details: &str) -> Outcome {
        if name.is_empty() {
            return Err(Rejection::EmptyField { field: "name" });
        }

        let id = DeviceId::generate();
        self.store
            .insert_device(Device::new(id.clone(), name, details));
        Ok(Effect::DeviceAdded(id))
    }

    /// Updates the provided fields only.
    pub fn edit_device(
        &mut self,
        device_id: &DeviceId,
        name: Option<String>,
        details: Option<String>,
    ) -> Outcome {
        let device = self.device_mut(device_id)?;
        if let Some(name) = name {
            device.name = name;
        }
        if let Some(details) = details {
            device.details = details;
        }
        Ok(Effect::Applied)
    }

    pub fn delete_device(&mut self, device_id: &DeviceId) -> Outcome {
        self.store
            .remove_device(device_id)
            .map(|_| Effect::Applied)
            .ok_or_else(|| Rejection::DeviceNotFound {
                device_id: device_id.clone(),
            })
    }

    /// Takes a free device. The queue is not consulted, but a caller who was waiting
    /// leaves it on becoming holder.
    pub fn use_device(&mut self, user_id: &UserId, device_id: &DeviceId) -> Outcome {
        self.require_user(user_id)?;
        let device = self.device_mut(device_id)?;
        if let Some(holder) = &device.holder {
            return Err(Rejection::DeviceOccupied {
                device_id: device_id.clone(),
                holder: holder.clone(),
            });
        }

        device.remove_from_queue(user_id);
        device.holder = Some(user_id.clone());
        Ok(Effect::Applied)
    }

    /// Appends the user to the back of the queue. Idempotent.
    pub fn queue_device(&mut self, user_id: &UserId, device_id: &DeviceId) -> Outcome {
        self.require_user(user_id)?;
        let device = self.device_mut(device_id)?;
        if device.is_held_by(user_id) {
            return Err(Rejection::AlreadyHolder {
                user_id: user_id.clone(),
                device_id: device_id.clone(),
            });
        }
        if device.is_queued(user_id) {
            return Err(Rejection::AlreadyQueued {
                user_id: user_id.clone(),
                device_id: device_id.clone(),
            });
        }

        device.queue.push_back(user_id.clone());
        Ok(Effect::Applied)
    }

    /// Takes the device from its current holder, who moves to the front of the
    /// queue. A caller that was waiting leaves the queue.
    pub fn preempt_device(&mut self, user_id: &UserId, device_id: &DeviceId) -> Outcome {
        self.require_user(user_id)?;
        let device = self.device_mut(device_id)?;
        if device.is_held_by(user_id) {
            return Err(Rejection::AlreadyHolder {
                user_id: user_id.clone(),
                device_id: device_id.clone(),
            });
        }

        if let Some(prior) = device.holder.take()
            && !device.is_queued(&prior)
        {
            device.queue.push_front(prior);
        }
        device.remove_from_queue(user_id);
        device.holder = Some(user_id.clone());
        Ok(Effect::Applied)
    }

    /// Gives up a held device. The head of the queue, if any, becomes the holder and
    /// is announced with a `device_available` notification.
    pub fn release_device(&mut self, user_id: &UserId, device_id: &DeviceId) -> Outcome {
        let device = self.device_mut(device_id)?;
        if !device.is_held_by(user_id) {
            return Err(Rejection::NotHolder {
                user_id: user_id.clone(),
                device_id: device_id.clone(),
            });
        }

        match device.queue.pop_front() {
            Some(next) => {
                device.holder = Some(next.clone());
                Ok(Effect::Promoted(Notification::device_available(
                    next, device,
                )))
            }
            None => {
                device.holder = None;
                Ok(Effect::Applied)
            }
        }
    }

    pub fn leave_queue(&mut self, user_id: &UserId, device_id: &DeviceId) -> Outcome {
        let device = self.device_mut(device_id)?;
        if !device.remove_from_queue(user_id) {
            return Err(Rejection::NotQueued {
                user_id: user_id.clone(),
                device_id: device_id.clone(),
            });
        }
        Ok(Effect::Applied)
    }

    fn device_mut(&mut self, device_id: &DeviceId) -> Result<&mut Device, Rejection> {
        self.store
            .device_mut(device_id)
            .ok_or_else(|| Rejection::DeviceNotFound {
                device_id: device_id.clone(),
            })
    }

    // Holders and queue entries must name live users.
    fn require_user(&self, user_id: &UserId) -> Result<(), Rejection> {
        if self.store.contains_user(user_id) {
            Ok(())
        } else {
            Err(Rejection::UserNotFound {
                user_id: user_id.clone(),
            })
        }
    }
}

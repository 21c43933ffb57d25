use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use realty_domain::{
    id::{PropertyId, UserId},
    participant::UserRecord,
    property::{PropertyCommand, PropertyStatus},
};
use realty_engine::port::{
    PropertyDirectory, PropertySync, PropertySyncError, RepositoryError, UserDirectory,
};

/// User records keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    pub fn insert(&self, user: UserRecord) {
        self.users.lock().unwrap().insert(user.id(), user);
    }

    /// Removes a user, returning the old record.
    pub fn remove(&self, id: UserId) -> Option<UserRecord> {
        self.users.lock().unwrap().remove(&id)
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }
}

/// Property statuses keyed by id, recording every status write it receives.
#[derive(Debug, Default)]
pub struct InMemoryPropertyDirectory {
    statuses: Mutex<HashMap<PropertyId, PropertyStatus>>,
    calls: Mutex<Vec<(PropertyId, PropertyStatus)>>,
}

impl InMemoryPropertyDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property with the given status.
    pub fn insert(&self, id: PropertyId, status: PropertyStatus) {
        self.statuses.lock().unwrap().insert(id, status);
    }

    /// Returns the current status of a property.
    pub fn status(&self, id: PropertyId) -> Option<PropertyStatus> {
        self.statuses.lock().unwrap().get(&id).copied()
    }

    /// Returns every `set_status` call received, known property or not.
    pub fn calls(&self) -> Vec<(PropertyId, PropertyStatus)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PropertyDirectory for InMemoryPropertyDirectory {
    async fn set_status(
        &self,
        id: PropertyId,
        status: PropertyStatus,
    ) -> Result<bool, RepositoryError> {
        self.calls.lock().unwrap().push((id, status));

        Ok(self.statuses.lock().unwrap().get_mut(&id).map(|s| *s = status).is_some())
    }
}

/// A [`PropertySync`] that keeps dispatched commands in memory.
#[derive(Debug, Default)]
pub struct RecordingPropertySync {
    commands: Mutex<Vec<PropertyCommand>>,
    fail: AtomicBool,
}

impl RecordingPropertySync {
    /// Creates a sync that accepts every command.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following dispatch fail with [`PropertySyncError::Closed`].
    pub fn fail_dispatch(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Returns the accepted commands in dispatch order.
    pub fn commands(&self) -> Vec<PropertyCommand> {
        self.commands.lock().unwrap().clone()
    }
}

impl PropertySync for RecordingPropertySync {
    fn dispatch(&self, command: PropertyCommand) -> Result<(), PropertySyncError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PropertySyncError::Closed);
        }

        self.commands.lock().unwrap().push(command);

        Ok(())
    }
}

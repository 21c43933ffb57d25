//! Participant snapshots frozen at deal creation.

use std::sync::Arc;

use realty_domain::participant::{ParticipantRefs, ParticipantSnapshot, ParticipantsSnapshot};

use crate::port::{RepositoryError, UserDirectory};

/// Resolves participant references into denormalized snapshots.
#[derive(Clone)]
pub struct SnapshotBuilder {
    users: Arc<dyn UserDirectory>,
}

impl SnapshotBuilder {
    /// Creates a builder reading from `users`.
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    /// Captures one snapshot per supplied role.
    ///
    /// A reference to a user that no longer exists does not fail the build, it is recorded as
    /// an unresolved snapshot. Roles absent from `refs` stay absent from the result.
    ///
    /// # Errors
    ///
    /// Returns an error only if the user directory itself fails.
    #[tracing::instrument(skip_all, fields(participants = refs.len()))]
    pub async fn build(&self, refs: &ParticipantRefs) -> Result<ParticipantsSnapshot, RepositoryError> {
        let mut snapshot = ParticipantsSnapshot::new();

        for (&role, &user_id) in refs {
            let entry = match self.users.find_user(user_id).await? {
                Some(user) => ParticipantSnapshot::capture(&user),
                None => {
                    tracing::warn!("user {user_id} for role {role} not found at snapshot time");
                    ParticipantSnapshot::missing(user_id)
                },
            };

            snapshot.insert(role, entry);
        }

        Ok(snapshot)
    }
}

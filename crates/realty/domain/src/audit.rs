//! Append-only audit trail for ledger mutations.

use core::fmt;

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies an audit log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct AuditEntryId(i64);

impl From<i64> for AuditEntryId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<AuditEntryId> for i64 {
    fn from(AuditEntryId(id): AuditEntryId) -> Self {
        id
    }
}

impl fmt::Display for AuditEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What happened to the audited entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    /// The entity was created.
    Create,
    /// Descriptive fields or status changed.
    Update,
    /// Funds were added to a balance.
    Credit,
    /// Funds were removed from a balance.
    Debit,
}

/// The kind of entity an audit entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum AuditEntity {
    /// A ledger transaction.
    Transaction,
    /// A trust account.
    TrustAccount,
}

/// Who caused a mutation and where the request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder, Dissolve)]
pub struct AuditContext {
    /// Acting user, if known.
    user_id: Option<String>,
    /// Originating address, if known.
    ip_address: Option<String>,
}

impl AuditContext {
    /// Returns the acting user.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Returns the originating address.
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }
}

/// An audit entry waiting to be appended.
#[derive(Debug, Clone, PartialEq, Builder, Dissolve)]
pub struct NewAuditEntry {
    /// What happened.
    action: AuditAction,
    /// What kind of entity it happened to.
    entity_type: AuditEntity,
    /// The id of the entity, as text.
    entity_id: String,
    /// Snapshot before the mutation.
    old_value: Option<Value>,
    /// Snapshot after the mutation.
    new_value: Option<Value>,
    /// Who and where.
    #[builder(default)]
    context: AuditContext,
}

impl NewAuditEntry {
    /// Returns the action.
    pub fn action(&self) -> AuditAction {
        self.action
    }

    /// Returns the entity type.
    pub fn entity_type(&self) -> AuditEntity {
        self.entity_type
    }

    /// Returns the entity id.
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Returns the snapshot before the mutation.
    pub fn old_value(&self) -> Option<&Value> {
        self.old_value.as_ref()
    }

    /// Returns the snapshot after the mutation.
    pub fn new_value(&self) -> Option<&Value> {
        self.new_value.as_ref()
    }

    /// Returns the actor context.
    pub fn context(&self) -> &AuditContext {
        &self.context
    }

    /// Materializes the entry once the store has assigned its id.
    pub fn into_entry(self, id: AuditEntryId, created_at: DateTime<Utc>) -> AuditLogEntry {
        let NewAuditEntryDissolved { action, entity_type, entity_id, old_value, new_value, context } =
            self.dissolve();
        let AuditContextDissolved { user_id, ip_address } = context.dissolve();

        AuditLogEntry {
            id,
            action,
            entity_type,
            entity_id,
            old_value,
            new_value,
            user_id,
            ip_address,
            created_at,
        }
    }
}

/// A write-once audit record.
#[derive(Debug, Clone, PartialEq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AuditLogEntry {
    id: AuditEntryId,
    action: AuditAction,
    entity_type: AuditEntity,
    entity_id: String,
    old_value: Option<Value>,
    new_value: Option<Value>,
    user_id: Option<String>,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    /// Returns the entry id.
    pub fn id(&self) -> AuditEntryId {
        self.id
    }

    /// Returns the action.
    pub fn action(&self) -> AuditAction {
        self.action
    }

    /// Returns the entity type.
    pub fn entity_type(&self) -> AuditEntity {
        self.entity_type
    }

    /// Returns the entity id.
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Returns the snapshot before the mutation.
    pub fn old_value(&self) -> Option<&Value> {
        self.old_value.as_ref()
    }

    /// Returns the snapshot after the mutation.
    pub fn new_value(&self) -> Option<&Value> {
        self.new_value.as_ref()
    }

    /// Returns the acting user.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Returns the originating address.
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    /// Returns when the entry was appended.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

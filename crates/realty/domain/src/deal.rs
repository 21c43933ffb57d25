//! The deal aggregate and its lifecycle state machine.

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    Timestamps,
    condition::{Condition, ConditionStatus, NewCondition},
    id::{ConditionId, DealId, PropertyId},
    money::Amount,
    participant::{ParticipantRefs, ParticipantsSnapshot},
};

/// Lifecycle status of a deal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum DealStatus {
    /// Offer is being drafted.
    Draft,
    /// Offer was submitted to the seller.
    Submitted,
    /// Offer was accepted subject to conditions.
    Conditional,
    /// All conditions are resolved.
    Firm,
    /// Closing is in progress.
    Closing,
    /// The sale closed.
    Completed,
    /// The deal was called off.
    Cancelled,
    /// The offer lapsed.
    Expired,
}

impl DealStatus {
    /// Returns the statuses reachable from `self` in one transition.
    pub fn allowed_transitions(self) -> &'static [DealStatus] {
        use DealStatus::*;

        match self {
            Draft => &[Submitted, Cancelled],
            Submitted => &[Conditional, Firm, Cancelled, Expired],
            Conditional => &[Firm, Cancelled, Expired],
            Firm => &[Closing, Cancelled],
            Closing => &[Completed, Cancelled],
            Completed | Cancelled | Expired => &[],
        }
    }

    /// Returns `true` if a deal in `self` may move to `to`.
    pub fn can_transition_to(self, to: DealStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Returns `true` for statuses with no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

/// Rule violations raised by the deal aggregate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DealError {
    /// The requested status is not reachable from the current one.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: DealStatus,
        /// The requested status.
        to: DealStatus,
    },

    /// No condition with the given id exists on the deal.
    #[error("condition {0} not found")]
    ConditionNotFound(ConditionId),

    /// Deletion was attempted on a deal that is no longer a draft.
    #[error("deal in status {0} cannot be deleted, only drafts can")]
    DeleteNotAllowed(DealStatus),
}

/// One entry of the append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusHistoryEntry {
    /// The status entered.
    status: DealStatus,
    /// When the status was entered.
    timestamp: DateTime<Utc>,
    /// Optional note supplied with the transition.
    #[cfg_attr(feature = "serde", serde(default))]
    note: Option<String>,
}

impl StatusHistoryEntry {
    /// Returns the status entered.
    pub fn status(&self) -> DealStatus {
        self.status
    }

    /// Returns when the status was entered.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the transition note.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}

/// Partial update of the negotiable deal details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder, Dissolve)]
pub struct DealDetailsPatch {
    /// New offer price.
    offer_price: Option<Amount>,
    /// New closing date.
    closing_date: Option<DateTime<Utc>>,
    /// New notes.
    notes: Option<String>,
}

/// A negotiated real-estate transaction.
///
/// The deal owns its conditions and its status history. The last history entry always carries
/// the current status and history is never rewritten.
#[derive(Debug, Clone, PartialEq, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Deal {
    id: DealId,
    property_id: PropertyId,
    offer_price: Amount,
    status: DealStatus,
    participants_snapshot: ParticipantsSnapshot,
    participant_refs: ParticipantRefs,
    snapshot_timestamp: DateTime<Utc>,
    conditions: Vec<Condition>,
    closing_date: Option<DateTime<Utc>>,
    notes: Option<String>,
    status_history: Vec<StatusHistoryEntry>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    timestamps: Timestamps,
}

#[bon::bon]
impl Deal {
    /// Creates a deal in [`DealStatus::Draft`] with a single history entry.
    ///
    /// Every supplied condition gets a fresh id and starts out pending.
    #[builder]
    pub fn new(
        property_id: PropertyId,
        offer_price: Amount,
        participant_refs: ParticipantRefs,
        participants_snapshot: ParticipantsSnapshot,
        snapshot_timestamp: DateTime<Utc>,
        #[builder(default)] conditions: Vec<NewCondition>,
        closing_date: Option<DateTime<Utc>>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let conditions = conditions.into_iter().map(|c| Condition::open(c, now)).collect();

        let initial = StatusHistoryEntry::builder()
            .status(DealStatus::Draft)
            .timestamp(now)
            .build();

        Self {
            id: DealId::generate(),
            property_id,
            offer_price,
            status: DealStatus::Draft,
            participants_snapshot,
            participant_refs,
            snapshot_timestamp,
            conditions,
            closing_date,
            notes,
            status_history: vec![initial],
            timestamps: Timestamps::new_at(now),
        }
    }
}

impl Deal {
    /// Moves the deal to `to`, appending a history entry.
    ///
    /// # Errors
    ///
    /// Returns [`DealError::InvalidTransition`] if `to` is not reachable from the current
    /// status. Terminal statuses reject every transition.
    pub fn transition(
        &mut self,
        to: DealStatus,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DealError> {
        if !self.status.can_transition_to(to) {
            return Err(DealError::InvalidTransition { from: self.status, to });
        }

        self.status = to;
        self.status_history
            .push(StatusHistoryEntry::builder().status(to).timestamp(now).maybe_note(note).build());
        self.timestamps.touch(now);

        Ok(())
    }

    /// Appends a pending condition. Legal in every deal status.
    pub fn add_condition(&mut self, new_condition: NewCondition, now: DateTime<Utc>) -> ConditionId {
        let condition = Condition::open(new_condition, now);
        let id = condition.id();

        self.conditions.push(condition);
        self.timestamps.touch(now);

        id
    }

    /// Updates the status and optionally the description of one condition.
    ///
    /// # Errors
    ///
    /// Returns [`DealError::ConditionNotFound`] if the deal has no such condition.
    pub fn update_condition(
        &mut self,
        condition_id: ConditionId,
        status: ConditionStatus,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<&Condition, DealError> {
        let condition = self
            .conditions
            .iter_mut()
            .find(|c| c.id() == condition_id)
            .ok_or(DealError::ConditionNotFound(condition_id))?;

        condition.set_status(status, description, now);
        self.timestamps.touch(now);

        Ok(condition)
    }

    /// Applies a details patch, leaving status and history untouched.
    pub fn apply_details(&mut self, patch: DealDetailsPatch, now: DateTime<Utc>) {
        let DealDetailsPatchDissolved { offer_price, closing_date, notes } = patch.dissolve();

        if let Some(offer_price) = offer_price {
            self.offer_price = offer_price;
        }

        if closing_date.is_some() {
            self.closing_date = closing_date;
        }

        if notes.is_some() {
            self.notes = notes;
        }

        self.timestamps.touch(now);
    }

    /// Checks that the deal may be removed.
    ///
    /// # Errors
    ///
    /// Returns [`DealError::DeleteNotAllowed`] unless the deal is a draft.
    pub fn ensure_deletable(&self) -> Result<(), DealError> {
        match self.status {
            DealStatus::Draft => Ok(()),
            status => Err(DealError::DeleteNotAllowed(status)),
        }
    }

    /// Returns the deal id.
    pub fn id(&self) -> DealId {
        self.id
    }

    /// Returns the referenced property.
    pub fn property_id(&self) -> PropertyId {
        self.property_id
    }

    /// Returns the offer price.
    pub fn offer_price(&self) -> Amount {
        self.offer_price
    }

    /// Returns the current status.
    pub fn status(&self) -> DealStatus {
        self.status
    }

    /// Returns the frozen participant snapshot.
    pub fn participants_snapshot(&self) -> &ParticipantsSnapshot {
        &self.participants_snapshot
    }

    /// Returns the participant references used to build the snapshot.
    pub fn participant_refs(&self) -> &ParticipantRefs {
        &self.participant_refs
    }

    /// Returns when the participant snapshot was taken.
    pub fn snapshot_timestamp(&self) -> DateTime<Utc> {
        self.snapshot_timestamp
    }

    /// Returns the conditions in insertion order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns the condition with the given id.
    pub fn condition(&self, id: ConditionId) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.id() == id)
    }

    /// Returns the closing date.
    pub fn closing_date(&self) -> Option<DateTime<Utc>> {
        self.closing_date
    }

    /// Returns the notes.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the status history, oldest first.
    pub fn status_history(&self) -> &[StatusHistoryEntry] {
        &self.status_history
    }

    /// Returns the creation and update timestamps.
    pub fn timestamps(&self) -> Timestamps {
        self.timestamps
    }
}

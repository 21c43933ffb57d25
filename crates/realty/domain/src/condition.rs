//! Deal conditions (contingencies) and their status lifecycle.

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::id::ConditionId;

/// The contingency a condition tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum ConditionKind {
    /// Buyer must secure financing.
    Financing,
    /// Property must pass inspection.
    Inspection,
    /// Property must appraise at or above the offer.
    Appraisal,
    /// Buyer must sell an existing property first.
    SaleOfProperty,
    /// Any other contingency.
    Other,
}

/// Resolution status of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum ConditionStatus {
    /// Not yet resolved.
    Pending,
    /// The contingency was met.
    Satisfied,
    /// The contingency was dropped by the protected party.
    Waived,
    /// The contingency was not met.
    Failed,
}

/// The caller-supplied part of a condition.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NewCondition {
    /// What kind of contingency this is.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    kind: ConditionKind,
    /// Free-form description.
    description: String,
    /// Optional resolution deadline.
    deadline: Option<DateTime<Utc>>,
}

/// A contingency embedded in a deal.
#[derive(Debug, Clone, PartialEq, Eq, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Condition {
    id: ConditionId,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    kind: ConditionKind,
    description: String,
    deadline: Option<DateTime<Utc>>,
    status: ConditionStatus,
    satisfied_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Condition {
    /// Opens a pending condition with a fresh id.
    pub fn open(new_condition: NewCondition, now: DateTime<Utc>) -> Self {
        let NewConditionDissolved { kind, description, deadline } = new_condition.dissolve();

        Self {
            id: ConditionId::generate(),
            kind,
            description,
            deadline,
            status: ConditionStatus::Pending,
            satisfied_at: None,
            created_at: now,
        }
    }

    /// Sets the status and optionally replaces the description. An empty description is ignored.
    ///
    /// Every entry into [`ConditionStatus::Satisfied`], including a repeated one, stamps
    /// `satisfied_at` with `now`. Other statuses leave the stamp untouched.
    pub fn set_status(
        &mut self,
        status: ConditionStatus,
        description: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.status = status;

        if status == ConditionStatus::Satisfied {
            self.satisfied_at = Some(now);
        }

        if let Some(description) = description.filter(|d| !d.is_empty()) {
            self.description = description;
        }
    }

    /// Returns the condition id.
    pub fn id(&self) -> ConditionId {
        self.id
    }

    /// Returns the contingency kind.
    pub fn kind(&self) -> ConditionKind {
        self.kind
    }

    /// Returns the description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the deadline.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Returns the status.
    pub fn status(&self) -> ConditionStatus {
        self.status
    }

    /// Returns when the condition was last marked satisfied.
    pub fn satisfied_at(&self) -> Option<DateTime<Utc>> {
        self.satisfied_at
    }

    /// Returns when the condition was added.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn financing(now: DateTime<Utc>) -> Condition {
        let new_condition = NewCondition::builder()
            .kind(ConditionKind::Financing)
            .description("mortgage approval".into())
            .build();

        Condition::open(new_condition, now)
    }

    #[test]
    fn opens_pending_without_stamp() {
        let condition = financing(Utc::now());

        assert_eq!(condition.status(), ConditionStatus::Pending);
        assert_eq!(condition.satisfied_at(), None);
    }

    #[test]
    fn other_statuses_keep_the_previous_stamp() {
        let t0 = Utc::now();
        let mut condition = financing(t0);

        condition.set_status(ConditionStatus::Satisfied, None, t0);
        condition.set_status(ConditionStatus::Waived, Some("waived by buyer".into()), t0 + Duration::seconds(5));

        assert_eq!(condition.satisfied_at(), Some(t0));
        assert_eq!(condition.description(), "waived by buyer");
    }

    #[test]
    fn empty_description_keeps_the_previous_text() {
        let now = Utc::now();
        let mut condition = financing(now);

        condition.set_status(ConditionStatus::Waived, Some(String::new()), now);

        assert_eq!(condition.status(), ConditionStatus::Waived);
        assert_eq!(condition.description(), "mortgage approval");
    }

    #[test]
    fn parses_status_names() {
        assert_eq!("satisfied".parse::<ConditionStatus>().unwrap(), ConditionStatus::Satisfied);
        assert!("done".parse::<ConditionStatus>().is_err());
    }
}

//! Deal participants and their point-in-time snapshots.

use std::collections::BTreeMap;

use bon::Builder;
use dissolve_derive::Dissolve;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Marker stored on a snapshot entry whose user could not be resolved.
pub const USER_NOT_FOUND_AT_SNAPSHOT: &str = "User not found at snapshot time";

/// Name recorded for a participant whose user could not be resolved.
pub const UNKNOWN_PARTICIPANT_NAME: &str = "Unknown";

/// The part a user plays in a deal. Users carry the same set as their account role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum Role {
    /// The purchasing party.
    Buyer,
    /// The selling party.
    Seller,
    /// The agent representing the buyer.
    BuyerAgent,
    /// The agent representing the seller.
    SellerAgent,
    /// The lawyer representing the buyer.
    BuyerLawyer,
    /// The lawyer representing the seller.
    SellerLawyer,
}

impl Role {
    /// Returns `true` for the two agent roles.
    pub fn is_agent(self) -> bool {
        matches!(self, Role::BuyerAgent | Role::SellerAgent)
    }

    /// Returns `true` for the two lawyer roles.
    pub fn is_lawyer(self) -> bool {
        matches!(self, Role::BuyerLawyer | Role::SellerLawyer)
    }
}

/// Role to user reference map supplied at deal creation. Absent roles are simply omitted.
pub type ParticipantRefs = BTreeMap<Role, UserId>;

/// Role to snapshot map frozen at deal creation.
pub type ParticipantsSnapshot = BTreeMap<Role, ParticipantSnapshot>;

/// A user record as read from the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UserRecord {
    /// The user id.
    id: UserId,
    /// Contact email.
    email: String,
    /// The account role of the user.
    role: Role,
    /// Display name, if the profile has one.
    name: Option<String>,
    /// Contact phone, if the profile has one.
    phone: Option<String>,
    /// Agent license number.
    license_number: Option<String>,
    /// Agent brokerage.
    brokerage: Option<String>,
    /// Lawyer bar registration number.
    bar_number: Option<String>,
    /// Lawyer firm.
    law_firm: Option<String>,
}

impl UserRecord {
    /// Returns the user id.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the account role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the contact email.
    pub fn email(&self) -> &str {
        &self.email
    }
}

/// A participant captured as it existed when the deal was created.
///
/// The entry is never refreshed afterwards, it is a legal record of who was party to the deal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum ParticipantSnapshot {
    /// The user was found and copied.
    Resolved(ResolvedParticipant),
    /// The user reference could not be resolved.
    Unresolved(UnresolvedParticipant),
}

/// A fully populated snapshot entry.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolvedParticipant {
    user_id: UserId,
    name: String,
    email: String,
    #[cfg_attr(feature = "serde", serde(default))]
    phone: Option<String>,
    role_type: Role,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    license_number: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    brokerage: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    bar_number: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    law_firm: Option<String>,
}

/// A degraded snapshot entry carrying an error marker.
#[derive(Debug, Clone, PartialEq, Eq, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnresolvedParticipant {
    user_id: UserId,
    name: String,
    error: String,
}

impl ParticipantSnapshot {
    /// Copies the fields of `user` that belong in a snapshot.
    ///
    /// Agent fields are copied for agents and bar fields for lawyers, based on the user's own
    /// account role.
    pub fn capture(user: &UserRecord) -> Self {
        let role = user.role;

        let entry = ResolvedParticipant::builder()
            .user_id(user.id)
            .name(user.name.clone().unwrap_or_else(|| UNKNOWN_PARTICIPANT_NAME.to_owned()))
            .email(user.email.clone())
            .maybe_phone(user.phone.clone())
            .role_type(role)
            .maybe_license_number(user.license_number.clone().filter(|_| role.is_agent()))
            .maybe_brokerage(user.brokerage.clone().filter(|_| role.is_agent()))
            .maybe_bar_number(user.bar_number.clone().filter(|_| role.is_lawyer()))
            .maybe_law_firm(user.law_firm.clone().filter(|_| role.is_lawyer()))
            .build();

        Self::Resolved(entry)
    }

    /// Builds the degraded entry for a user id that did not resolve.
    pub fn missing(user_id: UserId) -> Self {
        Self::Unresolved(UnresolvedParticipant {
            user_id,
            name: UNKNOWN_PARTICIPANT_NAME.to_owned(),
            error: USER_NOT_FOUND_AT_SNAPSHOT.to_owned(),
        })
    }

    /// Returns the referenced user id.
    pub fn user_id(&self) -> UserId {
        match self {
            Self::Resolved(entry) => entry.user_id,
            Self::Unresolved(entry) => entry.user_id,
        }
    }

    /// Returns the captured name, `"Unknown"` for unresolved entries.
    pub fn name(&self) -> &str {
        match self {
            Self::Resolved(entry) => &entry.name,
            Self::Unresolved(entry) => &entry.name,
        }
    }

    /// Returns the error marker of an unresolved entry.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Resolved(_) => None,
            Self::Unresolved(entry) => Some(&entry.error),
        }
    }

    /// Returns the resolved entry, if any.
    pub fn as_resolved(&self) -> Option<&ResolvedParticipant> {
        match self {
            Self::Resolved(entry) => Some(entry),
            Self::Unresolved(_) => None,
        }
    }
}

impl ResolvedParticipant {
    /// Returns the captured email.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the captured phone.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Returns the account role the user had at capture time.
    pub fn role_type(&self) -> Role {
        self.role_type
    }

    /// Returns the captured license number.
    pub fn license_number(&self) -> Option<&str> {
        self.license_number.as_deref()
    }

    /// Returns the captured brokerage.
    pub fn brokerage(&self) -> Option<&str> {
        self.brokerage.as_deref()
    }

    /// Returns the captured bar number.
    pub fn bar_number(&self) -> Option<&str> {
        self.bar_number.as_deref()
    }

    /// Returns the captured law firm.
    pub fn law_firm(&self) -> Option<&str> {
        self.law_firm.as_deref()
    }
}

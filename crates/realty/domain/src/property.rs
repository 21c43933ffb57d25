//! Property listing status and the commands deals send towards it.

use strum::{Display, EnumString, IntoStaticStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::id::PropertyId;

/// Listing status of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum PropertyStatus {
    /// Listed and open to offers.
    Active,
    /// Under an accepted offer.
    Pending,
    /// The sale closed.
    Sold,
    /// Taken off the market.
    Withdrawn,
}

/// A cross-store update emitted by the deal lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyCommand {
    /// The deal on this property completed.
    MarkSold {
        /// The property to mark.
        property_id: PropertyId,
    },
}

impl PropertyCommand {
    /// Returns the property the command targets.
    pub fn property_id(&self) -> PropertyId {
        match self {
            Self::MarkSold { property_id } => *property_id,
        }
    }

    /// Returns the status the command sets.
    pub fn target_status(&self) -> PropertyStatus {
        match self {
            Self::MarkSold { .. } => PropertyStatus::Sold,
        }
    }
}

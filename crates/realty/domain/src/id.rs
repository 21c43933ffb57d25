//! Identifiers for document-store entities.
//!
//! Deals, properties, users and conditions are keyed by a 12-byte object id rendered as 24
//! lowercase hex characters. The byte layout is a 4-byte big-endian unix timestamp, 5 bytes of
//! per-process randomness and a 3-byte big-endian counter, so ids sort roughly by creation time.

use core::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU32, Ordering},
};

use std::sync::OnceLock;

use chrono::Utc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors returned when parsing an [`ObjectId`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectIdError {
    /// The input is not exactly 24 characters long.
    #[error("object id must be 24 hex characters, got {0}")]
    InvalidLength(usize),

    /// The input contains characters outside `[0-9a-f]`.
    #[error("object id must be lowercase hex")]
    InvalidHex,
}

/// A 12-byte document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(into = "String", try_from = "String"))]
pub struct ObjectId([u8; 12]);

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();

static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

impl ObjectId {
    /// The length of the textual form.
    pub const HEX_LEN: usize = 24;

    /// Generates a fresh object id.
    pub fn new() -> Self {
        let timestamp = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
        let process = PROCESS_UNIQUE.get_or_init(rand::random);
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::random::<u32>() & 0x00ff_ffff))
            .fetch_add(1, Ordering::Relaxed)
            & 0x00ff_ffff;

        let mut bz = [0u8; 12];
        bz[..4].copy_from_slice(&timestamp.to_be_bytes());
        bz[4..9].copy_from_slice(process);
        bz[9..].copy_from_slice(&counter.to_be_bytes()[1..]);

        Self(bz)
    }

    /// Returns the raw bytes.
    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[u8; 12]> for ObjectId {
    fn from(bz: [u8; 12]) -> Self {
        Self(bz)
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::HEX_LEN {
            return Err(ObjectIdError::InvalidLength(s.len()));
        }

        if !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            return Err(ObjectIdError::InvalidHex);
        }

        let mut bz = [0u8; 12];
        const_hex::decode_to_slice(s, &mut bz).map_err(|_| ObjectIdError::InvalidHex)?;

        Ok(Self(bz))
    }
}

impl TryFrom<String> for ObjectId {
    type Error = ObjectIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&const_hex::encode(self.0))
    }
}

macro_rules! object_id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
        pub struct $name(ObjectId);

        impl $name {
            /// Generates a fresh identifier.
            pub fn generate() -> Self {
                Self(ObjectId::new())
            }
        }

        impl From<ObjectId> for $name {
            fn from(id: ObjectId) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ObjectId {
            fn from($name(id): $name) -> Self {
                id
            }
        }

        impl FromStr for $name {
            type Err = ObjectIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

object_id_newtype!(
    /// Identifies a deal document.
    DealId
);

object_id_newtype!(
    /// Identifies a property document.
    PropertyId
);

object_id_newtype!(
    /// Identifies a user document.
    UserId
);

object_id_newtype!(
    /// Identifies a condition inside its owning deal.
    ConditionId
);

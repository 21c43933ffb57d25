//! Domain types for the realty transaction backend.
//!
//! This crate holds the deal lifecycle model and the trust-account ledger model. Every rule
//! that can be decided without touching a store lives here: the deal status transition table,
//! condition status stamping, the draft-only delete rule, balance sufficiency and exact
//! fixed-point money arithmetic.
//!
//! Persistence and orchestration live in `realty-engine` and `realty-store`.

pub mod audit;
pub mod condition;
pub mod deal;
pub mod id;
pub mod ledger;
pub mod money;
pub mod participant;
pub mod property;

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Timestamp metadata for tracking entity creation and modification times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timestamps {
    /// The timestamp when the entity was created.
    created_at: DateTime<Utc>,
    /// The timestamp when the entity was last updated.
    updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Creates timestamps for an entity that was created at `now`.
    pub fn new_at(now: DateTime<Utc>) -> Self {
        Self { created_at: now, updated_at: now }
    }

    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the last update timestamp to `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

//! Orchestration for the realty transaction backend.
//!
//! The crate hosts the four components that sit between the request layer and the stores:
//!
//! - [`SnapshotBuilder`] freezes participant records at deal creation.
//! - [`DealEngine`] runs the deal state machine and tracks conditions.
//! - [`TrustLedger`] keeps trust-account balances, transactions and the audit log.
//! - [`property_sync`] delivers property updates triggered by completed deals.
//!
//! Stores are reached only through the traits in [`port`], handed to each component at
//! construction.

pub mod port;
pub mod property_sync;

mod deal;
mod error;
mod ledger;
mod snapshot;
mod types;

pub use self::{
    deal::DealEngine,
    error::{DealEngineError, LedgerError},
    ledger::TrustLedger,
    snapshot::SnapshotBuilder,
    types::{request, response},
};

//! Test utilities for the realty workspace.
//!
//! This crate provides in-memory implementations of every port defined in
//! `realty_engine::port`, plus fixtures for users and money. The adapters honor the same
//! atomicity contracts as the PostgreSQL stores and support fault injection, so engine and
//! server tests can exercise rollback paths without a database.

pub mod fixtures;

mod deals;
mod directory;
mod ledger;

pub use self::{
    deals::InMemoryDealRepository,
    directory::{InMemoryPropertyDirectory, InMemoryUserDirectory, RecordingPropertySync},
    ledger::InMemoryLedger,
};

use realty_engine::port::Page;

// HELPERS
// ================================================================================================

/// Clones one page out of `rows`, which must already be in listing order. Returns the page and
/// the total number of rows. `None` returns every row.
fn paginate<'a, T, I>(rows: I, page: Option<Page>) -> (Vec<T>, u64)
where
    T: Clone + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let rows: Vec<&T> = rows.into_iter().collect();
    let total = rows.len() as u64;

    let items = match page {
        Some(page) => rows
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect(),
        None => rows.into_iter().cloned().collect(),
    };

    (items, total)
}

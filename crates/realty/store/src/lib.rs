//! PostgreSQL persistence for the realty deal engine and trust ledger.
//!
//! Two adapters implement the engine's outbound ports:
//!
//! - [`DocumentStore`] keeps deals as JSONB documents next to the user and property records they
//!   refer to, and implements `DealRepository`, `UserDirectory` and `PropertyDirectory`.
//! - [`LedgerStore`] keeps trust accounts, transactions and the audit log in relational tables,
//!   and implements `LedgerRepository`.
//!
//! Both run on [diesel](https://diesel.rs) with async connections drawn from a deadpool pool.
//! They may share a database or live in two, the composition root decides by handing each its
//! own [`DbPool`]. The schema lives in this crate's `migrations/` directory.
//!
//! # Usage
//!
//! ```ignore
//! let documents = DocumentStore::new(establish_pool(documents_url, max_size).await?);
//! let ledger = LedgerStore::new(establish_pool(ledger_url, max_size).await?);
//!
//! let deal = documents.get_deal(deal_id).await?;
//! let accounts = ledger.list_accounts().await?;
//! ```

mod document;
mod error;
mod ledger;
mod persistence;

pub use self::{
    document::DocumentStore,
    error::RealtyStoreError,
    ledger::LedgerStore,
    persistence::pool::{DbConn, DbPool, PoolError, establish_pool},
};

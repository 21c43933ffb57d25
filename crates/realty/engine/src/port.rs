//! Outbound ports.
//!
//! These traits are everything the engine needs from the outside world. The PostgreSQL
//! adapters live in `realty-store` and in-memory adapters for tests live in
//! `realty-test-utils`. Each component receives its ports at construction, the composition
//! root owns their lifecycle.

mod error;

pub use self::error::{LedgerRepositoryError, PropertySyncError, RepositoryError};

use core::num::NonZeroU32;

use async_trait::async_trait;
use realty_domain::{
    audit::{AuditEntity, AuditLogEntry, NewAuditEntry},
    deal::{Deal, DealError, DealStatus},
    id::{DealId, PropertyId, UserId},
    ledger::{
        AccountId, AccountPatch, NewTransaction, NewTrustAccount, Transaction, TransactionId,
        TransactionType, TrustAccount,
    },
    money::Balance,
    participant::UserRecord,
    property::{PropertyCommand, PropertyStatus},
};

/// A rule applied to a deal document inside the repository's atomic update.
pub type DealMutation = Box<dyn FnOnce(&mut Deal) -> Result<(), DealError> + Send>;

/// Builds the audit entry for a freshly inserted row once its id is known.
pub type AuditFn<T> = Box<dyn FnOnce(&T) -> NewAuditEntry + Send>;

/// Builds the audit entry for an update from the row before and after.
pub type AuditDiffFn<T> = Box<dyn FnOnce(&T, &T) -> NewAuditEntry + Send>;

/// Result of an atomic deal mutation.
#[derive(Debug)]
pub enum DealMutationOutcome {
    /// The rule accepted the change and the updated deal was written.
    Applied(Deal),
    /// The rule rejected the change, nothing was written.
    Rejected(DealError),
    /// No deal with the given id exists.
    NotFound,
}

/// Result of a conditional delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The draft deal was removed.
    Deleted,
    /// The deal exists but is past draft, nothing was removed.
    NotDraft(DealStatus),
    /// No deal with the given id exists.
    NotFound,
}

/// One page of a listing. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    page: NonZeroU32,
    page_size: NonZeroU32,
}

impl Page {
    /// Largest accepted page size.
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Creates a page, or `None` when `page` is zero or `page_size` is outside `1..=100`.
    pub fn new(page: u32, page_size: u32) -> Option<Self> {
        if page_size > Self::MAX_PAGE_SIZE {
            return None;
        }

        Some(Self { page: NonZeroU32::new(page)?, page_size: NonZeroU32::new(page_size)? })
    }

    /// Returns the 1-based page number.
    pub fn page(&self) -> u32 {
        self.page.get()
    }

    /// Returns the page size.
    pub fn page_size(&self) -> u32 {
        self.page_size.get()
    }

    /// Returns the number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.get() - 1) * u64::from(self.page_size.get())
    }

    /// Returns the number of rows to take.
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size.get())
    }
}

/// Deal listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealFilter {
    /// Only deals in this status.
    pub status: Option<DealStatus>,
    /// Only deals on this property.
    pub property_id: Option<PropertyId>,
}

/// Transaction listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only transactions tagged to this deal.
    pub deal_id: Option<DealId>,
    /// Only transactions of this type.
    pub transaction_type: Option<TransactionType>,
}

/// Audit log listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    /// Only entries about this kind of entity.
    pub entity_type: Option<AuditEntity>,
    /// Only entries about this entity id.
    pub entity_id: Option<String>,
}

/// Read access to user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Looks up a user, `None` if no such user exists.
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, RepositoryError>;
}

/// Write access to property listing status.
#[async_trait]
pub trait PropertyDirectory: Send + Sync {
    /// Sets the status of a property. Returns `false` if no such property exists.
    async fn set_status(
        &self,
        id: PropertyId,
        status: PropertyStatus,
    ) -> Result<bool, RepositoryError>;
}

/// Outbound channel for cross-store property updates.
///
/// Dispatch never blocks the caller. Delivery is best-effort and failures are handled on the
/// collaborator side.
pub trait PropertySync: Send + Sync {
    /// Hands a command over for delivery.
    fn dispatch(&self, command: PropertyCommand) -> Result<(), PropertySyncError>;
}

/// Document persistence for deals.
///
/// Every mutation is atomic on the whole deal document.
#[async_trait]
pub trait DealRepository: Send + Sync {
    /// Stores a new deal.
    async fn insert(&self, deal: &Deal) -> Result<(), RepositoryError>;

    /// Loads a deal.
    async fn find(&self, id: DealId) -> Result<Option<Deal>, RepositoryError>;

    /// Lists deals newest first, with the total number of matches.
    async fn list(
        &self,
        filter: &DealFilter,
        page: Page,
    ) -> Result<(Vec<Deal>, u64), RepositoryError>;

    /// Applies `mutation` to the current document and writes the result back atomically.
    async fn mutate(
        &self,
        id: DealId,
        mutation: DealMutation,
    ) -> Result<DealMutationOutcome, RepositoryError>;

    /// Removes the deal only if it is still a draft.
    async fn delete_draft(&self, id: DealId) -> Result<DeleteOutcome, RepositoryError>;
}

/// Relational persistence for the trust ledger.
///
/// Every write that carries an audit entry commits the row and the entry together or not at
/// all.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Inserts an account and its creation audit entry.
    async fn insert_account(
        &self,
        account: NewTrustAccount,
        audit: AuditFn<TrustAccount>,
    ) -> Result<TrustAccount, LedgerRepositoryError>;

    /// Loads an account by id.
    async fn find_account(
        &self,
        id: AccountId,
    ) -> Result<Option<TrustAccount>, LedgerRepositoryError>;

    /// Loads an account by its unique number.
    async fn find_account_by_number(
        &self,
        account_number: &str,
    ) -> Result<Option<TrustAccount>, LedgerRepositoryError>;

    /// Lists all accounts newest first.
    async fn list_accounts(&self) -> Result<Vec<TrustAccount>, LedgerRepositoryError>;

    /// Applies a holder/status patch and its audit entry. `None` if no such account exists.
    async fn update_account(
        &self,
        id: AccountId,
        patch: AccountPatch,
        audit: AuditDiffFn<TrustAccount>,
    ) -> Result<Option<TrustAccount>, LedgerRepositoryError>;

    /// Replaces the balance with `new` if the account is active and still holds `expected`.
    ///
    /// Returns `None` when the precondition no longer holds, nothing is written in that case.
    async fn swap_balance(
        &self,
        id: AccountId,
        expected: Balance,
        new: Balance,
        audit: NewAuditEntry,
    ) -> Result<Option<TrustAccount>, LedgerRepositoryError>;

    /// Inserts an immutable transaction and its audit entry.
    async fn insert_transaction(
        &self,
        transaction: NewTransaction,
        audit: AuditFn<Transaction>,
    ) -> Result<Transaction, LedgerRepositoryError>;

    /// Loads a transaction.
    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerRepositoryError>;

    /// Lists transactions newest first, with the total number of matches. `None` returns every
    /// match.
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: Option<Page>,
    ) -> Result<(Vec<Transaction>, u64), LedgerRepositoryError>;

    /// Lists audit entries newest first, with the total number of matches.
    async fn list_audit(
        &self,
        filter: &AuditFilter,
        page: Page,
    ) -> Result<(Vec<AuditLogEntry>, u64), LedgerRepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds() {
        assert_eq!(Page::new(0, 10), None);
        assert_eq!(Page::new(1, 0), None);
        assert_eq!(Page::new(1, 101), None);
        assert_eq!(Page::new(3, 20).map(|p| (p.offset(), p.limit())), Some((40, 20)));
    }
}

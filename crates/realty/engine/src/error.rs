use std::borrow::Cow;

use realty_domain::{
    deal::{DealError, DealStatus},
    id::{ConditionId, DealId},
    ledger::{AccountId, AccountStatus, BalanceError, TransactionId},
    money::{Amount, Balance, MoneyError},
};

use crate::port::{LedgerRepositoryError, RepositoryError};

/// Failures of deal lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum DealEngineError {
    /// The deal does not exist.
    #[error("deal {0} not found")]
    NotFound(DealId),

    /// The requested status is not reachable from the current one.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: DealStatus,
        /// The requested status.
        to: DealStatus,
    },

    /// The condition does not exist on the deal.
    #[error("condition {0} not found")]
    ConditionNotFound(ConditionId),

    /// Only draft deals can be deleted.
    #[error("deal in status {0} cannot be deleted")]
    DeleteNotAllowed(DealStatus),

    /// The document store failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<DealError> for DealEngineError {
    fn from(err: DealError) -> Self {
        match err {
            DealError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            DealError::ConditionNotFound(id) => Self::ConditionNotFound(id),
            DealError::DeleteNotAllowed(status) => Self::DeleteNotAllowed(status),
        }
    }
}

/// Failures of trust ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The account number is already taken.
    #[error("account number {0} already exists")]
    DuplicateAccount(String),

    /// The account does not exist.
    #[error("trust account {0} not found")]
    AccountNotFound(AccountId),

    /// The account is frozen or closed.
    #[error("cannot update balance on {0} account")]
    AccountNotActive(AccountStatus),

    /// A debit exceeds the available balance.
    #[error("insufficient balance: {balance} available, {requested} requested")]
    InsufficientBalance {
        /// The current balance.
        balance: Balance,
        /// The requested debit.
        requested: Amount,
    },

    /// The transaction does not exist.
    #[error("transaction {0} not found")]
    TransactionNotFound(TransactionId),

    /// The paired audit entry failed and the financial write was rolled back.
    #[error("audit write failed: {0}")]
    AuditWriteFailed(Cow<'static, str>),

    /// The account changed between read and write.
    #[error("trust account {0} was modified concurrently")]
    ConcurrentModification(AccountId),

    /// Balance arithmetic left the decimal range.
    #[error("balance arithmetic error: {0}")]
    Arithmetic(#[from] MoneyError),

    /// The ledger store failed.
    #[error("repository error: {0}")]
    Repository(LedgerRepositoryError),
}

impl From<LedgerRepositoryError> for LedgerError {
    fn from(err: LedgerRepositoryError) -> Self {
        match err {
            LedgerRepositoryError::DuplicateAccountNumber(number) => Self::DuplicateAccount(number),
            LedgerRepositoryError::AuditAppend(reason) => Self::AuditWriteFailed(reason),
            err => Self::Repository(err),
        }
    }
}

impl From<BalanceError> for LedgerError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::AccountNotActive(status) => Self::AccountNotActive(status),
            BalanceError::InsufficientBalance { balance, requested } => {
                Self::InsufficientBalance { balance, requested }
            },
            BalanceError::Arithmetic(err) => Self::Arithmetic(err),
        }
    }
}

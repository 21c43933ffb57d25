use std::borrow::Cow;

use realty_engine::port::{LedgerRepositoryError, RepositoryError};

use crate::persistence::store::StoreError;

pub type Result<T, E = RealtyStoreError> = core::result::Result<T, E>;

/// Errors that can occur when interacting with the document or ledger store.
#[derive(Debug, thiserror::Error)]
pub enum RealtyStoreError {
    /// A query or statement failed.
    #[error("database error: {0}")]
    Store(#[from] StoreError),

    /// No connection could be checked out of the pool.
    #[error("pool error")]
    Pool,

    /// A stored document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(Cow<'static, str>),

    /// A stored column holds a value the domain rejects.
    #[error("invalid value error: {0}")]
    InvalidValue(Cow<'static, str>),

    /// The account number is already taken.
    #[error("account number {0} already exists")]
    DuplicateAccountNumber(String),

    /// The audit entry paired with a write failed, the write was rolled back.
    #[error("audit append error: {0}")]
    AuditAppend(StoreError),
}

impl RealtyStoreError {
    pub(crate) fn invalid_value<E>(err: E) -> Self
    where
        E: ToString,
    {
        Self::InvalidValue(err.to_string().into())
    }
}

impl From<diesel::result::Error> for RealtyStoreError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Store(StoreError::Db(err))
    }
}

impl From<serde_json::Error> for RealtyStoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string().into())
    }
}

impl From<RealtyStoreError> for RepositoryError {
    fn from(err: RealtyStoreError) -> Self {
        match err {
            RealtyStoreError::Serialization(e) | RealtyStoreError::InvalidValue(e) => {
                RepositoryError::corrupted(e)
            },
            err => RepositoryError::backend(err.to_string()),
        }
    }
}

impl From<RealtyStoreError> for LedgerRepositoryError {
    fn from(err: RealtyStoreError) -> Self {
        match err {
            RealtyStoreError::DuplicateAccountNumber(number) => {
                LedgerRepositoryError::DuplicateAccountNumber(number)
            },
            RealtyStoreError::AuditAppend(e) => LedgerRepositoryError::audit_append(e.to_string()),
            RealtyStoreError::Serialization(e) | RealtyStoreError::InvalidValue(e) => {
                LedgerRepositoryError::corrupted(e)
            },
            err => LedgerRepositoryError::backend(err.to_string()),
        }
    }
}

use std::borrow::Cow;

/// Errors reported by document-store adapters.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The backing store failed or is unreachable.
    #[error("backend error: {0}")]
    Backend(Cow<'static, str>),

    /// A stored document could not be decoded.
    #[error("corrupted document: {0}")]
    Corrupted(Cow<'static, str>),
}

impl RepositoryError {
    /// Creates a `Backend` error.
    pub fn backend<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Backend(err.into())
    }

    /// Creates a `Corrupted` error.
    pub fn corrupted<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Corrupted(err.into())
    }
}

/// Errors reported by ledger adapters.
#[derive(Debug, thiserror::Error)]
pub enum LedgerRepositoryError {
    /// The account number is already taken.
    #[error("account number {0} already exists")]
    DuplicateAccountNumber(String),

    /// The paired audit entry could not be appended, the write was rolled back.
    #[error("audit append failed: {0}")]
    AuditAppend(Cow<'static, str>),

    /// The backing store failed or is unreachable.
    #[error("backend error: {0}")]
    Backend(Cow<'static, str>),

    /// A stored row could not be decoded.
    #[error("corrupted row: {0}")]
    Corrupted(Cow<'static, str>),
}

impl LedgerRepositoryError {
    /// Creates an `AuditAppend` error.
    pub fn audit_append<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::AuditAppend(err.into())
    }

    /// Creates a `Backend` error.
    pub fn backend<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Backend(err.into())
    }

    /// Creates a `Corrupted` error.
    pub fn corrupted<E>(err: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::Corrupted(err.into())
    }
}

/// Errors reported when handing a property command over.
#[derive(Debug, thiserror::Error)]
pub enum PropertySyncError {
    /// The outbound queue is full.
    #[error("property sync queue is full")]
    Full,

    /// The receiving side has shut down.
    #[error("property sync is closed")]
    Closed,

    /// Delivery failed for another reason.
    #[error("property sync error: {0}")]
    Other(Cow<'static, str>),
}

use std::borrow::Cow;

use realty_domain::money::MoneyError;

/// Errors raised while validating a request before it reaches the engine.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The offer price is not a positive cent amount.
    #[error("invalid offer price: {0}")]
    InvalidOfferPrice(MoneyError),

    /// The amount is not a positive cent amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(MoneyError),

    /// The opening balance is negative or finer than a cent.
    #[error("invalid initial balance: {0}")]
    InvalidBalance(MoneyError),

    /// The condition status is not one of pending, satisfied, waived, failed.
    #[error("invalid condition status: {0}")]
    InvalidConditionStatus(String),

    /// The deal status is not a known lifecycle status.
    #[error("invalid deal status: {0}")]
    InvalidDealStatus(String),

    /// The page number is zero or the page size is outside `1..=100`.
    #[error("invalid page {page} with page size {page_size}")]
    InvalidPage {
        /// Requested page.
        page: u32,
        /// Requested page size.
        page_size: u32,
    },

    /// A text field violates its length bounds.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The field name.
        field: &'static str,
        /// What is wrong with it.
        reason: Cow<'static, str>,
    },
}

impl RequestError {
    pub(crate) fn invalid_field<E>(field: &'static str, reason: E) -> Self
    where
        Cow<'static, str>: From<E>,
    {
        Self::InvalidField { field, reason: reason.into() }
    }
}

//! Request types for engine operations.
//!
//! Requests that carry business-relevant primitives validate them in their builder, so an
//! engine method never sees a non-positive price, an unknown condition status or an
//! out-of-range page.

mod error;

pub use self::error::RequestError;

use core::ops::RangeInclusive;

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use realty_domain::{
    audit::{AuditContext, AuditEntity},
    condition::{ConditionStatus, NewCondition},
    deal::{DealDetailsPatch, DealStatus},
    id::{ConditionId, DealId, PropertyId},
    ledger::{AccountId, AccountPatch, AccountStatus, BalanceDirection, TransactionStatus, TransactionType},
    money::{Amount, Balance},
    participant::ParticipantRefs,
};
use rust_decimal::Decimal;

use crate::port::{AuditFilter, DealFilter, Page, TransactionFilter};

const DEFAULT_PAGE_SIZE: u32 = 10;

const DEFAULT_AUDIT_PAGE_SIZE: u32 = 50;

const ACCOUNT_NUMBER_LEN: RangeInclusive<usize> = 5..=50;

const HOLDER_NAME_LEN: RangeInclusive<usize> = 1..=100;

/// Request to open a new deal in draft.
#[derive(Debug, Dissolve)]
pub struct CreateDealRequest {
    property_id: PropertyId,
    offer_price: Amount,
    participants: ParticipantRefs,
    conditions: Vec<NewCondition>,
    closing_date: Option<DateTime<Utc>>,
    notes: Option<String>,
}

/// Request to move a deal to another lifecycle status.
#[derive(Debug, Dissolve)]
pub struct TransitionDealRequest {
    deal_id: DealId,
    status: DealStatus,
    note: Option<String>,
}

/// Request to patch the negotiable details of a deal.
#[derive(Debug, Dissolve)]
pub struct UpdateDealRequest {
    deal_id: DealId,
    patch: DealDetailsPatch,
}

/// Request to list deals.
#[derive(Debug, Dissolve)]
pub struct ListDealsRequest {
    filter: DealFilter,
    page: Page,
}

/// Request to append a condition to a deal.
#[derive(Debug, Builder, Dissolve)]
pub struct AddConditionRequest {
    /// The deal to extend.
    deal_id: DealId,
    /// The condition to append.
    condition: NewCondition,
}

/// Request to change the status of one condition.
#[derive(Debug, Dissolve)]
pub struct UpdateConditionRequest {
    deal_id: DealId,
    condition_id: ConditionId,
    status: ConditionStatus,
    description: Option<String>,
}

/// Request to open a trust account.
#[derive(Debug, Dissolve)]
pub struct CreateAccountRequest {
    account_number: String,
    holder_name: String,
    initial_balance: Balance,
    context: AuditContext,
}

/// Request to change the holder or status of a trust account.
#[derive(Debug, Dissolve)]
pub struct UpdateAccountRequest {
    account_id: AccountId,
    patch: AccountPatch,
    context: AuditContext,
}

/// Request to credit or debit a trust account.
#[derive(Debug, Dissolve)]
pub struct UpdateBalanceRequest {
    account_id: AccountId,
    amount: Amount,
    direction: BalanceDirection,
    context: AuditContext,
}

/// Request to record a transaction against a deal.
#[derive(Debug, Dissolve)]
pub struct RecordTransactionRequest {
    deal_id: DealId,
    amount: Amount,
    transaction_type: TransactionType,
    status: TransactionStatus,
    from_account: Option<String>,
    to_account: Option<String>,
    description: Option<String>,
    context: AuditContext,
}

/// Request to list transactions.
#[derive(Debug, Dissolve)]
pub struct ListTransactionsRequest {
    filter: TransactionFilter,
    page: Page,
}

/// Request to read the audit log.
#[derive(Debug, Dissolve)]
pub struct AuditLogRequest {
    filter: AuditFilter,
    page: Page,
}

fn make_page(page: u32, page_size: u32) -> Result<Page, RequestError> {
    Page::new(page, page_size).ok_or(RequestError::InvalidPage { page, page_size })
}

fn check_len(
    field: &'static str,
    value: &str,
    bounds: RangeInclusive<usize>,
) -> Result<(), RequestError> {
    let len = value.chars().count();

    if !bounds.contains(&len) {
        return Err(RequestError::invalid_field(
            field,
            format!("length must be between {} and {}, got {len}", bounds.start(), bounds.end()),
        ));
    }

    Ok(())
}

#[bon::bon]
impl CreateDealRequest {
    /// Creates a deal creation request. The offer price must be a positive cent amount.
    #[builder]
    pub fn new(
        property_id: PropertyId,
        offer_price: Decimal,
        #[builder(default)] participants: ParticipantRefs,
        #[builder(default)] conditions: Vec<NewCondition>,
        closing_date: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> Result<Self, RequestError> {
        let offer_price = Amount::new(offer_price).map_err(RequestError::InvalidOfferPrice)?;

        Ok(Self { property_id, offer_price, participants, conditions, closing_date, notes })
    }
}

#[bon::bon]
impl TransitionDealRequest {
    /// Creates a transition request, parsing the target status by name.
    #[builder]
    pub fn new(
        deal_id: DealId,
        #[builder(into)] status: String,
        note: Option<String>,
    ) -> Result<Self, RequestError> {
        let status = status.parse().map_err(|_| RequestError::InvalidDealStatus(status))?;

        Ok(Self { deal_id, status, note })
    }
}

#[bon::bon]
impl UpdateDealRequest {
    /// Creates a details patch. A supplied offer price must be a positive cent amount.
    #[builder]
    pub fn new(
        deal_id: DealId,
        offer_price: Option<Decimal>,
        closing_date: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> Result<Self, RequestError> {
        let offer_price = offer_price
            .map(Amount::new)
            .transpose()
            .map_err(RequestError::InvalidOfferPrice)?;

        let patch = DealDetailsPatch::builder()
            .maybe_offer_price(offer_price)
            .maybe_closing_date(closing_date)
            .maybe_notes(notes)
            .build();

        Ok(Self { deal_id, patch })
    }
}

#[bon::bon]
impl ListDealsRequest {
    /// Creates a listing request. Pages are 1-based, 10 deals per page by default.
    #[builder]
    pub fn new(
        status: Option<DealStatus>,
        property_id: Option<PropertyId>,
        #[builder(default = 1)] page: u32,
        #[builder(default = DEFAULT_PAGE_SIZE)] page_size: u32,
    ) -> Result<Self, RequestError> {
        let page = make_page(page, page_size)?;

        Ok(Self { filter: DealFilter { status, property_id }, page })
    }
}

#[bon::bon]
impl UpdateConditionRequest {
    /// Creates a condition update, parsing the status by name.
    ///
    /// Fails with [`RequestError::InvalidConditionStatus`] for anything outside the condition
    /// status set.
    #[builder]
    pub fn new(
        deal_id: DealId,
        condition_id: ConditionId,
        #[builder(into)] status: String,
        description: Option<String>,
    ) -> Result<Self, RequestError> {
        let status = status.parse().map_err(|_| RequestError::InvalidConditionStatus(status))?;

        Ok(Self { deal_id, condition_id, status, description })
    }
}

#[bon::bon]
impl CreateAccountRequest {
    /// Creates an account opening request.
    ///
    /// The account number must be 5 to 50 characters, the holder name 1 to 100 and the
    /// opening balance non-negative.
    #[builder]
    pub fn new(
        #[builder(into)] account_number: String,
        #[builder(into)] holder_name: String,
        #[builder(default)] initial_balance: Decimal,
        #[builder(default)] context: AuditContext,
    ) -> Result<Self, RequestError> {
        check_len("account_number", &account_number, ACCOUNT_NUMBER_LEN)?;
        check_len("holder_name", &holder_name, HOLDER_NAME_LEN)?;

        let initial_balance = Balance::new(initial_balance).map_err(RequestError::InvalidBalance)?;

        Ok(Self { account_number, holder_name, initial_balance, context })
    }
}

#[bon::bon]
impl UpdateAccountRequest {
    /// Creates an account patch. A supplied holder name must be 1 to 100 characters.
    #[builder]
    pub fn new(
        account_id: AccountId,
        holder_name: Option<String>,
        status: Option<AccountStatus>,
        #[builder(default)] context: AuditContext,
    ) -> Result<Self, RequestError> {
        if let Some(holder_name) = &holder_name {
            check_len("holder_name", holder_name, HOLDER_NAME_LEN)?;
        }

        let patch = AccountPatch::builder().maybe_holder_name(holder_name).maybe_status(status).build();

        Ok(Self { account_id, patch, context })
    }
}

#[bon::bon]
impl UpdateBalanceRequest {
    /// Creates a balance mutation. The amount must be a positive cent amount.
    #[builder]
    pub fn new(
        account_id: AccountId,
        amount: Decimal,
        direction: BalanceDirection,
        #[builder(default)] context: AuditContext,
    ) -> Result<Self, RequestError> {
        let amount = Amount::new(amount).map_err(RequestError::InvalidAmount)?;

        Ok(Self { account_id, amount, direction, context })
    }
}

#[bon::bon]
impl RecordTransactionRequest {
    /// Creates a transaction record. The amount must be a positive cent amount.
    #[builder]
    pub fn new(
        deal_id: DealId,
        amount: Decimal,
        transaction_type: TransactionType,
        #[builder(default)] status: TransactionStatus,
        from_account: Option<String>,
        to_account: Option<String>,
        description: Option<String>,
        #[builder(default)] context: AuditContext,
    ) -> Result<Self, RequestError> {
        let amount = Amount::new(amount).map_err(RequestError::InvalidAmount)?;

        Ok(Self {
            deal_id,
            amount,
            transaction_type,
            status,
            from_account,
            to_account,
            description,
            context,
        })
    }
}

#[bon::bon]
impl ListTransactionsRequest {
    /// Creates a listing request. Pages are 1-based, 10 transactions per page by default.
    #[builder]
    pub fn new(
        deal_id: Option<DealId>,
        transaction_type: Option<TransactionType>,
        #[builder(default = 1)] page: u32,
        #[builder(default = DEFAULT_PAGE_SIZE)] page_size: u32,
    ) -> Result<Self, RequestError> {
        let page = make_page(page, page_size)?;

        Ok(Self { filter: TransactionFilter { deal_id, transaction_type }, page })
    }
}

#[bon::bon]
impl AuditLogRequest {
    /// Creates an audit log query. Pages are 1-based, 50 entries per page by default.
    #[builder]
    pub fn new(
        entity_type: Option<AuditEntity>,
        entity_id: Option<String>,
        #[builder(default = 1)] page: u32,
        #[builder(default = DEFAULT_AUDIT_PAGE_SIZE)] page_size: u32,
    ) -> Result<Self, RequestError> {
        let page = make_page(page, page_size)?;

        Ok(Self { filter: AuditFilter { entity_type, entity_id }, page })
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;
use realty_domain::{
    condition::NewCondition,
    ledger::{AccountStatus, BalanceDirection, TransactionStatus, TransactionType},
    participant::Role,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_with::NoneAsEmptyString;

#[derive(Debug, Dissolve, Deserialize)]
pub struct CreateDealRequestPayload {
    property_id: String,
    offer_price: Decimal,

    #[serde(default)]
    participants: BTreeMap<Role, String>,

    #[serde(default)]
    conditions: Vec<NewCondition>,

    closing_date: Option<DateTime<Utc>>,
    notes: Option<String>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct UpdateDealRequestPayload {
    offer_price: Option<Decimal>,
    closing_date: Option<DateTime<Utc>>,
    notes: Option<String>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct TransitionDealRequestPayload {
    status: String,
    note: Option<String>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct UpdateConditionRequestPayload {
    status: String,
    description: Option<String>,
}

// empty query values (`?status=`) are treated as absent
#[serde_with::serde_as]
#[derive(Debug, Dissolve, Deserialize)]
pub struct ListDealsQueryPayload {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    status: Option<String>,

    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    property_id: Option<String>,

    page: Option<u32>,
    page_size: Option<u32>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct CreateTransactionRequestPayload {
    deal_id: String,
    amount: Decimal,
    transaction_type: TransactionType,
    status: Option<TransactionStatus>,
    from_account: Option<String>,
    to_account: Option<String>,
    description: Option<String>,
}

#[serde_with::serde_as]
#[derive(Debug, Dissolve, Deserialize)]
pub struct ListTransactionsQueryPayload {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    deal_id: Option<String>,

    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default, rename = "type")]
    transaction_type: Option<String>,

    page: Option<u32>,
    page_size: Option<u32>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct CreateTrustAccountRequestPayload {
    account_number: String,
    holder_name: String,

    #[serde(default)]
    initial_balance: Decimal,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct UpdateTrustAccountRequestPayload {
    holder_name: Option<String>,
    status: Option<AccountStatus>,
}

#[derive(Debug, Dissolve, Deserialize)]
pub struct UpdateBalanceRequestPayload {
    amount: Decimal,
    direction: BalanceDirection,
}

#[serde_with::serde_as]
#[derive(Debug, Dissolve, Deserialize)]
pub struct AuditLogQueryPayload {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    entity_type: Option<String>,

    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    entity_id: Option<String>,

    page: Option<u32>,
    page_size: Option<u32>,
}

use chrono::{DateTime, Utc};
use diesel::prelude::Queryable;
use dissolve_derive::Dissolve;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::persistence::record::{
    AccountStatusRecord, TransactionStatusRecord, TransactionTypeRecord,
};

#[derive(Debug, Dissolve, Queryable)]
pub struct TrustAccountRecord {
    id: i64,
    account_number: String,
    holder_name: String,
    balance: Decimal,
    status: AccountStatusRecord,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Dissolve, Queryable)]
pub struct TransactionRecord {
    id: i64,
    deal_id: String,
    amount: Decimal,
    transaction_type: TransactionTypeRecord,
    status: TransactionStatusRecord,
    from_account: Option<String>,
    to_account: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Dissolve, Queryable)]
pub struct AuditRecord {
    id: i64,
    action: String,
    entity_type: String,
    entity_id: String,
    old_value: Option<Value>,
    new_value: Option<Value>,
    user_id: Option<String>,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
}

use bon::Builder;
use chrono::{DateTime, Utc};
use diesel::prelude::{AsChangeset, Insertable};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::persistence::{
    record::{
        AccountStatusRecord, DealStatusRecord, PropertyStatusRecord, TransactionStatusRecord,
        TransactionTypeRecord,
    },
    schema,
};

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::app_user)]
pub struct NewUserRecord<'a> {
    id: &'a str,
    doc: Value,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::property)]
pub struct NewPropertyRecord<'a> {
    id: &'a str,
    status: PropertyStatusRecord,
    updated_at: &'a DateTime<Utc>,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::deal)]
pub struct NewDealRecord<'a> {
    id: &'a str,
    property_id: &'a str,
    status: DealStatusRecord,
    doc: Value,
    created_at: &'a DateTime<Utc>,
    updated_at: &'a DateTime<Utc>,
}

#[derive(Debug, Builder, AsChangeset)]
#[diesel(table_name = schema::deal)]
pub struct DealChangeset<'a> {
    status: DealStatusRecord,
    doc: Value,
    updated_at: &'a DateTime<Utc>,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::trust_account)]
pub struct NewTrustAccountRecord<'a> {
    account_number: &'a str,
    holder_name: &'a str,
    balance: Decimal,
    status: AccountStatusRecord,
}

#[derive(Debug, Builder, AsChangeset)]
#[diesel(table_name = schema::trust_account)]
pub struct TrustAccountChangeset<'a> {
    holder_name: Option<&'a str>,
    status: Option<AccountStatusRecord>,
    updated_at: &'a DateTime<Utc>,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::ledger_transaction)]
pub struct NewTransactionRecord<'a> {
    deal_id: &'a str,
    amount: Decimal,
    transaction_type: TransactionTypeRecord,
    status: TransactionStatusRecord,
    from_account: Option<&'a str>,
    to_account: Option<&'a str>,
    description: Option<&'a str>,
}

#[derive(Debug, Builder, Insertable)]
#[diesel(table_name = schema::audit_log)]
pub struct NewAuditRecord<'a> {
    action: &'a str,
    entity_type: &'a str,
    entity_id: &'a str,
    old_value: Option<Value>,
    new_value: Option<Value>,
    user_id: Option<&'a str>,
    ip_address: Option<&'a str>,
}

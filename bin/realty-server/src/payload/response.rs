use bon::Builder;
use realty_domain::{
    audit::AuditLogEntry,
    deal::Deal,
    ledger::{Transaction, TrustAccount},
};
use realty_engine::response::Paginated;
use serde::Serialize;

use crate::payload::PagePayload;

#[derive(Debug, Builder, Serialize)]
pub struct ErrorResponsePayload {
    detail: String,
}

#[derive(Debug, Serialize)]
pub struct ListDealsResponsePayload {
    deals: Vec<Deal>,

    #[serde(flatten)]
    page: PagePayload,
}

#[derive(Debug, Serialize)]
pub struct ListTransactionsResponsePayload {
    transactions: Vec<Transaction>,

    #[serde(flatten)]
    page: PagePayload,
}

#[derive(Debug, Builder, Serialize)]
pub struct ListTrustAccountsResponsePayload {
    accounts: Vec<TrustAccount>,
    total: u64,
}

#[derive(Debug, Serialize)]
pub struct AuditLogResponsePayload {
    entries: Vec<AuditLogEntry>,

    #[serde(flatten)]
    page: PagePayload,
}

impl From<Paginated<Deal>> for ListDealsResponsePayload {
    fn from(paginated: Paginated<Deal>) -> Self {
        let (deals, page) = PagePayload::split(paginated);
        Self { deals, page }
    }
}

impl From<Paginated<Transaction>> for ListTransactionsResponsePayload {
    fn from(paginated: Paginated<Transaction>) -> Self {
        let (transactions, page) = PagePayload::split(paginated);
        Self { transactions, page }
    }
}

impl From<Paginated<AuditLogEntry>> for AuditLogResponsePayload {
    fn from(paginated: Paginated<AuditLogEntry>) -> Self {
        let (entries, page) = PagePayload::split(paginated);
        Self { entries, page }
    }
}

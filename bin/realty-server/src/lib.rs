#![allow(missing_docs)]

pub mod config;

mod error;
mod extract;
mod payload;
mod routes;

use std::sync::Arc;

use axum::{Router, routing};
use bon::Builder;
use dissolve_derive::Dissolve;
use realty_engine::{DealEngine, TrustLedger};

pub fn create_router(app: App) -> Router {
    Router::new()
        .route("/health", routing::get(routes::health))
        .route("/api/deals", routing::post(routes::create_deal).get(routes::list_deals))
        .route(
            "/api/deals/{deal_id}",
            routing::get(routes::get_deal).put(routes::update_deal).delete(routes::delete_deal),
        )
        .route("/api/deals/{deal_id}/status", routing::patch(routes::transition_deal))
        .route("/api/deals/{deal_id}/conditions", routing::post(routes::add_condition))
        .route(
            "/api/deals/{deal_id}/conditions/{condition_id}",
            routing::patch(routes::update_condition),
        )
        .route("/api/deals/{deal_id}/transactions", routing::get(routes::deal_transactions))
        .route(
            "/api/transactions",
            routing::post(routes::record_transaction).get(routes::list_transactions),
        )
        .route("/api/transactions/{transaction_id}", routing::get(routes::get_transaction))
        .route(
            "/api/accounts",
            routing::post(routes::create_trust_account).get(routes::list_trust_accounts),
        )
        .route(
            "/api/accounts/{account_id}",
            routing::get(routes::get_trust_account).put(routes::update_trust_account),
        )
        .route("/api/accounts/{account_id}/balance", routing::post(routes::update_balance))
        .route("/api/audit-logs", routing::get(routes::audit_log))
        .with_state(app)
}

#[derive(Clone, Builder, Dissolve)]
pub struct App {
    deals: Arc<DealEngine>,
    ledger: Arc<TrustLedger>,
    #[builder(default)]
    trust_forwarded_for: bool,
}

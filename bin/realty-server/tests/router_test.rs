use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use realty_domain::{
    id::{DealId, PropertyId},
    participant::Role,
    property::PropertyCommand,
};
use realty_engine::{DealEngine, TrustLedger};
use realty_server::App;
use realty_test_utils::{
    InMemoryDealRepository, InMemoryLedger, InMemoryUserDirectory, RecordingPropertySync,
    fixtures,
};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestServer {
    router: Router,
    users: Arc<InMemoryUserDirectory>,
    ledger: Arc<InMemoryLedger>,
    property_sync: Arc<RecordingPropertySync>,
}

fn setup() -> TestServer {
    setup_with_forwarded_for(true)
}

fn setup_with_forwarded_for(trust_forwarded_for: bool) -> TestServer {
    let deals = Arc::new(InMemoryDealRepository::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let property_sync = Arc::new(RecordingPropertySync::new());

    let deal_engine = DealEngine::builder()
        .deals(deals)
        .users(users.clone())
        .property_sync(property_sync.clone())
        .build();

    let trust_ledger = TrustLedger::builder().ledger(ledger.clone()).build();

    let app = App::builder()
        .deals(deal_engine.into())
        .ledger(trust_ledger.into())
        .trust_forwarded_for(trust_forwarded_for)
        .build();

    TestServer { router: realty_server::create_router(app), users, ledger, property_sync }
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };

    (status, body)
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    call(router, request(method, uri, body)).await
}

async fn create_draft(server: &TestServer) -> String {
    let buyer = fixtures::user(Role::Buyer);
    server.users.insert(buyer.clone());

    let body = json!({
        "property_id": PropertyId::generate().to_string(),
        "offer_price": "500000.00",
        "participants": { "buyer": buyer.id().to_string() },
        "conditions": [{ "type": "financing", "description": "Mortgage approval" }],
    });

    let (status, deal) = send(&server.router, Method::POST, "/api/deals", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    deal["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let server = setup();

    let (status, _) = send(&server.router, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn created_deal_is_a_draft_with_frozen_participants() {
    let server = setup();
    let deal_id = create_draft(&server).await;

    let (status, deal) =
        send(&server.router, Method::GET, &format!("/api/deals/{deal_id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(deal["status"], "draft");
    assert_eq!(deal["offer_price"], "500000.00");
    assert_eq!(deal["participants_snapshot"]["buyer"]["name"], "Test buyer");
    assert_eq!(deal["conditions"][0]["status"], "pending");
    assert_eq!(deal["status_history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn deal_walks_to_completion_and_marks_the_property_sold() {
    let server = setup();
    let deal_id = create_draft(&server).await;

    for status in ["submitted", "firm", "closing", "completed"] {
        let (code, deal) = send(
            &server.router,
            Method::PATCH,
            &format!("/api/deals/{deal_id}/status"),
            Some(json!({ "status": status })),
        )
        .await;

        assert_eq!(code, StatusCode::OK, "transition to {status}");
        assert_eq!(deal["status"], status);
    }

    let commands = server.property_sync.commands();
    assert_eq!(commands.len(), 1);
    assert!(matches!(commands[0], PropertyCommand::MarkSold { .. }));
}

#[tokio::test]
async fn skipping_a_status_is_a_conflict() {
    let server = setup();
    let deal_id = create_draft(&server).await;

    let (status, body) = send(
        &server.router,
        Method::PATCH,
        &format!("/api/deals/{deal_id}/status"),
        Some(json!({ "status": "completed" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["detail"].as_str().unwrap().contains("invalid transition"));
}

#[tokio::test]
async fn unknown_status_name_is_a_bad_request() {
    let server = setup();
    let deal_id = create_draft(&server).await;

    let (status, _) = send(
        &server.router,
        Method::PATCH,
        &format!("/api/deals/{deal_id}/status"),
        Some(json!({ "status": "sold" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_and_unknown_deal_ids() {
    let server = setup();

    let (status, _) = send(&server.router, Method::GET, "/api/deals/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = DealId::generate();
    let (status, _) = send(&server.router, Method::GET, &format!("/api/deals/{unknown}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn condition_updates_stamp_satisfaction() {
    let server = setup();
    let deal_id = create_draft(&server).await;

    let (status, deal) = send(
        &server.router,
        Method::POST,
        &format!("/api/deals/{deal_id}/conditions"),
        Some(json!({ "type": "inspection", "description": "Home inspection" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let condition_id = deal["conditions"][1]["id"].as_str().unwrap().to_owned();

    let (status, deal) = send(
        &server.router,
        Method::PATCH,
        &format!("/api/deals/{deal_id}/conditions/{condition_id}"),
        Some(json!({ "status": "satisfied" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(deal["conditions"][1]["status"], "satisfied");
    assert!(deal["conditions"][1]["satisfied_at"].is_string());

    let (status, _) = send(
        &server.router,
        Method::PATCH,
        &format!("/api/deals/{deal_id}/conditions/{condition_id}"),
        Some(json!({ "status": "approved" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_drafts_can_be_deleted() {
    let server = setup();
    let submitted = create_draft(&server).await;
    let draft = create_draft(&server).await;

    send(
        &server.router,
        Method::PATCH,
        &format!("/api/deals/{submitted}/status"),
        Some(json!({ "status": "submitted" })),
    )
    .await;

    let (status, _) =
        send(&server.router, Method::DELETE, &format!("/api/deals/{submitted}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
        send(&server.router, Method::DELETE, &format!("/api/deals/{draft}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&server.router, Method::GET, &format!("/api/deals/{draft}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deal_listing_filters_by_status() {
    let server = setup();
    let submitted = create_draft(&server).await;
    create_draft(&server).await;
    create_draft(&server).await;

    send(
        &server.router,
        Method::PATCH,
        &format!("/api/deals/{submitted}/status"),
        Some(json!({ "status": "submitted" })),
    )
    .await;

    let (status, body) =
        send(&server.router, Method::GET, "/api/deals?status=draft&page_size=1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["deals"].as_array().unwrap().len(), 1);

    let (status, _) = send(&server.router, Method::GET, "/api/deals?status=sold", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&server.router, Method::GET, "/api/deals?page_size=500", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deposit_and_credit_leave_an_exact_balance_and_audit_trail() {
    let server = setup();
    let deal_id = DealId::generate().to_string();

    let (status, account) = send(
        &server.router,
        Method::POST,
        "/api/accounts",
        Some(json!({ "account_number": fixtures::account_number(), "holder_name": "Escrow" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(account["balance"], "0.00");

    let account_id = account["id"].as_i64().unwrap();

    let mut record = request(
        Method::POST,
        "/api/transactions",
        Some(json!({ "deal_id": deal_id, "amount": "500.00", "transaction_type": "deposit" })),
    );
    record.headers_mut().insert("x-user-id", "agent-7".parse().unwrap());
    record.headers_mut().insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());

    let (status, transaction) = call(&server.router, record).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(transaction["status"], "completed");

    let (status, account) = send(
        &server.router,
        Method::POST,
        &format!("/api/accounts/{account_id}/balance"),
        Some(json!({ "amount": "500.00", "direction": "credit" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["balance"], "500.00");

    let (status, log) =
        send(&server.router, Method::GET, "/api/audit-logs?entity_type=transaction", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log["total"], 1);
    assert_eq!(log["entries"][0]["action"], "create");
    assert_eq!(log["entries"][0]["entity_type"], "transaction");
    assert_eq!(log["entries"][0]["user_id"], "agent-7");
    assert_eq!(log["entries"][0]["ip_address"], "203.0.113.9");

    let (status, transactions) =
        send(&server.router, Method::GET, &format!("/api/deals/{deal_id}/transactions"), None)
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(transactions.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn overdraft_is_rejected_without_touching_the_balance() {
    let server = setup();

    let (_, account) = send(
        &server.router,
        Method::POST,
        "/api/accounts",
        Some(json!({
            "account_number": fixtures::account_number(),
            "holder_name": "Escrow",
            "initial_balance": "100.00",
        })),
    )
    .await;
    let account_id = account["id"].as_i64().unwrap();

    let (status, _) = send(
        &server.router,
        Method::POST,
        &format!("/api/accounts/{account_id}/balance"),
        Some(json!({ "amount": "150.00", "direction": "debit" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, account) =
        send(&server.router, Method::GET, &format!("/api/accounts/{account_id}"), None).await;
    assert_eq!(account["balance"], "100.00");
}

#[tokio::test]
async fn frozen_account_refuses_balance_changes() {
    let server = setup();

    let (_, account) = send(
        &server.router,
        Method::POST,
        "/api/accounts",
        Some(json!({ "account_number": fixtures::account_number(), "holder_name": "Escrow" })),
    )
    .await;
    let account_id = account["id"].as_i64().unwrap();

    let (status, account) = send(
        &server.router,
        Method::PUT,
        &format!("/api/accounts/{account_id}"),
        Some(json!({ "status": "frozen" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["status"], "frozen");

    let (status, _) = send(
        &server.router,
        Method::POST,
        &format!("/api/accounts/{account_id}/balance"),
        Some(json!({ "amount": "10.00", "direction": "credit" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn duplicate_account_number_is_a_conflict() {
    let server = setup();
    let body = json!({ "account_number": fixtures::account_number(), "holder_name": "Escrow" });

    let (status, _) = send(&server.router, Method::POST, "/api/accounts", Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&server.router, Method::POST, "/api/accounts", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, accounts) = send(&server.router, Method::GET, "/api/accounts", None).await;
    assert_eq!(accounts["total"], 1);
}

#[tokio::test]
async fn failed_audit_append_rejects_the_transaction() {
    let server = setup();
    server.ledger.fail_audit_appends(true);

    let (status, _) = send(
        &server.router,
        Method::POST,
        "/api/transactions",
        Some(json!({
            "deal_id": DealId::generate().to_string(),
            "amount": "500.00",
            "transaction_type": "deposit",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(server.ledger.transactions().is_empty());
}

#[tokio::test]
async fn malformed_ledger_inputs_are_bad_requests() {
    let server = setup();

    let (status, _) = send(
        &server.router,
        Method::POST,
        "/api/transactions",
        Some(json!({ "deal_id": "nope", "amount": "5.00", "transaction_type": "deposit" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &server.router,
        Method::POST,
        "/api/transactions",
        Some(json!({
            "deal_id": DealId::generate().to_string(),
            "amount": "0",
            "transaction_type": "deposit",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&server.router, Method::GET, "/api/accounts/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&server.router, Method::GET, "/api/transactions?type=gift", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn amounts_beyond_the_ledger_range_are_bad_requests() {
    let server = setup();

    let (status, _) = send(
        &server.router,
        Method::POST,
        "/api/transactions",
        Some(json!({
            "deal_id": DealId::generate().to_string(),
            "amount": "1000000000000000",
            "transaction_type": "deposit",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(server.ledger.transactions().is_empty());

    let (_, account) = send(
        &server.router,
        Method::POST,
        "/api/accounts",
        Some(json!({
            "account_number": fixtures::account_number(),
            "holder_name": "Escrow",
            "initial_balance": "999999999999.99",
        })),
    )
    .await;
    let account_id = account["id"].as_i64().unwrap();

    let (status, _) = send(
        &server.router,
        Method::POST,
        &format!("/api/accounts/{account_id}/balance"),
        Some(json!({ "amount": "0.01", "direction": "credit" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, account) =
        send(&server.router, Method::GET, &format!("/api/accounts/{account_id}"), None).await;
    assert_eq!(account["balance"], "999999999999.99");
}

#[tokio::test]
async fn forwarded_for_is_ignored_unless_trusted() {
    let server = setup_with_forwarded_for(false);

    let mut record = request(
        Method::POST,
        "/api/transactions",
        Some(json!({
            "deal_id": DealId::generate().to_string(),
            "amount": "25.00",
            "transaction_type": "deposit",
        })),
    );
    record.headers_mut().insert("x-user-id", "agent-7".parse().unwrap());
    record.headers_mut().insert("x-forwarded-for", "198.51.100.1".parse().unwrap());

    let (status, _) = call(&server.router, record).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, log) = send(&server.router, Method::GET, "/api/audit-logs", None).await;
    assert_eq!(log["entries"][0]["user_id"], "agent-7");
    assert_eq!(log["entries"][0]["ip_address"], Value::Null);
}

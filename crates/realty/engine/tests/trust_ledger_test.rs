//! integration tests for the realty trust ledger

use std::sync::Arc;

use realty_domain::{
    audit::{AuditAction, AuditContext, AuditEntity},
    id::DealId,
    ledger::{AccountId, AccountStatus, BalanceDirection, TransactionStatus, TransactionType},
};
use realty_engine::{
    LedgerError, TrustLedger,
    request::{
        AuditLogRequest, CreateAccountRequest, ListTransactionsRequest, RecordTransactionRequest,
        RequestError, UpdateAccountRequest, UpdateBalanceRequest,
    },
};
use realty_test_utils::{InMemoryLedger, fixtures};
use rust_decimal::Decimal;
use serde_json::json;

fn ledger() -> (TrustLedger, Arc<InMemoryLedger>) {
    let store = Arc::new(InMemoryLedger::new());

    (TrustLedger::builder().ledger(store.clone()).build(), store)
}

async fn open_account(ledger: &TrustLedger, initial_balance: &str) -> AccountId {
    let request = CreateAccountRequest::builder()
        .account_number(fixtures::account_number())
        .holder_name("Harbour Realty Trust")
        .initial_balance(fixtures::decimal(initial_balance))
        .build()
        .unwrap();

    ledger.create_account(request).await.unwrap().id()
}

async fn move_money(
    ledger: &TrustLedger,
    account_id: AccountId,
    amount: Decimal,
    direction: BalanceDirection,
) -> Result<Decimal, LedgerError> {
    let request = UpdateBalanceRequest::builder()
        .account_id(account_id)
        .amount(amount)
        .direction(direction)
        .build()
        .unwrap();

    ledger.update_balance(request).await.map(|account| account.balance().get())
}

fn deposit(deal_id: DealId, amount: &str) -> RecordTransactionRequest {
    RecordTransactionRequest::builder()
        .deal_id(deal_id)
        .amount(fixtures::decimal(amount))
        .transaction_type(TransactionType::Deposit)
        .from_account("buyer".to_owned())
        .to_account("trust".to_owned())
        .build()
        .unwrap()
}

#[tokio::test]
async fn deposit_credited_to_a_fresh_account_leaves_one_transaction_audit_entry() {
    // Arrange
    let (ledger, store) = ledger();
    let account_id = open_account(&ledger, "0").await;
    let deal_id = DealId::generate();

    // Act
    let transaction = ledger.record_transaction(deposit(deal_id, "500.00")).await.unwrap();
    let balance = move_money(&ledger, account_id, fixtures::decimal("500.00"), BalanceDirection::Credit)
        .await
        .unwrap();

    // Assert
    assert_eq!(balance, fixtures::decimal("500.00"));
    assert_eq!(transaction.status(), TransactionStatus::Completed);

    let created_transactions: Vec<_> = store
        .audit_entries()
        .into_iter()
        .filter(|e| e.action() == AuditAction::Create && e.entity_type() == AuditEntity::Transaction)
        .collect();
    assert_eq!(created_transactions.len(), 1);

    let entry = &created_transactions[0];
    assert_eq!(entry.entity_id(), transaction.id().to_string());
    let new_value = entry.new_value().unwrap();
    assert_eq!(new_value["deal_id"], json!(deal_id.to_string()));
    assert_eq!(new_value["amount"], json!("500.00"));
    assert_eq!(new_value["type"], json!("deposit"));
    assert_eq!(new_value["status"], json!("completed"));
}

#[tokio::test]
async fn overdrawing_debit_is_rejected_and_leaves_the_balance_unchanged() {
    let (ledger, store) = ledger();
    let account_id = open_account(&ledger, "50").await;
    let audit_before = store.audit_entries().len();

    let err = move_money(&ledger, account_id, fixtures::decimal("100"), BalanceDirection::Debit)
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
    let account = ledger.get_account(account_id).await.unwrap();
    assert_eq!(account.balance(), fixtures::balance("50.00"));
    assert_eq!(store.audit_entries().len(), audit_before);
}

#[tokio::test]
async fn ten_thousand_credit_debit_cycles_do_not_drift() {
    let (ledger, _) = ledger();
    let account_id = open_account(&ledger, "1234.56").await;
    let cent = fixtures::decimal("0.01");

    for i in 1..=10_000u32 {
        let amount = cent * Decimal::from(i % 97 + 1) + fixtures::decimal("0.07");

        move_money(&ledger, account_id, amount, BalanceDirection::Credit).await.unwrap();
        move_money(&ledger, account_id, amount, BalanceDirection::Debit).await.unwrap();
    }

    let account = ledger.get_account(account_id).await.unwrap();
    assert_eq!(account.balance(), fixtures::balance("1234.56"));
    assert_eq!(account.balance().get().to_string(), "1234.56");
}

#[tokio::test]
async fn failed_audit_append_leaves_no_transaction_behind() {
    let (ledger, store) = ledger();
    store.fail_audit_appends(true);

    let err = ledger.record_transaction(deposit(DealId::generate(), "75.25")).await.unwrap_err();

    assert!(matches!(err, LedgerError::AuditWriteFailed(_)));
    assert!(store.transactions().is_empty());
    assert!(store.audit_entries().is_empty());
}

#[tokio::test]
async fn failed_audit_append_leaves_the_balance_alone() {
    let (ledger, store) = ledger();
    let account_id = open_account(&ledger, "10").await;
    store.fail_audit_appends(true);

    let err = move_money(&ledger, account_id, fixtures::decimal("5"), BalanceDirection::Credit)
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::AuditWriteFailed(_)));
    assert_eq!(ledger.get_account(account_id).await.unwrap().balance(), fixtures::balance("10"));
}

#[tokio::test]
async fn balance_changes_are_refused_on_frozen_and_closed_accounts() {
    let (ledger, _) = ledger();
    let account_id = open_account(&ledger, "100").await;

    for status in [AccountStatus::Frozen, AccountStatus::Closed] {
        let request = UpdateAccountRequest::builder()
            .account_id(account_id)
            .status(status)
            .build()
            .unwrap();
        ledger.update_account(request).await.unwrap();

        let err = move_money(&ledger, account_id, fixtures::decimal("1"), BalanceDirection::Credit)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotActive(s) if s == status));
    }
}

#[tokio::test]
async fn duplicate_account_numbers_are_rejected() {
    let (ledger, _) = ledger();
    let number = fixtures::account_number();

    let request = || {
        CreateAccountRequest::builder()
            .account_number(number.clone())
            .holder_name("Keller & Stone LLP")
            .build()
            .unwrap()
    };

    let account = ledger.create_account(request()).await.unwrap();
    assert_eq!(account.status(), AccountStatus::Active);

    let err = ledger.create_account(request()).await.unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateAccount(n) if n == number));

    let found = ledger.get_account_by_number(&number).await.unwrap().unwrap();
    assert_eq!(found.id(), account.id());
}

#[tokio::test]
async fn negative_opening_balance_is_rejected() {
    let result = CreateAccountRequest::builder()
        .account_number(fixtures::account_number())
        .holder_name("Holder")
        .initial_balance(fixtures::decimal("-0.01"))
        .build();

    assert!(matches!(result, Err(RequestError::InvalidBalance(_))));
}

#[tokio::test]
async fn unknown_accounts_fail_with_account_not_found() {
    let (ledger, _) = ledger();
    let account_id = AccountId::from(404);

    let err = move_money(&ledger, account_id, fixtures::decimal("1"), BalanceDirection::Credit)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(id) if id == account_id));

    let request = UpdateAccountRequest::builder()
        .account_id(account_id)
        .holder_name("Nobody".to_owned())
        .build()
        .unwrap();
    assert!(matches!(
        ledger.update_account(request).await,
        Err(LedgerError::AccountNotFound(_))
    ));
}

#[tokio::test]
async fn account_update_records_old_and_new_values_with_the_actor() {
    let (ledger, _) = ledger();
    let account_id = open_account(&ledger, "0").await;

    let context = AuditContext::builder()
        .user_id("64b7f0c2a1e4d5f6a7b8c9d0".to_owned())
        .ip_address("10.0.0.7".to_owned())
        .build();
    let request = UpdateAccountRequest::builder()
        .account_id(account_id)
        .holder_name("Renamed Trust".to_owned())
        .context(context)
        .build()
        .unwrap();
    let account = ledger.update_account(request).await.unwrap();
    assert_eq!(account.holder_name(), "Renamed Trust");

    let log = ledger
        .audit_log(
            AuditLogRequest::builder()
                .entity_type(AuditEntity::TrustAccount)
                .entity_id(account_id.to_string())
                .build()
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(log.total(), 2);
    assert_eq!(log.page_size(), 50);

    let update = &log.items()[0];
    assert_eq!(update.action(), AuditAction::Update);
    assert_eq!(update.old_value().unwrap()["holder_name"], json!("Harbour Realty Trust"));
    assert_eq!(update.new_value().unwrap()["holder_name"], json!("Renamed Trust"));
    assert_eq!(update.user_id(), Some("64b7f0c2a1e4d5f6a7b8c9d0"));
    assert_eq!(update.ip_address(), Some("10.0.0.7"));
    assert_eq!(log.items()[1].action(), AuditAction::Create);
}

#[tokio::test]
async fn balance_audit_carries_old_and_new_balance() {
    let (ledger, store) = ledger();
    let account_id = open_account(&ledger, "20.00").await;

    move_money(&ledger, account_id, fixtures::decimal("7.5"), BalanceDirection::Debit)
        .await
        .unwrap();

    let entry = store.audit_entries().pop().unwrap();
    assert_eq!(entry.action(), AuditAction::Debit);
    assert_eq!(entry.entity_type(), AuditEntity::TrustAccount);
    assert_eq!(entry.old_value().unwrap(), &json!({ "balance": "20.00" }));
    assert_eq!(entry.new_value().unwrap(), &json!({ "balance": "12.50", "amount": "7.50" }));
}

#[tokio::test]
async fn transactions_are_listed_by_deal_and_type() {
    let (ledger, _) = ledger();
    let deal_id = DealId::generate();

    let first = ledger.record_transaction(deposit(deal_id, "1000")).await.unwrap();
    let commission = RecordTransactionRequest::builder()
        .deal_id(deal_id)
        .amount(fixtures::decimal("250"))
        .transaction_type(TransactionType::Commission)
        .status(TransactionStatus::Pending)
        .description("listing commission".to_owned())
        .build()
        .unwrap();
    let second = ledger.record_transaction(commission).await.unwrap();
    ledger.record_transaction(deposit(DealId::generate(), "5")).await.unwrap();

    let for_deal = ledger.deal_transactions(deal_id).await.unwrap();
    assert_eq!(
        for_deal.iter().map(|t| t.id()).collect::<Vec<_>>(),
        vec![second.id(), first.id()]
    );

    let deposits = ledger
        .list_transactions(
            ListTransactionsRequest::builder()
                .transaction_type(TransactionType::Deposit)
                .build()
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(deposits.total(), 2);
    assert_eq!(deposits.page(), 1);

    let fetched = ledger.get_transaction(second.id()).await.unwrap();
    assert_eq!(fetched.status(), TransactionStatus::Pending);
    assert_eq!(fetched.description(), Some("listing commission"));

    assert!(matches!(
        ledger.get_transaction(9_999.into()).await,
        Err(LedgerError::TransactionNotFound(_))
    ));
}

#[tokio::test]
async fn accounts_are_listed_newest_first() {
    let (ledger, _) = ledger();
    let first = open_account(&ledger, "0").await;
    let second = open_account(&ledger, "0").await;

    let accounts = ledger.list_accounts().await.unwrap();

    assert_eq!(accounts.iter().map(|a| a.id()).collect::<Vec<_>>(), vec![second, first]);
}

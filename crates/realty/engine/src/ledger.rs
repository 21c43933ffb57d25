//! The trust ledger.

use std::sync::Arc;

use realty_domain::{
    audit::{AuditAction, AuditEntity, AuditLogEntry, NewAuditEntry},
    id::DealId,
    ledger::{
        AccountId, BalanceDirection, NewTransaction, NewTrustAccount, Transaction, TransactionId,
        TrustAccount,
    },
};
use serde_json::{Value, json};

use crate::{
    error::LedgerError,
    port::{LedgerRepository, TransactionFilter},
    types::{
        request::{
            AuditLogRequest, AuditLogRequestDissolved, CreateAccountRequest,
            CreateAccountRequestDissolved, ListTransactionsRequest,
            ListTransactionsRequestDissolved, RecordTransactionRequest,
            RecordTransactionRequestDissolved, UpdateAccountRequest,
            UpdateAccountRequestDissolved, UpdateBalanceRequest, UpdateBalanceRequestDissolved,
        },
        response::Paginated,
    },
};

pub type Result<T, E = LedgerError> = core::result::Result<T, E>;

/// Trust accounts, transactions and their audit trail.
///
/// Every financial write is paired with an audit entry and the two commit together. A write
/// whose audit entry cannot be appended is rolled back and reported as
/// [`LedgerError::AuditWriteFailed`].
#[derive(Clone)]
pub struct TrustLedger {
    ledger: Arc<dyn LedgerRepository>,
}

#[bon::bon]
impl TrustLedger {
    /// Creates a ledger over the given store.
    #[builder]
    pub fn new(ledger: Arc<dyn LedgerRepository>) -> Self {
        Self { ledger }
    }
}

impl TrustLedger {
    /// Opens an active trust account.
    #[tracing::instrument(skip_all)]
    pub async fn create_account(&self, request: CreateAccountRequest) -> Result<TrustAccount> {
        let CreateAccountRequestDissolved { account_number, holder_name, initial_balance, context } =
            request.dissolve();

        let new_account = NewTrustAccount::builder()
            .account_number(account_number)
            .holder_name(holder_name)
            .initial_balance(initial_balance)
            .build();

        let account = self
            .ledger
            .insert_account(
                new_account,
                Box::new(move |account| {
                    NewAuditEntry::builder()
                        .action(AuditAction::Create)
                        .entity_type(AuditEntity::TrustAccount)
                        .entity_id(account.id().to_string())
                        .new_value(account_value(account))
                        .context(context)
                        .build()
                }),
            )
            .await?;

        tracing::info!(
            account_id = %account.id(),
            account_number = account.account_number(),
            "trust account created"
        );

        Ok(account)
    }

    /// Loads an account by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_account(&self, account_id: AccountId) -> Result<TrustAccount> {
        self.ledger
            .find_account(account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))
    }

    /// Loads an account by its number. `None` if no account carries it.
    #[tracing::instrument(skip(self))]
    pub async fn get_account_by_number(&self, account_number: &str) -> Result<Option<TrustAccount>> {
        self.ledger.find_account_by_number(account_number).await.map_err(From::from)
    }

    /// Lists every account newest first.
    #[tracing::instrument(skip_all)]
    pub async fn list_accounts(&self) -> Result<Vec<TrustAccount>> {
        self.ledger.list_accounts().await.map_err(From::from)
    }

    /// Changes the holder name or status of an account, recording both versions in the audit
    /// log.
    #[tracing::instrument(skip_all)]
    pub async fn update_account(&self, request: UpdateAccountRequest) -> Result<TrustAccount> {
        let UpdateAccountRequestDissolved { account_id, patch, context } = request.dissolve();

        let account = self
            .ledger
            .update_account(
                account_id,
                patch,
                Box::new(move |old, new| {
                    NewAuditEntry::builder()
                        .action(AuditAction::Update)
                        .entity_type(AuditEntity::TrustAccount)
                        .entity_id(new.id().to_string())
                        .old_value(account_value(old))
                        .new_value(account_value(new))
                        .context(context)
                        .build()
                }),
            )
            .await?
            .ok_or(LedgerError::AccountNotFound(account_id))?;

        tracing::info!(%account_id, status = %account.status(), "trust account updated");

        Ok(account)
    }

    /// Credits or debits an account.
    ///
    /// The new balance is computed with exact decimal arithmetic and written only if the
    /// account still holds the balance it was computed from. A debit larger than the balance
    /// is rejected and nothing is written.
    #[tracing::instrument(skip_all)]
    pub async fn update_balance(&self, request: UpdateBalanceRequest) -> Result<TrustAccount> {
        let UpdateBalanceRequestDissolved { account_id, amount, direction, context } =
            request.dissolve();

        let account = self.get_account(account_id).await?;
        let balance = account.balance();

        let new_balance = account.apply(direction, amount).inspect_err(|e| {
            tracing::debug!(%account_id, %direction, %amount, "balance update rejected: {e}")
        })?;

        let audit = NewAuditEntry::builder()
            .action(balance_action(direction))
            .entity_type(AuditEntity::TrustAccount)
            .entity_id(account_id.to_string())
            .old_value(json!({ "balance": money(balance) }))
            .new_value(json!({ "balance": money(new_balance), "amount": money(amount) }))
            .context(context)
            .build();

        let account = self
            .ledger
            .swap_balance(account_id, balance, new_balance, audit)
            .await?
            .ok_or(LedgerError::ConcurrentModification(account_id))?;

        tracing::info!(%account_id, %direction, %amount, balance = %account.balance(), "balance updated");

        Ok(account)
    }

    /// Records an immutable transaction against a deal together with its audit entry.
    #[tracing::instrument(skip_all)]
    pub async fn record_transaction(
        &self,
        request: RecordTransactionRequest,
    ) -> Result<Transaction> {
        let RecordTransactionRequestDissolved {
            deal_id,
            amount,
            transaction_type,
            status,
            from_account,
            to_account,
            description,
            context,
        } = request.dissolve();

        let new_transaction = NewTransaction::builder()
            .deal_id(deal_id)
            .amount(amount)
            .transaction_type(transaction_type)
            .status(status)
            .maybe_from_account(from_account)
            .maybe_to_account(to_account)
            .maybe_description(description)
            .build();

        let transaction = self
            .ledger
            .insert_transaction(
                new_transaction,
                Box::new(move |transaction| {
                    NewAuditEntry::builder()
                        .action(AuditAction::Create)
                        .entity_type(AuditEntity::Transaction)
                        .entity_id(transaction.id().to_string())
                        .new_value(transaction_value(transaction))
                        .context(context)
                        .build()
                }),
            )
            .await
            .inspect_err(|e| tracing::error!(%deal_id, "failed to record transaction: {e}"))?;

        tracing::info!(
            transaction_id = %transaction.id(),
            %deal_id,
            %amount,
            transaction_type = %transaction.transaction_type(),
            "transaction recorded"
        );

        Ok(transaction)
    }

    /// Loads a transaction.
    #[tracing::instrument(skip(self))]
    pub async fn get_transaction(&self, transaction_id: TransactionId) -> Result<Transaction> {
        self.ledger
            .find_transaction(transaction_id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(transaction_id))
    }

    /// Lists transactions newest first.
    #[tracing::instrument(skip_all)]
    pub async fn list_transactions(
        &self,
        request: ListTransactionsRequest,
    ) -> Result<Paginated<Transaction>> {
        let ListTransactionsRequestDissolved { filter, page } = request.dissolve();

        let (items, total) = self.ledger.list_transactions(&filter, Some(page)).await?;

        Ok(Paginated::builder().items(items).total(total).page(page).build())
    }

    /// Lists every transaction tagged to a deal, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn deal_transactions(&self, deal_id: DealId) -> Result<Vec<Transaction>> {
        let filter = TransactionFilter { deal_id: Some(deal_id), transaction_type: None };

        let (items, _) = self.ledger.list_transactions(&filter, None).await?;

        Ok(items)
    }

    /// Reads the audit log newest first.
    #[tracing::instrument(skip_all)]
    pub async fn audit_log(&self, request: AuditLogRequest) -> Result<Paginated<AuditLogEntry>> {
        let AuditLogRequestDissolved { filter, page } = request.dissolve();

        let (items, total) = self.ledger.list_audit(&filter, page).await?;

        Ok(Paginated::builder().items(items).total(total).page(page).build())
    }
}

fn balance_action(direction: BalanceDirection) -> AuditAction {
    match direction {
        BalanceDirection::Credit => AuditAction::Credit,
        BalanceDirection::Debit => AuditAction::Debit,
    }
}

// Money goes into audit snapshots as text so no JSON reader ever sees it as a float.
fn money<M>(value: M) -> Value
where
    M: Into<rust_decimal::Decimal>,
{
    Value::String(value.into().to_string())
}

fn account_value(account: &TrustAccount) -> Value {
    json!({
        "id": account.id().get(),
        "account_number": account.account_number(),
        "holder_name": account.holder_name(),
        "balance": money(account.balance()),
        "status": account.status().to_string(),
    })
}

fn transaction_value(transaction: &Transaction) -> Value {
    json!({
        "id": transaction.id().get(),
        "deal_id": transaction.deal_id().to_string(),
        "amount": money(transaction.amount()),
        "type": transaction.transaction_type().to_string(),
        "status": transaction.status().to_string(),
        "from_account": transaction.from_account(),
        "to_account": transaction.to_account(),
    })
}

#[cfg(test)]
mod tests {
    use realty_domain::{
        ledger::TransactionType,
        money::{Amount, Balance},
    };
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn audit_money_is_text() {
        let amount = Amount::new(Decimal::new(50000, 2)).unwrap();

        assert_eq!(money(amount), Value::String("500.00".to_owned()));
        assert_eq!(money(Balance::ZERO), Value::String("0.00".to_owned()));
    }

    #[test]
    fn transaction_snapshot_names_its_fields() {
        let deal_id = DealId::generate();
        let transaction = NewTransaction::builder()
            .deal_id(deal_id)
            .amount(Amount::new(Decimal::new(1234, 2)).unwrap())
            .transaction_type(TransactionType::Deposit)
            .to_account("TRUST-001".to_owned())
            .build()
            .into_transaction(TransactionId::from(7), chrono::Utc::now());

        let value = transaction_value(&transaction);

        assert_eq!(value["id"], json!(7));
        assert_eq!(value["deal_id"], json!(deal_id.to_string()));
        assert_eq!(value["amount"], json!("12.34"));
        assert_eq!(value["type"], json!("deposit"));
        assert_eq!(value["status"], json!("completed"));
        assert_eq!(value["from_account"], Value::Null);
        assert_eq!(value["to_account"], json!("TRUST-001"));
    }

    #[test]
    fn balance_directions_map_to_audit_actions() {
        assert_eq!(balance_action(BalanceDirection::Credit), AuditAction::Credit);
        assert_eq!(balance_action(BalanceDirection::Debit), AuditAction::Debit);
    }
}

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use realty_domain::{
    Timestamps,
    audit::{AuditEntryId, AuditLogEntry, NewAuditEntry},
    ledger::{
        AccountId, AccountPatch, AccountPatchDissolved, AccountStatus, NewTransaction,
        NewTrustAccount, NewTrustAccountDissolved, Transaction, TransactionId, TrustAccount,
        TrustAccountDissolved,
    },
    money::Balance,
};
use realty_engine::port::{
    AuditDiffFn, AuditFilter, AuditFn, LedgerRepository, LedgerRepositoryError, Page,
    TransactionFilter,
};

use crate::paginate;

/// Trust accounts, transactions and audit entries behind a single lock.
///
/// Each write and its audit entry are committed under the same lock acquisition. When audit
/// appends are set to fail, the write is discarded along with the entry.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    fail_audit: AtomicBool,
}

#[derive(Debug, Default)]
struct LedgerState {
    accounts: Vec<TrustAccount>,
    transactions: Vec<Transaction>,
    audit: Vec<AuditLogEntry>,
    next_id: i64,
}

impl LedgerState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn account_mut(&mut self, id: AccountId) -> Option<&mut TrustAccount> {
        self.accounts.iter_mut().find(|a| a.id() == id)
    }
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following audit append fail, rolling back the write it belongs to.
    pub fn fail_audit_appends(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    /// Returns every stored transaction in insertion order.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().transactions.clone()
    }

    /// Returns every audit entry in insertion order.
    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.state.lock().unwrap().audit.clone()
    }

    fn audit_entry(
        &self,
        state: &mut LedgerState,
        entry: NewAuditEntry,
    ) -> Result<AuditLogEntry, LedgerRepositoryError> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(LedgerRepositoryError::audit_append("audit log is unavailable"));
        }

        Ok(entry.into_entry(AuditEntryId::from(state.next_id()), Utc::now()))
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedger {
    async fn insert_account(
        &self,
        account: NewTrustAccount,
        audit: AuditFn<TrustAccount>,
    ) -> Result<TrustAccount, LedgerRepositoryError> {
        let mut state = self.state.lock().unwrap();

        let NewTrustAccountDissolved { account_number, holder_name, initial_balance } =
            account.dissolve();

        if state.accounts.iter().any(|a| a.account_number() == account_number) {
            return Err(LedgerRepositoryError::DuplicateAccountNumber(account_number));
        }

        let account = TrustAccount::builder()
            .id(AccountId::from(state.next_id()))
            .account_number(account_number)
            .holder_name(holder_name)
            .balance(initial_balance)
            .status(AccountStatus::Active)
            .timestamps(Timestamps::new_at(Utc::now()))
            .build();

        let entry = self.audit_entry(&mut state, audit(&account))?;

        state.accounts.push(account.clone());
        state.audit.push(entry);

        Ok(account)
    }

    async fn find_account(
        &self,
        id: AccountId,
    ) -> Result<Option<TrustAccount>, LedgerRepositoryError> {
        Ok(self.state.lock().unwrap().accounts.iter().find(|a| a.id() == id).cloned())
    }

    async fn find_account_by_number(
        &self,
        account_number: &str,
    ) -> Result<Option<TrustAccount>, LedgerRepositoryError> {
        let state = self.state.lock().unwrap();

        Ok(state.accounts.iter().find(|a| a.account_number() == account_number).cloned())
    }

    async fn list_accounts(&self) -> Result<Vec<TrustAccount>, LedgerRepositoryError> {
        Ok(self.state.lock().unwrap().accounts.iter().rev().cloned().collect())
    }

    async fn update_account(
        &self,
        id: AccountId,
        patch: AccountPatch,
        audit: AuditDiffFn<TrustAccount>,
    ) -> Result<Option<TrustAccount>, LedgerRepositoryError> {
        let mut state = self.state.lock().unwrap();

        let Some(old) = state.account_mut(id).map(|a| a.clone()) else {
            return Ok(None);
        };

        let new = patched(old.clone(), patch);
        let entry = self.audit_entry(&mut state, audit(&old, &new))?;

        if let Some(stored) = state.account_mut(id) {
            *stored = new.clone();
        }
        state.audit.push(entry);

        Ok(Some(new))
    }

    async fn swap_balance(
        &self,
        id: AccountId,
        expected: Balance,
        new: Balance,
        audit: NewAuditEntry,
    ) -> Result<Option<TrustAccount>, LedgerRepositoryError> {
        let mut state = self.state.lock().unwrap();

        let Some(current) = state.account_mut(id).map(|a| a.clone()) else {
            return Ok(None);
        };

        if current.status() != AccountStatus::Active || current.balance() != expected {
            return Ok(None);
        }

        let entry = self.audit_entry(&mut state, audit)?;
        let updated = with_balance(current, new);

        if let Some(stored) = state.account_mut(id) {
            *stored = updated.clone();
        }
        state.audit.push(entry);

        Ok(Some(updated))
    }

    async fn insert_transaction(
        &self,
        transaction: NewTransaction,
        audit: AuditFn<Transaction>,
    ) -> Result<Transaction, LedgerRepositoryError> {
        let mut state = self.state.lock().unwrap();

        let id = TransactionId::from(state.next_id());
        let transaction = transaction.into_transaction(id, Utc::now());
        let entry = self.audit_entry(&mut state, audit(&transaction))?;

        state.transactions.push(transaction.clone());
        state.audit.push(entry);

        Ok(transaction)
    }

    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerRepositoryError> {
        Ok(self.state.lock().unwrap().transactions.iter().find(|t| t.id() == id).cloned())
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: Option<Page>,
    ) -> Result<(Vec<Transaction>, u64), LedgerRepositoryError> {
        let state = self.state.lock().unwrap();

        let matching = state.transactions.iter().rev().filter(|t| {
            filter.deal_id.is_none_or(|d| t.deal_id() == d)
                && filter.transaction_type.is_none_or(|k| t.transaction_type() == k)
        });

        Ok(paginate(matching, page))
    }

    async fn list_audit(
        &self,
        filter: &AuditFilter,
        page: Page,
    ) -> Result<(Vec<AuditLogEntry>, u64), LedgerRepositoryError> {
        let state = self.state.lock().unwrap();

        let matching = state.audit.iter().rev().filter(|e| {
            filter.entity_type.is_none_or(|k| e.entity_type() == k)
                && filter.entity_id.as_deref().is_none_or(|id| e.entity_id() == id)
        });

        Ok(paginate(matching, Some(page)))
    }
}

fn patched(account: TrustAccount, patch: AccountPatch) -> TrustAccount {
    let TrustAccountDissolved { id, account_number, holder_name, balance, status, mut timestamps } =
        account.dissolve();
    let AccountPatchDissolved { holder_name: new_holder_name, status: new_status } =
        patch.dissolve();

    timestamps.touch(Utc::now());

    TrustAccount::builder()
        .id(id)
        .account_number(account_number)
        .holder_name(new_holder_name.unwrap_or(holder_name))
        .balance(balance)
        .status(new_status.unwrap_or(status))
        .timestamps(timestamps)
        .build()
}

fn with_balance(account: TrustAccount, balance: Balance) -> TrustAccount {
    let TrustAccountDissolved { id, account_number, holder_name, status, mut timestamps, .. } =
        account.dissolve();

    timestamps.touch(Utc::now());

    TrustAccount::builder()
        .id(id)
        .account_number(account_number)
        .holder_name(holder_name)
        .balance(balance)
        .status(status)
        .timestamps(timestamps)
        .build()
}

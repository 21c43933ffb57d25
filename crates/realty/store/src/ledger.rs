use core::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use diesel_async::AsyncConnection;
use futures::TryStreamExt;
use realty_domain::{
    Timestamps,
    audit::{AuditEntryId, AuditLogEntry, NewAuditEntry, NewAuditEntryDissolved},
    id::DealId,
    ledger::{
        AccountId, AccountPatch, AccountStatus, NewTransaction, NewTrustAccount, Transaction,
        TransactionId, TrustAccount,
    },
    money::{Amount, Balance},
};
use realty_engine::port::{
    AuditDiffFn, AuditFilter, AuditFn, LedgerRepository, LedgerRepositoryError, Page,
    TransactionFilter,
};

use crate::{
    error::{RealtyStoreError, Result},
    persistence::{
        pool::{DbConn, DbPool},
        record::{
            insert::{
                NewAuditRecord, NewTransactionRecord, NewTrustAccountRecord, TrustAccountChangeset,
            },
            select::{
                AuditRecord, AuditRecordDissolved, TransactionRecord, TransactionRecordDissolved,
                TrustAccountRecord, TrustAccountRecordDissolved,
            },
        },
        store,
    },
};

/// Trust accounts, their transactions and the audit trail, kept relationally.
///
/// Every write that carries an audit entry runs in one database transaction with the insert of
/// that entry. Balances only move through a compare-and-set on the stored value.
pub struct LedgerStore {
    pool: DbPool,
}

impl LedgerStore {
    /// Creates a new `LedgerStore` over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        LedgerStore { pool }
    }
}

impl LedgerStore {
    /// Opens an account and appends its creation entry.
    ///
    /// # Errors
    ///
    /// Returns [`RealtyStoreError::DuplicateAccountNumber`] if the number is taken and
    /// [`RealtyStoreError::AuditAppend`] if the entry could not be written. Nothing is stored
    /// in either case.
    #[tracing::instrument(skip_all, fields(account_number = account.account_number()))]
    pub async fn create_account(
        &self,
        account: NewTrustAccount,
        audit: AuditFn<TrustAccount>,
    ) -> Result<TrustAccount> {
        self.get_conn()
            .await?
            .transaction(|conn| {
                Box::pin(async move {
                    let new_account = NewTrustAccountRecord::builder()
                        .account_number(account.account_number())
                        .holder_name(account.holder_name())
                        .balance(account.initial_balance().get())
                        .status(AccountStatus::Active.into())
                        .build();

                    let record =
                        store::save_new_trust_account(conn, new_account).await.map_err(|e| {
                            if e.is_unique_violation() {
                                let number = account.account_number().to_owned();
                                RealtyStoreError::DuplicateAccountNumber(number)
                            } else {
                                RealtyStoreError::Store(e)
                            }
                        })?;

                    let created = make_trust_account(record)?;

                    append_audit(conn, audit(&created)).await?;

                    Ok(created)
                })
            })
            .await
    }

    /// Loads an account by id.
    #[tracing::instrument(skip_all, fields(%account_id))]
    pub async fn get_account(&self, account_id: AccountId) -> Result<Option<TrustAccount>> {
        store::fetch_trust_account_by_id(&mut self.get_conn().await?, account_id.get())
            .await?
            .map(make_trust_account)
            .transpose()
    }

    /// Loads an account by its unique number.
    #[tracing::instrument(skip_all, fields(%account_number))]
    pub async fn get_account_by_number(&self, account_number: &str) -> Result<Option<TrustAccount>> {
        store::fetch_trust_account_by_number(&mut self.get_conn().await?, account_number)
            .await?
            .map(make_trust_account)
            .transpose()
    }

    /// Lists every account newest first.
    #[tracing::instrument(skip_all)]
    pub async fn list_accounts(&self) -> Result<Vec<TrustAccount>> {
        let mut conn = self.get_conn().await?;

        let records = store::stream_trust_accounts(&mut conn).await?.try_collect::<Vec<_>>().await?;

        records.into_iter().map(make_trust_account).collect()
    }

    /// Applies a holder or status patch under a row lock and appends the diff entry.
    #[tracing::instrument(skip_all, fields(%account_id))]
    pub async fn update_account(
        &self,
        account_id: AccountId,
        patch: AccountPatch,
        audit: AuditDiffFn<TrustAccount>,
    ) -> Result<Option<TrustAccount>> {
        self.get_conn()
            .await?
            .transaction(|conn| {
                Box::pin(async move {
                    let Some(old) =
                        store::fetch_trust_account_by_id_for_update(conn, account_id.get()).await?
                    else {
                        return Ok(None);
                    };

                    let old = make_trust_account(old)?;
                    let updated_at = Utc::now();

                    let changes = TrustAccountChangeset::builder()
                        .maybe_holder_name(patch.holder_name())
                        .maybe_status(patch.status().map(From::from))
                        .updated_at(&updated_at)
                        .build();

                    let new = store::update_trust_account_by_id(conn, account_id.get(), changes)
                        .await
                        .map_err(RealtyStoreError::from)
                        .and_then(make_trust_account)?;

                    append_audit(conn, audit(&old, &new)).await?;

                    Ok(Some(new))
                })
            })
            .await
    }

    /// Replaces the balance if the account is active and still holds `expected`.
    ///
    /// Returns `None` without writing anything when the precondition no longer holds.
    #[tracing::instrument(skip_all, fields(%account_id, %expected, %new))]
    pub async fn swap_balance(
        &self,
        account_id: AccountId,
        expected: Balance,
        new: Balance,
        audit: NewAuditEntry,
    ) -> Result<Option<TrustAccount>> {
        self.get_conn()
            .await?
            .transaction(|conn| {
                Box::pin(async move {
                    let updated_at = Utc::now();

                    let Some(record) = store::swap_trust_account_balance_by_id(
                        conn,
                        account_id.get(),
                        expected.get(),
                        new.get(),
                        &updated_at,
                    )
                    .await?
                    else {
                        tracing::debug!("balance precondition no longer holds");
                        return Ok(None);
                    };

                    let account = make_trust_account(record)?;

                    append_audit(conn, audit).await?;

                    Ok(Some(account))
                })
            })
            .await
    }

    /// Records an immutable transaction and appends its creation entry.
    #[tracing::instrument(
        skip_all,
        fields(
            deal_id = %transaction.deal_id(),
            amount = %transaction.amount(),
            transaction_type = %transaction.transaction_type(),
        ),
    )]
    pub async fn create_transaction(
        &self,
        transaction: NewTransaction,
        audit: AuditFn<Transaction>,
    ) -> Result<Transaction> {
        self.get_conn()
            .await?
            .transaction(|conn| {
                Box::pin(async move {
                    let deal_id = transaction.deal_id().to_string();

                    let new_transaction = NewTransactionRecord::builder()
                        .deal_id(&deal_id)
                        .amount(transaction.amount().get())
                        .transaction_type(transaction.transaction_type().into())
                        .status(transaction.status().into())
                        .maybe_from_account(transaction.from_account())
                        .maybe_to_account(transaction.to_account())
                        .maybe_description(transaction.description())
                        .build();

                    let created = store::save_new_transaction(conn, new_transaction)
                        .await
                        .map_err(RealtyStoreError::from)
                        .and_then(make_transaction)?;

                    append_audit(conn, audit(&created)).await?;

                    Ok(created)
                })
            })
            .await
    }

    /// Loads a transaction.
    #[tracing::instrument(skip_all, fields(%transaction_id))]
    pub async fn get_transaction(&self, transaction_id: TransactionId) -> Result<Option<Transaction>> {
        store::fetch_transaction_by_id(&mut self.get_conn().await?, transaction_id.get())
            .await?
            .map(make_transaction)
            .transpose()
    }

    /// Lists transactions newest first, with the total number of matches.
    #[tracing::instrument(skip_all)]
    pub async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: Option<Page>,
    ) -> Result<(Vec<Transaction>, u64)> {
        let deal_id = filter.deal_id.map(|id| id.to_string());

        let (records, total) = store::fetch_transactions(
            &mut self.get_conn().await?,
            deal_id.as_deref(),
            filter.transaction_type.map(From::from),
            page,
        )
        .await?;

        let transactions = records.into_iter().map(make_transaction).collect::<Result<_>>()?;

        Ok((transactions, total))
    }

    /// Lists audit entries newest first, with the total number of matches.
    #[tracing::instrument(skip_all, fields(page = page.page(), page_size = page.page_size()))]
    pub async fn list_audit_entries(
        &self,
        filter: &AuditFilter,
        page: Page,
    ) -> Result<(Vec<AuditLogEntry>, u64)> {
        let (records, total) = store::fetch_audit_records(
            &mut self.get_conn().await?,
            filter.entity_type.map(<&str>::from),
            filter.entity_id.as_deref(),
            page,
        )
        .await?;

        let entries = records.into_iter().map(make_audit_entry).collect::<Result<_>>()?;

        Ok((entries, total))
    }

    async fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().await.map_err(|_| RealtyStoreError::Pool)
    }
}

#[async_trait]
impl LedgerRepository for LedgerStore {
    async fn insert_account(
        &self,
        account: NewTrustAccount,
        audit: AuditFn<TrustAccount>,
    ) -> Result<TrustAccount, LedgerRepositoryError> {
        self.create_account(account, audit).await.map_err(From::from)
    }

    async fn find_account(
        &self,
        id: AccountId,
    ) -> Result<Option<TrustAccount>, LedgerRepositoryError> {
        self.get_account(id).await.map_err(From::from)
    }

    async fn find_account_by_number(
        &self,
        account_number: &str,
    ) -> Result<Option<TrustAccount>, LedgerRepositoryError> {
        self.get_account_by_number(account_number).await.map_err(From::from)
    }

    async fn list_accounts(&self) -> Result<Vec<TrustAccount>, LedgerRepositoryError> {
        LedgerStore::list_accounts(self).await.map_err(From::from)
    }

    async fn update_account(
        &self,
        id: AccountId,
        patch: AccountPatch,
        audit: AuditDiffFn<TrustAccount>,
    ) -> Result<Option<TrustAccount>, LedgerRepositoryError> {
        LedgerStore::update_account(self, id, patch, audit).await.map_err(From::from)
    }

    async fn swap_balance(
        &self,
        id: AccountId,
        expected: Balance,
        new: Balance,
        audit: NewAuditEntry,
    ) -> Result<Option<TrustAccount>, LedgerRepositoryError> {
        LedgerStore::swap_balance(self, id, expected, new, audit).await.map_err(From::from)
    }

    async fn insert_transaction(
        &self,
        transaction: NewTransaction,
        audit: AuditFn<Transaction>,
    ) -> Result<Transaction, LedgerRepositoryError> {
        self.create_transaction(transaction, audit).await.map_err(From::from)
    }

    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, LedgerRepositoryError> {
        self.get_transaction(id).await.map_err(From::from)
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: Option<Page>,
    ) -> Result<(Vec<Transaction>, u64), LedgerRepositoryError> {
        LedgerStore::list_transactions(self, filter, page).await.map_err(From::from)
    }

    async fn list_audit(
        &self,
        filter: &AuditFilter,
        page: Page,
    ) -> Result<(Vec<AuditLogEntry>, u64), LedgerRepositoryError> {
        self.list_audit_entries(filter, page).await.map_err(From::from)
    }
}

async fn append_audit(conn: &mut DbConn, entry: NewAuditEntry) -> Result<()> {
    let NewAuditEntryDissolved { action, entity_type, entity_id, old_value, new_value, context } =
        entry.dissolve();

    let new_audit = NewAuditRecord::builder()
        .action(<&str>::from(action))
        .entity_type(<&str>::from(entity_type))
        .entity_id(&entity_id)
        .maybe_old_value(old_value)
        .maybe_new_value(new_value)
        .maybe_user_id(context.user_id())
        .maybe_ip_address(context.ip_address())
        .build();

    store::save_new_audit_record(conn, new_audit).await.map_err(RealtyStoreError::AuditAppend)
}

fn make_trust_account(record: TrustAccountRecord) -> Result<TrustAccount> {
    let TrustAccountRecordDissolved {
        id,
        account_number,
        holder_name,
        balance,
        status,
        created_at,
        updated_at,
    } = record.dissolve();

    let balance = Balance::new(balance).map_err(RealtyStoreError::invalid_value)?;

    let timestamps = Timestamps::builder().created_at(created_at).updated_at(updated_at).build();

    let account = TrustAccount::builder()
        .id(AccountId::from(id))
        .account_number(account_number)
        .holder_name(holder_name)
        .balance(balance)
        .status(status.into_inner())
        .timestamps(timestamps)
        .build();

    Ok(account)
}

fn make_transaction(record: TransactionRecord) -> Result<Transaction> {
    let TransactionRecordDissolved {
        id,
        deal_id,
        amount,
        transaction_type,
        status,
        from_account,
        to_account,
        description,
        created_at,
    } = record.dissolve();

    let deal_id = DealId::from_str(&deal_id).map_err(RealtyStoreError::invalid_value)?;
    let amount = Amount::new(amount).map_err(RealtyStoreError::invalid_value)?;

    let transaction = Transaction::builder()
        .id(TransactionId::from(id))
        .deal_id(deal_id)
        .amount(amount)
        .transaction_type(transaction_type.into_inner())
        .status(status.into_inner())
        .maybe_from_account(from_account)
        .maybe_to_account(to_account)
        .maybe_description(description)
        .created_at(created_at)
        .build();

    Ok(transaction)
}

fn make_audit_entry(record: AuditRecord) -> Result<AuditLogEntry> {
    let AuditRecordDissolved {
        id,
        action,
        entity_type,
        entity_id,
        old_value,
        new_value,
        user_id,
        ip_address,
        created_at,
    } = record.dissolve();

    let entry = AuditLogEntry::builder()
        .id(AuditEntryId::from(id))
        .action(action.parse().map_err(RealtyStoreError::invalid_value)?)
        .entity_type(entity_type.parse().map_err(RealtyStoreError::invalid_value)?)
        .entity_id(entity_id)
        .maybe_old_value(old_value)
        .maybe_new_value(new_value)
        .maybe_user_id(user_id)
        .maybe_ip_address(ip_address)
        .created_at(created_at)
        .build();

    Ok(entry)
}

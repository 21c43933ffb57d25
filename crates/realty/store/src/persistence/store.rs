mod error;

pub use self::error::StoreError;

use chrono::{DateTime, Utc};
use diesel::{ExpressionMethods, QueryDsl, pg::Pg, result::OptionalExtension, upsert};
use diesel_async::RunQueryDsl;
use futures::{Stream, TryStreamExt};
use realty_domain::{deal::DealStatus, ledger::AccountStatus};
use realty_engine::port::Page;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{
    pool::DbConn,
    record::{
        AccountStatusRecord, DealStatusRecord, PropertyStatusRecord, TransactionTypeRecord,
        insert::{
            DealChangeset, NewAuditRecord, NewDealRecord, NewPropertyRecord, NewTransactionRecord,
            NewTrustAccountRecord, NewUserRecord, TrustAccountChangeset,
        },
        select::{AuditRecord, TransactionRecord, TrustAccountRecord},
    },
    schema,
};

use self::error::Result;

pub async fn fetch_user_doc_by_id(conn: &mut DbConn, id: &str) -> Result<Option<Value>> {
    schema::app_user::table
        .filter(schema::app_user::id.eq(id))
        .select(schema::app_user::doc)
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

pub async fn upsert_user(conn: &mut DbConn, new_user: NewUserRecord<'_>) -> Result<()> {
    diesel::insert_into(schema::app_user::table)
        .values(new_user)
        .on_conflict(schema::app_user::id)
        .do_update()
        .set(schema::app_user::doc.eq(upsert::excluded(schema::app_user::doc)))
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn upsert_property(conn: &mut DbConn, new_property: NewPropertyRecord<'_>) -> Result<()> {
    diesel::insert_into(schema::property::table)
        .values(new_property)
        .on_conflict(schema::property::id)
        .do_update()
        .set((
            schema::property::status.eq(upsert::excluded(schema::property::status)),
            schema::property::updated_at.eq(upsert::excluded(schema::property::updated_at)),
        ))
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn fetch_property_status_by_id(
    conn: &mut DbConn,
    id: &str,
) -> Result<Option<PropertyStatusRecord>> {
    schema::property::table
        .filter(schema::property::id.eq(id))
        .select(schema::property::status)
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

pub async fn update_property_status_by_id(
    conn: &mut DbConn,
    id: &str,
    status: PropertyStatusRecord,
    updated_at: &DateTime<Utc>,
) -> Result<bool> {
    let affected = diesel::update(schema::property::table.filter(schema::property::id.eq(id)))
        .set((schema::property::status.eq(status), schema::property::updated_at.eq(updated_at)))
        .execute(conn)
        .await?;

    Ok(affected == 1)
}

pub async fn save_new_deal(conn: &mut DbConn, new_deal: NewDealRecord<'_>) -> Result<()> {
    diesel::insert_into(schema::deal::table).values(new_deal).execute(conn).await?;

    Ok(())
}

pub async fn fetch_deal_doc_by_id(conn: &mut DbConn, id: &str) -> Result<Option<Value>> {
    schema::deal::table
        .filter(schema::deal::id.eq(id))
        .select(schema::deal::doc)
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

/// Locks the deal row until the surrounding transaction ends.
pub async fn fetch_deal_doc_by_id_for_update(conn: &mut DbConn, id: &str) -> Result<Option<Value>> {
    schema::deal::table
        .filter(schema::deal::id.eq(id))
        .select(schema::deal::doc)
        .for_update()
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

pub async fn fetch_deal_status_by_id(
    conn: &mut DbConn,
    id: &str,
) -> Result<Option<DealStatusRecord>> {
    schema::deal::table
        .filter(schema::deal::id.eq(id))
        .select(schema::deal::status)
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

pub async fn fetch_deal_docs(
    conn: &mut DbConn,
    status: Option<DealStatusRecord>,
    property_id: Option<&str>,
    page: Page,
) -> Result<(Vec<Value>, u64)> {
    let deals_matching = || {
        let mut query = schema::deal::table.into_boxed::<Pg>();

        if let Some(status) = status {
            query = query.filter(schema::deal::status.eq(status));
        }

        if let Some(property_id) = property_id {
            query = query.filter(schema::deal::property_id.eq(property_id));
        }

        query
    };

    let total = deals_matching().count().get_result::<i64>(conn).await?;
    let (limit, offset) = bounds(page)?;

    let docs = deals_matching()
        .select(schema::deal::doc)
        .order((schema::deal::created_at.desc(), schema::deal::id.desc()))
        .limit(limit)
        .offset(offset)
        .load(conn)
        .await?;

    Ok((docs, count(total)?))
}

pub async fn update_deal_by_id(
    conn: &mut DbConn,
    id: &str,
    changes: DealChangeset<'_>,
) -> Result<bool> {
    let affected = diesel::update(schema::deal::table.filter(schema::deal::id.eq(id)))
        .set(changes)
        .execute(conn)
        .await?;

    Ok(affected == 1)
}

/// Deletes the deal only while it is still a draft.
pub async fn delete_draft_deal_by_id(conn: &mut DbConn, id: &str) -> Result<bool> {
    let affected = diesel::delete(
        schema::deal::table
            .filter(schema::deal::id.eq(id))
            .filter(schema::deal::status.eq(DealStatusRecord::from(DealStatus::Draft))),
    )
    .execute(conn)
    .await?;

    Ok(affected == 1)
}

pub async fn save_new_trust_account(
    conn: &mut DbConn,
    new_account: NewTrustAccountRecord<'_>,
) -> Result<TrustAccountRecord> {
    diesel::insert_into(schema::trust_account::table)
        .values(new_account)
        .returning(schema::trust_account::all_columns)
        .get_result(conn)
        .await
        .map_err(From::from)
}

pub async fn fetch_trust_account_by_id(
    conn: &mut DbConn,
    id: i64,
) -> Result<Option<TrustAccountRecord>> {
    schema::trust_account::table
        .find(id)
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

pub async fn fetch_trust_account_by_id_for_update(
    conn: &mut DbConn,
    id: i64,
) -> Result<Option<TrustAccountRecord>> {
    schema::trust_account::table
        .find(id)
        .for_update()
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

pub async fn fetch_trust_account_by_number(
    conn: &mut DbConn,
    account_number: &str,
) -> Result<Option<TrustAccountRecord>> {
    schema::trust_account::table
        .filter(schema::trust_account::account_number.eq(account_number))
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

pub async fn stream_trust_accounts(
    conn: &mut DbConn,
) -> Result<impl Stream<Item = Result<TrustAccountRecord>>> {
    let stream = schema::trust_account::table
        .select(schema::trust_account::all_columns)
        .order((schema::trust_account::created_at.desc(), schema::trust_account::id.desc()))
        .load_stream(conn)
        .await?
        .map_err(From::from);

    Ok(stream)
}

pub async fn update_trust_account_by_id(
    conn: &mut DbConn,
    id: i64,
    changes: TrustAccountChangeset<'_>,
) -> Result<TrustAccountRecord> {
    diesel::update(schema::trust_account::table.find(id))
        .set(changes)
        .returning(schema::trust_account::all_columns)
        .get_result(conn)
        .await
        .map_err(From::from)
}

/// Writes `new` only if the account is active and its balance still equals `expected`.
pub async fn swap_trust_account_balance_by_id(
    conn: &mut DbConn,
    id: i64,
    expected: Decimal,
    new: Decimal,
    updated_at: &DateTime<Utc>,
) -> Result<Option<TrustAccountRecord>> {
    diesel::update(
        schema::trust_account::table
            .filter(schema::trust_account::id.eq(id))
            .filter(schema::trust_account::balance.eq(expected))
            .filter(
                schema::trust_account::status.eq(AccountStatusRecord::from(AccountStatus::Active)),
            ),
    )
    .set((
        schema::trust_account::balance.eq(new),
        schema::trust_account::updated_at.eq(updated_at),
    ))
    .returning(schema::trust_account::all_columns)
    .get_result(conn)
    .await
    .optional()
    .map_err(From::from)
}

pub async fn save_new_transaction(
    conn: &mut DbConn,
    new_transaction: NewTransactionRecord<'_>,
) -> Result<TransactionRecord> {
    diesel::insert_into(schema::ledger_transaction::table)
        .values(new_transaction)
        .returning(schema::ledger_transaction::all_columns)
        .get_result(conn)
        .await
        .map_err(From::from)
}

pub async fn fetch_transaction_by_id(
    conn: &mut DbConn,
    id: i64,
) -> Result<Option<TransactionRecord>> {
    schema::ledger_transaction::table
        .find(id)
        .first(conn)
        .await
        .optional()
        .map_err(From::from)
}

pub async fn fetch_transactions(
    conn: &mut DbConn,
    deal_id: Option<&str>,
    transaction_type: Option<TransactionTypeRecord>,
    page: Option<Page>,
) -> Result<(Vec<TransactionRecord>, u64)> {
    let transactions_matching = || {
        let mut query = schema::ledger_transaction::table.into_boxed::<Pg>();

        if let Some(deal_id) = deal_id {
            query = query.filter(schema::ledger_transaction::deal_id.eq(deal_id));
        }

        if let Some(transaction_type) = transaction_type {
            query = query.filter(schema::ledger_transaction::transaction_type.eq(transaction_type));
        }

        query
    };

    let total = transactions_matching().count().get_result::<i64>(conn).await?;

    let mut query = transactions_matching()
        .select(schema::ledger_transaction::all_columns)
        .order((
            schema::ledger_transaction::created_at.desc(),
            schema::ledger_transaction::id.desc(),
        ));

    if let Some(page) = page {
        let (limit, offset) = bounds(page)?;
        query = query.limit(limit).offset(offset);
    }

    Ok((query.load(conn).await?, count(total)?))
}

pub async fn save_new_audit_record(conn: &mut DbConn, new_audit: NewAuditRecord<'_>) -> Result<()> {
    diesel::insert_into(schema::audit_log::table).values(new_audit).execute(conn).await?;

    Ok(())
}

pub async fn fetch_audit_records(
    conn: &mut DbConn,
    entity_type: Option<&str>,
    entity_id: Option<&str>,
    page: Page,
) -> Result<(Vec<AuditRecord>, u64)> {
    let audit_matching = || {
        let mut query = schema::audit_log::table.into_boxed::<Pg>();

        if let Some(entity_type) = entity_type {
            query = query.filter(schema::audit_log::entity_type.eq(entity_type));
        }

        if let Some(entity_id) = entity_id {
            query = query.filter(schema::audit_log::entity_id.eq(entity_id));
        }

        query
    };

    let total = audit_matching().count().get_result::<i64>(conn).await?;
    let (limit, offset) = bounds(page)?;

    let records = audit_matching()
        .select(schema::audit_log::all_columns)
        .order((schema::audit_log::created_at.desc(), schema::audit_log::id.desc()))
        .limit(limit)
        .offset(offset)
        .load(conn)
        .await?;

    Ok((records, count(total)?))
}

fn bounds(page: Page) -> Result<(i64, i64)> {
    let limit = i64::try_from(page.limit()).map_err(|e| StoreError::other(e.to_string()))?;
    let offset = i64::try_from(page.offset()).map_err(|e| StoreError::other(e.to_string()))?;

    Ok((limit, offset))
}

fn count(total: i64) -> Result<u64> {
    u64::try_from(total).map_err(|e| StoreError::other(e.to_string()))
}

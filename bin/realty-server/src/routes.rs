use core::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use itertools::Itertools;
use realty_domain::{
    audit::AuditEntity,
    condition::NewCondition,
    deal::{Deal, DealStatus},
    id::{ConditionId, DealId, PropertyId, UserId},
    ledger::{AccountId, Transaction, TransactionId, TransactionType, TrustAccount},
    participant::ParticipantRefs,
};
use realty_engine::request::{
    AddConditionRequest, AuditLogRequest, CreateAccountRequest, CreateDealRequest,
    ListDealsRequest, ListTransactionsRequest, RecordTransactionRequest, TransitionDealRequest,
    UpdateAccountRequest, UpdateBalanceRequest, UpdateConditionRequest, UpdateDealRequest,
};

use crate::{
    App, AppDissolved,
    error::AppError,
    extract::AuditOrigin,
    payload::{
        request::{
            AuditLogQueryPayload, AuditLogQueryPayloadDissolved, CreateDealRequestPayload,
            CreateDealRequestPayloadDissolved, CreateTransactionRequestPayload,
            CreateTransactionRequestPayloadDissolved, CreateTrustAccountRequestPayload,
            CreateTrustAccountRequestPayloadDissolved, ListDealsQueryPayload,
            ListDealsQueryPayloadDissolved, ListTransactionsQueryPayload,
            ListTransactionsQueryPayloadDissolved, TransitionDealRequestPayload,
            TransitionDealRequestPayloadDissolved, UpdateBalanceRequestPayload,
            UpdateBalanceRequestPayloadDissolved, UpdateConditionRequestPayload,
            UpdateConditionRequestPayloadDissolved, UpdateDealRequestPayload,
            UpdateDealRequestPayloadDissolved, UpdateTrustAccountRequestPayload,
            UpdateTrustAccountRequestPayloadDissolved,
        },
        response::{
            AuditLogResponsePayload, ListDealsResponsePayload, ListTransactionsResponsePayload,
            ListTrustAccountsResponsePayload,
        },
    },
};

#[tracing::instrument]
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// DEALS
// ================================================================================================

#[tracing::instrument(skip_all)]
pub async fn create_deal(
    State(app): State<App>,
    Json(payload): Json<CreateDealRequestPayload>,
) -> Result<(StatusCode, Json<Deal>), AppError> {
    let AppDissolved { deals, .. } = app.dissolve();

    let CreateDealRequestPayloadDissolved {
        property_id,
        offer_price,
        participants,
        conditions,
        closing_date,
        notes,
    } = payload.dissolve();

    let participants: ParticipantRefs = participants
        .into_iter()
        .map(|(role, user_id)| {
            parse_id::<UserId>("participant user id", &user_id).map(|user_id| (role, user_id))
        })
        .try_collect()?;

    let request = CreateDealRequest::builder()
        .property_id(parse_id::<PropertyId>("property_id", &property_id)?)
        .offer_price(offer_price)
        .participants(participants)
        .conditions(conditions)
        .maybe_closing_date(closing_date)
        .maybe_notes(notes)
        .build()?;

    let deal = deals.create(request).await?;

    Ok((StatusCode::CREATED, Json(deal)))
}

#[tracing::instrument(skip_all)]
pub async fn list_deals(
    State(app): State<App>,
    Query(query): Query<ListDealsQueryPayload>,
) -> Result<Json<ListDealsResponsePayload>, AppError> {
    let AppDissolved { deals, .. } = app.dissolve();

    let ListDealsQueryPayloadDissolved { status, property_id, page, page_size } = query.dissolve();

    let request = ListDealsRequest::builder()
        .maybe_status(parse_filter::<DealStatus>("status", status)?)
        .maybe_property_id(property_id.as_deref().map(|id| parse_id("property_id", id)).transpose()?)
        .maybe_page(page)
        .maybe_page_size(page_size)
        .build()?;

    let response = deals.list(request).await?.into();

    Ok(Json(response))
}

#[tracing::instrument(skip_all, fields(%deal_id))]
pub async fn get_deal(
    State(app): State<App>,
    Path(deal_id): Path<String>,
) -> Result<Json<Deal>, AppError> {
    let AppDissolved { deals, .. } = app.dissolve();

    let deal = deals.get(parse_id("deal_id", &deal_id)?).await?;

    Ok(Json(deal))
}

#[tracing::instrument(skip_all, fields(%deal_id))]
pub async fn update_deal(
    State(app): State<App>,
    Path(deal_id): Path<String>,
    Json(payload): Json<UpdateDealRequestPayload>,
) -> Result<Json<Deal>, AppError> {
    let AppDissolved { deals, .. } = app.dissolve();

    let UpdateDealRequestPayloadDissolved { offer_price, closing_date, notes } = payload.dissolve();

    let request = UpdateDealRequest::builder()
        .deal_id(parse_id("deal_id", &deal_id)?)
        .maybe_offer_price(offer_price)
        .maybe_closing_date(closing_date)
        .maybe_notes(notes)
        .build()?;

    let deal = deals.update_details(request).await?;

    Ok(Json(deal))
}

#[tracing::instrument(skip_all, fields(%deal_id))]
pub async fn transition_deal(
    State(app): State<App>,
    Path(deal_id): Path<String>,
    Json(payload): Json<TransitionDealRequestPayload>,
) -> Result<Json<Deal>, AppError> {
    let AppDissolved { deals, .. } = app.dissolve();

    let TransitionDealRequestPayloadDissolved { status, note } = payload.dissolve();

    let request = TransitionDealRequest::builder()
        .deal_id(parse_id("deal_id", &deal_id)?)
        .status(status)
        .maybe_note(note)
        .build()?;

    let deal = deals.transition(request).await?;

    Ok(Json(deal))
}

#[tracing::instrument(skip_all, fields(%deal_id))]
pub async fn add_condition(
    State(app): State<App>,
    Path(deal_id): Path<String>,
    Json(condition): Json<NewCondition>,
) -> Result<Json<Deal>, AppError> {
    let AppDissolved { deals, .. } = app.dissolve();

    let request = AddConditionRequest::builder()
        .deal_id(parse_id("deal_id", &deal_id)?)
        .condition(condition)
        .build();

    let deal = deals.add_condition(request).await?;

    Ok(Json(deal))
}

#[tracing::instrument(skip_all, fields(%deal_id, %condition_id))]
pub async fn update_condition(
    State(app): State<App>,
    Path((deal_id, condition_id)): Path<(String, String)>,
    Json(payload): Json<UpdateConditionRequestPayload>,
) -> Result<Json<Deal>, AppError> {
    let AppDissolved { deals, .. } = app.dissolve();

    let UpdateConditionRequestPayloadDissolved { status, description } = payload.dissolve();

    let request = UpdateConditionRequest::builder()
        .deal_id(parse_id("deal_id", &deal_id)?)
        .condition_id(parse_id::<ConditionId>("condition_id", &condition_id)?)
        .status(status)
        .maybe_description(description)
        .build()?;

    let deal = deals.update_condition(request).await?;

    Ok(Json(deal))
}

#[tracing::instrument(skip_all, fields(%deal_id))]
pub async fn delete_deal(
    State(app): State<App>,
    Path(deal_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let AppDissolved { deals, .. } = app.dissolve();

    deals.delete(parse_id("deal_id", &deal_id)?).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip_all, fields(%deal_id))]
pub async fn deal_transactions(
    State(app): State<App>,
    Path(deal_id): Path<String>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let AppDissolved { ledger, .. } = app.dissolve();

    let transactions = ledger.deal_transactions(parse_id::<DealId>("deal_id", &deal_id)?).await?;

    Ok(Json(transactions))
}

// LEDGER
// ================================================================================================

#[tracing::instrument(skip_all)]
pub async fn record_transaction(
    State(app): State<App>,
    AuditOrigin(context): AuditOrigin,
    Json(payload): Json<CreateTransactionRequestPayload>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let AppDissolved { ledger, .. } = app.dissolve();

    let CreateTransactionRequestPayloadDissolved {
        deal_id,
        amount,
        transaction_type,
        status,
        from_account,
        to_account,
        description,
    } = payload.dissolve();

    let request = RecordTransactionRequest::builder()
        .deal_id(parse_id("deal_id", &deal_id)?)
        .amount(amount)
        .transaction_type(transaction_type)
        .maybe_status(status)
        .maybe_from_account(from_account)
        .maybe_to_account(to_account)
        .maybe_description(description)
        .context(context)
        .build()?;

    let transaction = ledger.record_transaction(request).await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

#[tracing::instrument(skip_all)]
pub async fn list_transactions(
    State(app): State<App>,
    Query(query): Query<ListTransactionsQueryPayload>,
) -> Result<Json<ListTransactionsResponsePayload>, AppError> {
    let AppDissolved { ledger, .. } = app.dissolve();

    let ListTransactionsQueryPayloadDissolved { deal_id, transaction_type, page, page_size } =
        query.dissolve();

    let request = ListTransactionsRequest::builder()
        .maybe_deal_id(deal_id.as_deref().map(|id| parse_id("deal_id", id)).transpose()?)
        .maybe_transaction_type(parse_filter::<TransactionType>("type", transaction_type)?)
        .maybe_page(page)
        .maybe_page_size(page_size)
        .build()?;

    let response = ledger.list_transactions(request).await?.into();

    Ok(Json(response))
}

#[tracing::instrument(skip_all, fields(%transaction_id))]
pub async fn get_transaction(
    State(app): State<App>,
    Path(transaction_id): Path<String>,
) -> Result<Json<Transaction>, AppError> {
    let AppDissolved { ledger, .. } = app.dissolve();

    let transaction = ledger
        .get_transaction(parse_id::<TransactionId>("transaction_id", &transaction_id)?)
        .await?;

    Ok(Json(transaction))
}

#[tracing::instrument(skip_all)]
pub async fn create_trust_account(
    State(app): State<App>,
    AuditOrigin(context): AuditOrigin,
    Json(payload): Json<CreateTrustAccountRequestPayload>,
) -> Result<(StatusCode, Json<TrustAccount>), AppError> {
    let AppDissolved { ledger, .. } = app.dissolve();

    let CreateTrustAccountRequestPayloadDissolved { account_number, holder_name, initial_balance } =
        payload.dissolve();

    let request = CreateAccountRequest::builder()
        .account_number(account_number)
        .holder_name(holder_name)
        .initial_balance(initial_balance)
        .context(context)
        .build()?;

    let account = ledger.create_account(request).await?;

    Ok((StatusCode::CREATED, Json(account)))
}

#[tracing::instrument(skip_all)]
pub async fn list_trust_accounts(
    State(app): State<App>,
) -> Result<Json<ListTrustAccountsResponsePayload>, AppError> {
    let AppDissolved { ledger, .. } = app.dissolve();

    let accounts = ledger.list_accounts().await?;
    let total = accounts.len() as u64;

    let response = ListTrustAccountsResponsePayload::builder().accounts(accounts).total(total).build();

    Ok(Json(response))
}

#[tracing::instrument(skip_all, fields(%account_id))]
pub async fn get_trust_account(
    State(app): State<App>,
    Path(account_id): Path<String>,
) -> Result<Json<TrustAccount>, AppError> {
    let AppDissolved { ledger, .. } = app.dissolve();

    let account = ledger.get_account(parse_id::<AccountId>("account_id", &account_id)?).await?;

    Ok(Json(account))
}

#[tracing::instrument(skip_all, fields(%account_id))]
pub async fn update_trust_account(
    State(app): State<App>,
    Path(account_id): Path<String>,
    AuditOrigin(context): AuditOrigin,
    Json(payload): Json<UpdateTrustAccountRequestPayload>,
) -> Result<Json<TrustAccount>, AppError> {
    let AppDissolved { ledger, .. } = app.dissolve();

    let UpdateTrustAccountRequestPayloadDissolved { holder_name, status } = payload.dissolve();

    let request = UpdateAccountRequest::builder()
        .account_id(parse_id("account_id", &account_id)?)
        .maybe_holder_name(holder_name)
        .maybe_status(status)
        .context(context)
        .build()?;

    let account = ledger.update_account(request).await?;

    Ok(Json(account))
}

#[tracing::instrument(skip_all, fields(%account_id))]
pub async fn update_balance(
    State(app): State<App>,
    Path(account_id): Path<String>,
    AuditOrigin(context): AuditOrigin,
    Json(payload): Json<UpdateBalanceRequestPayload>,
) -> Result<Json<TrustAccount>, AppError> {
    let AppDissolved { ledger, .. } = app.dissolve();

    let UpdateBalanceRequestPayloadDissolved { amount, direction } = payload.dissolve();

    let request = UpdateBalanceRequest::builder()
        .account_id(parse_id("account_id", &account_id)?)
        .amount(amount)
        .direction(direction)
        .context(context)
        .build()?;

    let account = ledger.update_balance(request).await?;

    Ok(Json(account))
}

#[tracing::instrument(skip_all)]
pub async fn audit_log(
    State(app): State<App>,
    Query(query): Query<AuditLogQueryPayload>,
) -> Result<Json<AuditLogResponsePayload>, AppError> {
    let AppDissolved { ledger, .. } = app.dissolve();

    let AuditLogQueryPayloadDissolved { entity_type, entity_id, page, page_size } =
        query.dissolve();

    let request = AuditLogRequest::builder()
        .maybe_entity_type(parse_filter::<AuditEntity>("entity_type", entity_type)?)
        .maybe_entity_id(entity_id)
        .maybe_page(page)
        .maybe_page_size(page_size)
        .build()?;

    let response = ledger.audit_log(request).await?.into();

    Ok(Json(response))
}

fn parse_id<T>(field: &'static str, value: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.parse().map_err(|e| AppError::invalid_id(field, e))
}

fn parse_filter<T>(field: &'static str, value: Option<String>) -> Result<Option<T>, AppError>
where
    T: FromStr,
{
    let Some(value) = value else {
        return Ok(None);
    };

    match value.parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(AppError::InvalidFilter { field, value }),
    }
}

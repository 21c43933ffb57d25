use async_trait::async_trait;
use chrono::Utc;
use diesel_async::AsyncConnection;
use realty_domain::{
    deal::Deal,
    id::{DealId, PropertyId, UserId},
    participant::UserRecord,
    property::PropertyStatus,
};
use realty_engine::port::{
    DealFilter, DealMutation, DealMutationOutcome, DealRepository, DeleteOutcome, Page,
    PropertyDirectory, RepositoryError, UserDirectory,
};

use crate::{
    error::{RealtyStoreError, Result},
    persistence::{
        pool::{DbConn, DbPool},
        record::insert::{DealChangeset, NewDealRecord, NewPropertyRecord, NewUserRecord},
        store,
    },
};

/// Deal documents together with the user and property records deals refer to.
///
/// A deal is stored whole as a JSONB document. Its status, property and timestamps are mirrored
/// into plain columns so listings can filter and order without touching the document.
pub struct DocumentStore {
    pool: DbPool,
}

impl DocumentStore {
    /// Creates a new `DocumentStore` over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        DocumentStore { pool }
    }
}

impl DocumentStore {
    /// Adds or replaces a user record.
    #[tracing::instrument(skip_all, fields(user_id = %user.id()))]
    pub async fn put_user(&self, user: &UserRecord) -> Result<()> {
        let id = user.id().to_string();
        let new_user = NewUserRecord::builder().id(&id).doc(serde_json::to_value(user)?).build();

        store::upsert_user(&mut self.get_conn().await?, new_user).await?;

        Ok(())
    }

    /// Loads a user record.
    #[tracing::instrument(skip_all, fields(%user_id))]
    pub async fn get_user(&self, user_id: UserId) -> Result<Option<UserRecord>> {
        store::fetch_user_doc_by_id(&mut self.get_conn().await?, &user_id.to_string())
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(From::from)
    }

    /// Adds or replaces a property with the given listing status.
    #[tracing::instrument(skip_all, fields(%property_id, %status))]
    pub async fn put_property(&self, property_id: PropertyId, status: PropertyStatus) -> Result<()> {
        let id = property_id.to_string();
        let now = Utc::now();

        let new_property =
            NewPropertyRecord::builder().id(&id).status(status.into()).updated_at(&now).build();

        store::upsert_property(&mut self.get_conn().await?, new_property).await?;

        Ok(())
    }

    /// Returns the listing status of a property.
    #[tracing::instrument(skip_all, fields(%property_id))]
    pub async fn get_property_status(&self, property_id: PropertyId) -> Result<Option<PropertyStatus>> {
        let status = store::fetch_property_status_by_id(
            &mut self.get_conn().await?,
            &property_id.to_string(),
        )
        .await?;

        Ok(status.map(|s| s.into_inner()))
    }

    /// Sets the listing status of a property. Returns `false` if no such property exists.
    #[tracing::instrument(skip_all, fields(%property_id, %status))]
    pub async fn set_property_status(
        &self,
        property_id: PropertyId,
        status: PropertyStatus,
    ) -> Result<bool> {
        store::update_property_status_by_id(
            &mut self.get_conn().await?,
            &property_id.to_string(),
            status.into(),
            &Utc::now(),
        )
        .await
        .map_err(From::from)
    }

    /// Stores a new deal document.
    #[tracing::instrument(skip_all, fields(deal_id = %deal.id(), property_id = %deal.property_id()))]
    pub async fn create_deal(&self, deal: &Deal) -> Result<()> {
        let id = deal.id().to_string();
        let property_id = deal.property_id().to_string();
        let created_at = deal.timestamps().created_at();
        let updated_at = deal.timestamps().updated_at();

        let new_deal = NewDealRecord::builder()
            .id(&id)
            .property_id(&property_id)
            .status(deal.status().into())
            .doc(serde_json::to_value(deal)?)
            .created_at(&created_at)
            .updated_at(&updated_at)
            .build();

        store::save_new_deal(&mut self.get_conn().await?, new_deal).await?;

        Ok(())
    }

    /// Loads a deal document.
    #[tracing::instrument(skip_all, fields(%deal_id))]
    pub async fn get_deal(&self, deal_id: DealId) -> Result<Option<Deal>> {
        store::fetch_deal_doc_by_id(&mut self.get_conn().await?, &deal_id.to_string())
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(From::from)
    }

    /// Lists deals newest first, with the total number of matches.
    #[tracing::instrument(skip_all, fields(page = page.page(), page_size = page.page_size()))]
    pub async fn list_deals(&self, filter: &DealFilter, page: Page) -> Result<(Vec<Deal>, u64)> {
        let property_id = filter.property_id.map(|id| id.to_string());

        let (docs, total) = store::fetch_deal_docs(
            &mut self.get_conn().await?,
            filter.status.map(From::from),
            property_id.as_deref(),
            page,
        )
        .await?;

        let deals = docs
            .into_iter()
            .map(serde_json::from_value)
            .collect::<core::result::Result<_, _>>()?;

        Ok((deals, total))
    }

    /// Applies `mutation` to the deal under a row lock and writes the result back.
    ///
    /// A rejected mutation commits nothing.
    #[tracing::instrument(skip_all, fields(%deal_id))]
    pub async fn mutate_deal(
        &self,
        deal_id: DealId,
        mutation: DealMutation,
    ) -> Result<DealMutationOutcome> {
        let id = deal_id.to_string();

        self.get_conn()
            .await?
            .transaction(|conn| {
                Box::pin(async move {
                    let Some(doc) = store::fetch_deal_doc_by_id_for_update(conn, &id).await? else {
                        return Ok(DealMutationOutcome::NotFound);
                    };

                    let mut deal = serde_json::from_value::<Deal>(doc)?;

                    if let Err(err) = mutation(&mut deal) {
                        tracing::debug!(%err, "deal mutation rejected");
                        return Ok(DealMutationOutcome::Rejected(err));
                    }

                    let updated_at = deal.timestamps().updated_at();

                    let changes = DealChangeset::builder()
                        .status(deal.status().into())
                        .doc(serde_json::to_value(&deal)?)
                        .updated_at(&updated_at)
                        .build();

                    store::update_deal_by_id(conn, &id, changes).await?;

                    Ok(DealMutationOutcome::Applied(deal))
                })
            })
            .await
    }

    /// Removes a deal if, and only if, it is still a draft.
    #[tracing::instrument(skip_all, fields(%deal_id))]
    pub async fn delete_draft_deal(&self, deal_id: DealId) -> Result<DeleteOutcome> {
        let id = deal_id.to_string();

        self.get_conn()
            .await?
            .transaction(|conn| {
                Box::pin(async move {
                    if store::delete_draft_deal_by_id(conn, &id).await? {
                        return Ok(DeleteOutcome::Deleted);
                    }

                    let outcome = store::fetch_deal_status_by_id(conn, &id)
                        .await?
                        .map_or(DeleteOutcome::NotFound, |s| DeleteOutcome::NotDraft(s.into_inner()));

                    Ok(outcome)
                })
            })
            .await
    }

    async fn get_conn(&self) -> Result<DbConn> {
        self.pool.get().await.map_err(|_| RealtyStoreError::Pool)
    }
}

#[async_trait]
impl UserDirectory for DocumentStore {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        self.get_user(id).await.map_err(From::from)
    }
}

#[async_trait]
impl PropertyDirectory for DocumentStore {
    async fn set_status(
        &self,
        id: PropertyId,
        status: PropertyStatus,
    ) -> Result<bool, RepositoryError> {
        self.set_property_status(id, status).await.map_err(From::from)
    }
}

#[async_trait]
impl DealRepository for DocumentStore {
    async fn insert(&self, deal: &Deal) -> Result<(), RepositoryError> {
        self.create_deal(deal).await.map_err(From::from)
    }

    async fn find(&self, id: DealId) -> Result<Option<Deal>, RepositoryError> {
        self.get_deal(id).await.map_err(From::from)
    }

    async fn list(
        &self,
        filter: &DealFilter,
        page: Page,
    ) -> Result<(Vec<Deal>, u64), RepositoryError> {
        self.list_deals(filter, page).await.map_err(From::from)
    }

    async fn mutate(
        &self,
        id: DealId,
        mutation: DealMutation,
    ) -> Result<DealMutationOutcome, RepositoryError> {
        self.mutate_deal(id, mutation).await.map_err(From::from)
    }

    async fn delete_draft(&self, id: DealId) -> Result<DeleteOutcome, RepositoryError> {
        self.delete_draft_deal(id).await.map_err(From::from)
    }
}

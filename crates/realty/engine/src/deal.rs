//! The deal state machine and condition tracker.

use std::sync::Arc;

use chrono::Utc;
use realty_domain::{
    condition::ConditionStatus,
    deal::{Deal, DealStatus},
    id::DealId,
    property::PropertyCommand,
};

use crate::{
    error::DealEngineError,
    port::{
        DealMutation, DealMutationOutcome, DealRepository, DeleteOutcome, PropertySync,
        UserDirectory,
    },
    snapshot::SnapshotBuilder,
    types::{
        request::{
            AddConditionRequest, AddConditionRequestDissolved, CreateDealRequest,
            CreateDealRequestDissolved, ListDealsRequest, ListDealsRequestDissolved,
            TransitionDealRequest, TransitionDealRequestDissolved, UpdateConditionRequest,
            UpdateConditionRequestDissolved, UpdateDealRequest, UpdateDealRequestDissolved,
        },
        response::Paginated,
    },
};

pub type Result<T, E = DealEngineError> = core::result::Result<T, E>;

/// Drives deals through their lifecycle.
///
/// Every mutation is handed to the [`DealRepository`] as a closure and applied to the whole
/// deal document atomically, so a status check and the write it guards never interleave with
/// another request on the same deal.
#[derive(Clone)]
pub struct DealEngine {
    deals: Arc<dyn DealRepository>,
    snapshots: SnapshotBuilder,
    property_sync: Arc<dyn PropertySync>,
}

#[bon::bon]
impl DealEngine {
    /// Creates an engine over the given stores.
    #[builder]
    pub fn new(
        deals: Arc<dyn DealRepository>,
        users: Arc<dyn UserDirectory>,
        property_sync: Arc<dyn PropertySync>,
    ) -> Self {
        Self { deals, snapshots: SnapshotBuilder::new(users), property_sync }
    }
}

impl DealEngine {
    /// Opens a new deal in draft.
    ///
    /// The participant snapshot is taken before the deal is persisted. Unknown participants
    /// degrade to unresolved snapshot entries instead of failing the creation.
    #[tracing::instrument(skip_all)]
    pub async fn create(&self, request: CreateDealRequest) -> Result<Deal> {
        let CreateDealRequestDissolved {
            property_id,
            offer_price,
            participants,
            conditions,
            closing_date,
            notes,
        } = request.dissolve();

        let participants_snapshot = self.snapshots.build(&participants).await?;
        let now = Utc::now();

        let deal = Deal::builder()
            .property_id(property_id)
            .offer_price(offer_price)
            .participant_refs(participants)
            .participants_snapshot(participants_snapshot)
            .snapshot_timestamp(now)
            .conditions(conditions)
            .maybe_closing_date(closing_date)
            .maybe_notes(notes)
            .now(now)
            .build();

        self.deals.insert(&deal).await?;

        tracing::info!(deal_id = %deal.id(), %property_id, "deal created");

        Ok(deal)
    }

    /// Loads a deal.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, deal_id: DealId) -> Result<Deal> {
        self.deals.find(deal_id).await?.ok_or(DealEngineError::NotFound(deal_id))
    }

    /// Lists deals newest first.
    #[tracing::instrument(skip_all)]
    pub async fn list(&self, request: ListDealsRequest) -> Result<Paginated<Deal>> {
        let ListDealsRequestDissolved { filter, page } = request.dissolve();

        let (items, total) = self.deals.list(&filter, page).await?;

        Ok(Paginated::builder().items(items).total(total).page(page).build())
    }

    /// Patches offer price, closing date or notes. Status and history are left alone.
    #[tracing::instrument(skip_all)]
    pub async fn update_details(&self, request: UpdateDealRequest) -> Result<Deal> {
        let UpdateDealRequestDissolved { deal_id, patch } = request.dissolve();

        self.mutate(
            deal_id,
            Box::new(move |deal| {
                deal.apply_details(patch, Utc::now());
                Ok(())
            }),
        )
        .await
    }

    /// Moves a deal to a new status.
    ///
    /// Entering [`DealStatus::Completed`] queues a command marking the property as sold. The
    /// hand-off is best-effort: a failure is logged and the transition stays committed.
    #[tracing::instrument(skip_all)]
    pub async fn transition(&self, request: TransitionDealRequest) -> Result<Deal> {
        let TransitionDealRequestDissolved { deal_id, status, note } = request.dissolve();

        let deal = self
            .mutate(deal_id, Box::new(move |deal| deal.transition(status, note, Utc::now())))
            .await
            .inspect_err(|e| tracing::debug!(%deal_id, to = %status, "transition rejected: {e}"))?;

        tracing::info!(%deal_id, status = %deal.status(), "deal status changed");

        if deal.status() == DealStatus::Completed {
            let command = PropertyCommand::MarkSold { property_id: deal.property_id() };

            if let Err(e) = self.property_sync.dispatch(command) {
                tracing::warn!(property_id = %deal.property_id(), "failed to queue property update: {e}");
            }
        }

        Ok(deal)
    }

    /// Appends a pending condition with a fresh id. Allowed in every deal status, the new
    /// condition is the last one of the returned deal.
    #[tracing::instrument(skip_all)]
    pub async fn add_condition(&self, request: AddConditionRequest) -> Result<Deal> {
        let AddConditionRequestDissolved { deal_id, condition } = request.dissolve();

        let deal = self
            .mutate(
                deal_id,
                Box::new(move |deal| {
                    deal.add_condition(condition, Utc::now());
                    Ok(())
                }),
            )
            .await?;

        tracing::info!(%deal_id, conditions = deal.conditions().len(), "condition added");

        Ok(deal)
    }

    /// Changes the status of one condition.
    ///
    /// Every entry into [`ConditionStatus::Satisfied`] stamps `satisfied_at` again.
    #[tracing::instrument(skip_all)]
    pub async fn update_condition(&self, request: UpdateConditionRequest) -> Result<Deal> {
        let UpdateConditionRequestDissolved { deal_id, condition_id, status, description } =
            request.dissolve();

        let deal = self
            .mutate(
                deal_id,
                Box::new(move |deal| {
                    deal.update_condition(condition_id, status, description, Utc::now())
                        .map(|_| ())
                }),
            )
            .await?;

        if status == ConditionStatus::Satisfied {
            tracing::info!(%deal_id, %condition_id, "condition satisfied");
        }

        Ok(deal)
    }

    /// Removes a deal that is still a draft.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, deal_id: DealId) -> Result<()> {
        match self.deals.delete_draft(deal_id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!(%deal_id, "deal deleted");
                Ok(())
            },
            DeleteOutcome::NotDraft(status) => Err(DealEngineError::DeleteNotAllowed(status)),
            DeleteOutcome::NotFound => Err(DealEngineError::NotFound(deal_id)),
        }
    }

    async fn mutate(&self, deal_id: DealId, mutation: DealMutation) -> Result<Deal> {
        match self.deals.mutate(deal_id, mutation).await? {
            DealMutationOutcome::Applied(deal) => Ok(deal),
            DealMutationOutcome::Rejected(err) => Err(err.into()),
            DealMutationOutcome::NotFound => Err(DealEngineError::NotFound(deal_id)),
        }
    }
}

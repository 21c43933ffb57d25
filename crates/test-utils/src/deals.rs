use std::sync::Mutex;

use async_trait::async_trait;
use realty_domain::{
    deal::{Deal, DealStatus},
    id::DealId,
};
use realty_engine::port::{
    DealFilter, DealMutation, DealMutationOutcome, DealRepository, DeleteOutcome, Page,
    RepositoryError,
};

use crate::paginate;

/// Deal documents kept in insertion order behind a single lock.
///
/// A mutation runs on a copy of the document while the lock is held and the copy replaces the
/// original only if the rule accepted it.
#[derive(Debug, Default)]
pub struct InMemoryDealRepository {
    deals: Mutex<Vec<Deal>>,
}

impl InMemoryDealRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored copy of a deal.
    pub fn get(&self, id: DealId) -> Option<Deal> {
        self.deals.lock().unwrap().iter().find(|d| d.id() == id).cloned()
    }

    /// Returns the number of stored deals.
    pub fn len(&self) -> usize {
        self.deals.lock().unwrap().len()
    }

    /// Returns `true` if no deal is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DealRepository for InMemoryDealRepository {
    async fn insert(&self, deal: &Deal) -> Result<(), RepositoryError> {
        let mut deals = self.deals.lock().unwrap();

        if deals.iter().any(|d| d.id() == deal.id()) {
            return Err(RepositoryError::backend(format!("duplicate deal id {}", deal.id())));
        }

        deals.push(deal.clone());

        Ok(())
    }

    async fn find(&self, id: DealId) -> Result<Option<Deal>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn list(
        &self,
        filter: &DealFilter,
        page: Page,
    ) -> Result<(Vec<Deal>, u64), RepositoryError> {
        let deals = self.deals.lock().unwrap();

        let matching = deals.iter().rev().filter(|d| {
            filter.status.is_none_or(|s| d.status() == s)
                && filter.property_id.is_none_or(|p| d.property_id() == p)
        });

        Ok(paginate(matching, Some(page)))
    }

    async fn mutate(
        &self,
        id: DealId,
        mutation: DealMutation,
    ) -> Result<DealMutationOutcome, RepositoryError> {
        let mut deals = self.deals.lock().unwrap();

        let Some(stored) = deals.iter_mut().find(|d| d.id() == id) else {
            return Ok(DealMutationOutcome::NotFound);
        };

        let mut updated = stored.clone();

        match mutation(&mut updated) {
            Ok(()) => {
                *stored = updated.clone();
                Ok(DealMutationOutcome::Applied(updated))
            },
            Err(err) => Ok(DealMutationOutcome::Rejected(err)),
        }
    }

    async fn delete_draft(&self, id: DealId) -> Result<DeleteOutcome, RepositoryError> {
        let mut deals = self.deals.lock().unwrap();

        let Some(index) = deals.iter().position(|d| d.id() == id) else {
            return Ok(DeleteOutcome::NotFound);
        };

        match deals[index].status() {
            DealStatus::Draft => {
                deals.remove(index);
                Ok(DeleteOutcome::Deleted)
            },
            status => Ok(DeleteOutcome::NotDraft(status)),
        }
    }
}

//! integration tests for the realty deal engine

use core::{num::NonZeroUsize, time::Duration};

use std::sync::Arc;

use realty_domain::{
    condition::{ConditionKind, ConditionStatus, NewCondition},
    deal::{Deal, DealStatus},
    id::{ConditionId, DealId, PropertyId, UserId},
    participant::{
        ParticipantRefs, Role, UNKNOWN_PARTICIPANT_NAME, USER_NOT_FOUND_AT_SNAPSHOT,
    },
    property::{PropertyCommand, PropertyStatus},
};
use realty_engine::{
    DealEngine, DealEngineError, property_sync,
    request::{
        AddConditionRequest, CreateDealRequest, ListDealsRequest, RequestError,
        TransitionDealRequest, UpdateConditionRequest, UpdateDealRequest,
    },
};
use realty_test_utils::{
    InMemoryDealRepository, InMemoryPropertyDirectory, InMemoryUserDirectory,
    RecordingPropertySync, fixtures,
};

struct Harness {
    engine: DealEngine,
    deals: Arc<InMemoryDealRepository>,
    users: Arc<InMemoryUserDirectory>,
    sync: Arc<RecordingPropertySync>,
}

fn harness() -> Harness {
    let deals = Arc::new(InMemoryDealRepository::new());
    let users = Arc::new(InMemoryUserDirectory::new());
    let sync = Arc::new(RecordingPropertySync::new());

    let engine = DealEngine::builder()
        .deals(deals.clone())
        .users(users.clone())
        .property_sync(sync.clone())
        .build();

    Harness { engine, deals, users, sync }
}

async fn create_draft(engine: &DealEngine, property_id: PropertyId) -> Deal {
    let request = CreateDealRequest::builder()
        .property_id(property_id)
        .offer_price(fixtures::decimal("450000.00"))
        .build()
        .unwrap();

    engine.create(request).await.unwrap()
}

async fn transition(engine: &DealEngine, deal_id: DealId, status: &str) -> Result<Deal, DealEngineError> {
    let request = TransitionDealRequest::builder().deal_id(deal_id).status(status).build().unwrap();

    engine.transition(request).await
}

async fn set_condition(
    engine: &DealEngine,
    deal_id: DealId,
    condition_id: ConditionId,
    status: &str,
) -> Deal {
    let request = UpdateConditionRequest::builder()
        .deal_id(deal_id)
        .condition_id(condition_id)
        .status(status)
        .build()
        .unwrap();

    engine.update_condition(request).await.unwrap()
}

fn financing() -> NewCondition {
    NewCondition::builder()
        .kind(ConditionKind::Financing)
        .description("Mortgage approval".to_owned())
        .build()
}

#[tokio::test]
async fn deal_runs_from_draft_to_completed_and_marks_the_property_sold() {
    // Arrange
    let Harness { engine, deals, sync, .. } = harness();
    let property_id = PropertyId::generate();

    let deal = create_draft(&engine, property_id).await;
    let deal_id = deal.id();

    // Act
    transition(&engine, deal_id, "submitted").await.unwrap();
    transition(&engine, deal_id, "conditional").await.unwrap();

    let deal = engine
        .add_condition(AddConditionRequest::builder().deal_id(deal_id).condition(financing()).build())
        .await
        .unwrap();
    let condition_id = deal.conditions().last().unwrap().id();
    assert_eq!(deal.status(), DealStatus::Conditional);

    let deal = set_condition(&engine, deal_id, condition_id, "satisfied").await;
    assert!(deal.condition(condition_id).unwrap().satisfied_at().is_some());

    transition(&engine, deal_id, "firm").await.unwrap();
    transition(&engine, deal_id, "closing").await.unwrap();
    let deal = transition(&engine, deal_id, "completed").await.unwrap();

    // Assert
    let history: Vec<_> = deal.status_history().iter().map(|e| e.status()).collect();
    assert_eq!(
        history,
        vec![
            DealStatus::Draft,
            DealStatus::Submitted,
            DealStatus::Conditional,
            DealStatus::Firm,
            DealStatus::Closing,
            DealStatus::Completed,
        ]
    );
    assert_eq!(deals.get(deal_id).unwrap(), deal);
    assert_eq!(sync.commands(), vec![PropertyCommand::MarkSold { property_id }]);
}

#[tokio::test]
async fn completed_deal_reaches_the_property_directory_through_the_worker() {
    // Arrange
    let deals = Arc::new(InMemoryDealRepository::new());
    let properties = Arc::new(InMemoryPropertyDirectory::new());
    let property_id = PropertyId::generate();
    properties.insert(property_id, PropertyStatus::Active);

    let (handle, worker) = property_sync::spawn(properties.clone(), NonZeroUsize::new(8).unwrap());

    let engine = DealEngine::builder()
        .deals(deals)
        .users(Arc::new(InMemoryUserDirectory::new()))
        .property_sync(Arc::new(handle))
        .build();

    let deal_id = create_draft(&engine, property_id).await.id();

    // Act
    for status in ["submitted", "firm", "closing", "completed"] {
        transition(&engine, deal_id, status).await.unwrap();
    }

    worker.shutdown().await.unwrap();

    // Assert
    assert_eq!(properties.status(property_id), Some(PropertyStatus::Sold));
    assert_eq!(properties.calls(), vec![(property_id, PropertyStatus::Sold)]);
}

#[tokio::test]
async fn failed_property_hand_off_does_not_undo_the_completion() {
    // Arrange
    let Harness { engine, deals, sync, .. } = harness();
    let deal_id = create_draft(&engine, PropertyId::generate()).await.id();

    for status in ["submitted", "firm", "closing"] {
        transition(&engine, deal_id, status).await.unwrap();
    }

    sync.fail_dispatch(true);

    // Act
    let deal = transition(&engine, deal_id, "completed").await.unwrap();

    // Assert
    assert_eq!(deal.status(), DealStatus::Completed);
    assert_eq!(deals.get(deal_id).unwrap().status(), DealStatus::Completed);
    assert!(sync.commands().is_empty());
}

#[tokio::test]
async fn transitions_follow_the_table_and_leave_rejected_deals_untouched() {
    let Harness { engine, deals, .. } = harness();
    let deal_id = create_draft(&engine, PropertyId::generate()).await.id();

    let err = transition(&engine, deal_id, "firm").await.unwrap_err();
    assert!(matches!(
        err,
        DealEngineError::InvalidTransition { from: DealStatus::Draft, to: DealStatus::Firm }
    ));
    assert_eq!(deals.get(deal_id).unwrap().status_history().len(), 1);

    let request = TransitionDealRequest::builder()
        .deal_id(deal_id)
        .status("submitted")
        .note("sent to listing agent".to_owned())
        .build()
        .unwrap();
    let deal = engine.transition(request).await.unwrap();

    let last = deal.status_history().last().unwrap();
    assert_eq!(last.status(), DealStatus::Submitted);
    assert_eq!(last.note(), Some("sent to listing agent"));
}

#[tokio::test]
async fn terminal_deals_admit_no_transition() {
    let Harness { engine, deals, .. } = harness();

    for terminal in ["cancelled", "expired"] {
        let deal_id = create_draft(&engine, PropertyId::generate()).await.id();
        transition(&engine, deal_id, "submitted").await.unwrap();
        transition(&engine, deal_id, terminal).await.unwrap();

        let before = deals.get(deal_id).unwrap();

        for target in ["draft", "submitted", "conditional", "firm", "closing", "completed"] {
            let err = transition(&engine, deal_id, target).await.unwrap_err();
            assert!(matches!(err, DealEngineError::InvalidTransition { .. }));
        }

        assert_eq!(deals.get(deal_id).unwrap(), before);
    }
}

#[tokio::test]
async fn unknown_target_status_is_rejected_before_reaching_the_engine() {
    let result = TransitionDealRequest::builder()
        .deal_id(DealId::generate())
        .status("archived")
        .build();

    assert!(matches!(result, Err(RequestError::InvalidDealStatus(s)) if s == "archived"));
}

#[tokio::test]
async fn only_draft_deals_can_be_deleted() {
    let Harness { engine, deals, .. } = harness();

    let draft = create_draft(&engine, PropertyId::generate()).await.id();
    engine.delete(draft).await.unwrap();
    assert!(deals.get(draft).is_none());

    let submitted = create_draft(&engine, PropertyId::generate()).await.id();
    transition(&engine, submitted, "submitted").await.unwrap();
    let before = deals.get(submitted).unwrap();

    let err = engine.delete(submitted).await.unwrap_err();
    assert!(matches!(err, DealEngineError::DeleteNotAllowed(DealStatus::Submitted)));
    assert_eq!(deals.get(submitted).unwrap(), before);

    let err = engine.delete(DealId::generate()).await.unwrap_err();
    assert!(matches!(err, DealEngineError::NotFound(_)));
}

#[tokio::test]
async fn missing_participants_degrade_to_unknown_snapshot_entries() {
    // Arrange
    let Harness { engine, users, .. } = harness();

    let buyer = fixtures::user(Role::Buyer);
    let seller_agent = fixtures::user(Role::SellerAgent);
    let buyer_lawyer = fixtures::user(Role::BuyerLawyer);
    users.insert(buyer.clone());
    users.insert(seller_agent.clone());
    users.insert(buyer_lawyer.clone());

    let ghost = UserId::generate();

    let participants = ParticipantRefs::from([
        (Role::Buyer, buyer.id()),
        (Role::Seller, ghost),
        (Role::SellerAgent, seller_agent.id()),
        (Role::BuyerLawyer, buyer_lawyer.id()),
    ]);

    let request = CreateDealRequest::builder()
        .property_id(PropertyId::generate())
        .offer_price(fixtures::decimal("725000"))
        .participants(participants.clone())
        .build()
        .unwrap();

    // Act
    let deal = engine.create(request).await.unwrap();

    // Assert
    let snapshot = deal.participants_snapshot();
    assert_eq!(snapshot.len(), 4);
    assert_eq!(deal.participant_refs(), &participants);
    assert!(!snapshot.contains_key(&Role::BuyerAgent));

    let seller = &snapshot[&Role::Seller];
    assert_eq!(seller.user_id(), ghost);
    assert_eq!(seller.name(), UNKNOWN_PARTICIPANT_NAME);
    assert_eq!(seller.error(), Some(USER_NOT_FOUND_AT_SNAPSHOT));

    let buyer_entry = snapshot[&Role::Buyer].as_resolved().unwrap();
    assert_eq!(buyer_entry.email(), buyer.email());
    assert_eq!(buyer_entry.license_number(), None);
    assert_eq!(buyer_entry.bar_number(), None);

    let agent_entry = snapshot[&Role::SellerAgent].as_resolved().unwrap();
    assert_eq!(agent_entry.license_number(), Some("LIC-42"));
    assert_eq!(agent_entry.bar_number(), None);

    let lawyer_entry = snapshot[&Role::BuyerLawyer].as_resolved().unwrap();
    assert_eq!(lawyer_entry.law_firm(), Some("Keller & Stone"));
    assert_eq!(lawyer_entry.brokerage(), None);
}

#[tokio::test]
async fn snapshot_is_not_recomputed_after_the_user_changes() {
    let Harness { engine, users, .. } = harness();

    let buyer = fixtures::user(Role::Buyer);
    users.insert(buyer.clone());

    let request = CreateDealRequest::builder()
        .property_id(PropertyId::generate())
        .offer_price(fixtures::decimal("300000"))
        .participants(ParticipantRefs::from([(Role::Buyer, buyer.id())]))
        .build()
        .unwrap();
    let deal_id = engine.create(request).await.unwrap().id();

    users.remove(buyer.id());
    transition(&engine, deal_id, "submitted").await.unwrap();

    let deal = engine.get(deal_id).await.unwrap();
    assert_eq!(deal.participants_snapshot()[&Role::Buyer].error(), None);
    assert!(deal.snapshot_timestamp() <= deal.timestamps().updated_at());
}

#[tokio::test]
async fn satisfied_at_is_stamped_again_on_every_entry_into_satisfied() {
    // Arrange
    let Harness { engine, .. } = harness();
    let request = CreateDealRequest::builder()
        .property_id(PropertyId::generate())
        .offer_price(fixtures::decimal("510000"))
        .conditions(vec![financing()])
        .build()
        .unwrap();
    let deal = engine.create(request).await.unwrap();
    let deal_id = deal.id();
    let condition_id = deal.conditions()[0].id();
    assert_eq!(deal.conditions()[0].status(), ConditionStatus::Pending);

    // Act
    let first = set_condition(&engine, deal_id, condition_id, "satisfied").await;
    let first = first.condition(condition_id).unwrap().satisfied_at().unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = set_condition(&engine, deal_id, condition_id, "satisfied").await;
    let second = second.condition(condition_id).unwrap().satisfied_at().unwrap();

    let waived = set_condition(&engine, deal_id, condition_id, "waived").await;

    // Assert
    assert!(second > first);
    assert_eq!(waived.condition(condition_id).unwrap().status(), ConditionStatus::Waived);
    assert_eq!(waived.condition(condition_id).unwrap().satisfied_at(), Some(second));
}

#[tokio::test]
async fn updating_an_unknown_condition_fails() {
    let Harness { engine, .. } = harness();
    let deal_id = create_draft(&engine, PropertyId::generate()).await.id();

    let request = UpdateConditionRequest::builder()
        .deal_id(deal_id)
        .condition_id(ConditionId::generate())
        .status("failed")
        .build()
        .unwrap();

    let err = engine.update_condition(request).await.unwrap_err();
    assert!(matches!(err, DealEngineError::ConditionNotFound(_)));
}

#[tokio::test]
async fn conditions_can_be_added_in_terminal_states() {
    let Harness { engine, .. } = harness();
    let deal_id = create_draft(&engine, PropertyId::generate()).await.id();
    transition(&engine, deal_id, "cancelled").await.unwrap();

    let deal = engine
        .add_condition(AddConditionRequest::builder().deal_id(deal_id).condition(financing()).build())
        .await
        .unwrap();

    assert_eq!(deal.status(), DealStatus::Cancelled);
    assert_eq!(deal.conditions().len(), 1);
    assert_eq!(deal.conditions()[0].status(), ConditionStatus::Pending);
}

#[tokio::test]
async fn details_update_leaves_status_and_history_alone() {
    let Harness { engine, .. } = harness();
    let deal_id = create_draft(&engine, PropertyId::generate()).await.id();
    transition(&engine, deal_id, "submitted").await.unwrap();

    let request = UpdateDealRequest::builder()
        .deal_id(deal_id)
        .offer_price(fixtures::decimal("460000.50"))
        .notes("seller counter accepted".to_owned())
        .build()
        .unwrap();
    let deal = engine.update_details(request).await.unwrap();

    assert_eq!(deal.offer_price(), fixtures::amount("460000.50"));
    assert_eq!(deal.notes(), Some("seller counter accepted"));
    assert_eq!(deal.status(), DealStatus::Submitted);
    assert_eq!(deal.status_history().len(), 2);

    let rejected = UpdateDealRequest::builder()
        .deal_id(deal_id)
        .offer_price(fixtures::decimal("-1"))
        .build();
    assert!(matches!(rejected, Err(RequestError::InvalidOfferPrice(_))));
}

#[tokio::test]
async fn deals_are_listed_newest_first_with_filters_and_pages() {
    let Harness { engine, .. } = harness();
    let property_id = PropertyId::generate();

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(create_draft(&engine, property_id).await.id());
    }
    let other = create_draft(&engine, PropertyId::generate()).await.id();
    transition(&engine, other, "submitted").await.unwrap();

    let page = engine
        .list(ListDealsRequest::builder().property_id(property_id).page_size(2).build().unwrap())
        .await
        .unwrap();
    assert_eq!(page.total(), 3);
    assert_eq!(page.total_pages(), 2);
    assert_eq!(page.items().iter().map(Deal::id).collect::<Vec<_>>(), vec![ids[2], ids[1]]);

    let submitted = engine
        .list(ListDealsRequest::builder().status(DealStatus::Submitted).build().unwrap())
        .await
        .unwrap();
    assert_eq!(submitted.total(), 1);
    assert_eq!(submitted.items()[0].id(), other);

    let too_big = ListDealsRequest::builder().page_size(101).build();
    assert!(matches!(too_big, Err(RequestError::InvalidPage { page_size: 101, .. })));
}

#[tokio::test]
async fn unknown_deal_reads_fail_with_not_found() {
    let Harness { engine, .. } = harness();
    let deal_id = DealId::generate();

    assert!(matches!(engine.get(deal_id).await, Err(DealEngineError::NotFound(id)) if id == deal_id));
    assert!(matches!(
        transition(&engine, deal_id, "submitted").await,
        Err(DealEngineError::NotFound(_))
    ));
}

//! Tests for the conversation service.

use std::sync::Arc;

use chrono::Duration;
use mockall::predicate::function;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockConversationRepository, MockItineraryRepository};
use crate::domain::{ErrorCode, Itinerary, ItineraryDraft, LatLng, Place};
use crate::test_support::{FixtureClock, fixture_timestamp};

struct World {
    driver: UserId,
    passenger: UserId,
    itinerary: Itinerary,
}

#[fixture]
fn world() -> World {
    let driver = UserId::random();
    let place = |address: &str| Place {
        address: address.to_owned(),
        location: LatLng::new(40.74, 13.9).expect("location"),
    };
    let itinerary = Itinerary::restore(ItineraryDraft {
        id: ItineraryId::random(),
        driver_id: driver.clone(),
        title: "Forio to Ischia Porto".to_owned(),
        description: "Evening ferry connection".to_owned(),
        start: place("Forio"),
        end: place("Ischia Porto"),
        leave_date: fixture_timestamp() + Duration::days(3),
        round_trip: false,
        return_date: None,
        daily: false,
        num_people: 3,
        fuel_cost: 4,
        tolls: 0,
        smoking_allowed: false,
        pets_allowed: false,
        pink: false,
        created_at: fixture_timestamp(),
        updated_at: fixture_timestamp(),
    })
    .expect("itinerary");
    World {
        driver,
        passenger: UserId::random(),
        itinerary,
    }
}

fn itineraries_with(itinerary: &Itinerary) -> MockItineraryRepository {
    let itinerary = itinerary.clone();
    let mut repo = MockItineraryRepository::new();
    repo.expect_find_by_id()
        .returning(move |_| Ok(Some(itinerary.clone())));
    repo
}

fn service(
    conversations: MockConversationRepository,
    itineraries: MockItineraryRepository,
) -> ConversationService<MockConversationRepository, MockItineraryRepository> {
    ConversationService::new(
        Arc::new(conversations),
        Arc::new(itineraries),
        Arc::new(FixtureClock::new(fixture_timestamp())),
    )
}

fn body(text: &str) -> MessageBody {
    MessageBody::new(text).expect("body")
}

fn started(world: &World) -> Conversation {
    Conversation::start(
        Conversable::Itinerary(world.itinerary.id()),
        world.passenger.clone(),
        world.driver.clone(),
        body("Hello driver"),
        fixture_timestamp() - Duration::hours(1),
    )
    .expect("conversation")
}

#[rstest]
#[tokio::test]
async fn passenger_starts_conversation_with_driver(world: World) {
    let mut conversations = MockConversationRepository::new();
    conversations
        .expect_find_for_conversable_and_user()
        .times(1)
        .returning(|_, _| Ok(None));
    conversations.expect_save().times(1).returning(|_| Ok(()));

    let conversation = service(conversations, itineraries_with(&world.itinerary))
        .start(&world.passenger, world.itinerary.id(), body("Can I join?"))
        .await
        .expect("started");

    assert!(conversation.is_participant(&world.driver));
    assert!(conversation.is_unread_for(&world.driver));
    assert!(!conversation.is_unread_for(&world.passenger));
}

#[rstest]
#[tokio::test]
async fn driver_cannot_start_on_own_itinerary(world: World) {
    let mut conversations = MockConversationRepository::new();
    conversations.expect_save().times(0);

    let error = service(conversations, itineraries_with(&world.itinerary))
        .start(&world.driver, world.itinerary.id(), body("Talking to myself"))
        .await
        .expect_err("own itinerary");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn second_conversation_conflicts(world: World) {
    let existing = started(&world);
    let mut conversations = MockConversationRepository::new();
    conversations
        .expect_find_for_conversable_and_user()
        .times(1)
        .return_once(move |_, _| Ok(Some(existing)));
    conversations.expect_save().times(0);

    let error = service(conversations, itineraries_with(&world.itinerary))
        .start(&world.passenger, world.itinerary.id(), body("Again"))
        .await
        .expect_err("duplicate");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn concurrent_start_rejected_by_storage_conflicts(world: World) {
    let mut conversations = MockConversationRepository::new();
    conversations
        .expect_find_for_conversable_and_user()
        .times(1)
        .return_once(|_, _| Ok(None));
    conversations
        .expect_save()
        .times(1)
        .returning(|_| Err(ConversationRepositoryError::duplicate("unique violation")));

    let error = service(conversations, itineraries_with(&world.itinerary))
        .start(&world.passenger, world.itinerary.id(), body("Me too"))
        .await
        .expect_err("duplicate");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn prepare_points_to_existing_conversation(world: World) {
    let existing = started(&world);
    let existing_id = existing.id();
    let mut conversations = MockConversationRepository::new();
    conversations
        .expect_find_for_conversable_and_user()
        .times(1)
        .return_once(move |_, _| Ok(Some(existing)));

    let start = service(conversations, itineraries_with(&world.itinerary))
        .prepare(&world.passenger, world.itinerary.id())
        .await
        .expect("prepared");

    assert_eq!(start, ConversationStart::Existing(existing_id));
}

#[rstest]
#[tokio::test]
async fn viewing_marks_read(world: World) {
    let conversation = started(&world);
    let id = conversation.id();
    let driver = world.driver.clone();
    let mut conversations = MockConversationRepository::new();
    conversations
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(conversation)));
    conversations
        .expect_save()
        .with(function(move |saved: &Conversation| !saved.is_unread_for(&driver)))
        .times(1)
        .returning(|_| Ok(()));

    let viewed = service(conversations, MockItineraryRepository::new())
        .view(&world.driver, id)
        .await
        .expect("viewed");

    assert!(!viewed.is_unread_for(&world.driver));
}

#[rstest]
#[tokio::test]
async fn outsiders_get_not_found(world: World) {
    let conversation = started(&world);
    let id = conversation.id();
    let mut conversations = MockConversationRepository::new();
    conversations
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(conversation)));
    conversations.expect_save().times(0);

    let error = service(conversations, MockItineraryRepository::new())
        .reply(&UserId::random(), id, body("Hi"))
        .await
        .expect_err("outsider");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn unread_count_only_counts_unread_threads(world: World) {
    let unread = started(&world);
    let mut read = started(&world);
    read.mark_as_read(&world.driver, fixture_timestamp())
        .expect("participant");
    let mut conversations = MockConversationRepository::new();
    conversations
        .expect_list_for_user()
        .times(1)
        .return_once(move |_| Ok(vec![unread, read]));

    let count = service(conversations, MockItineraryRepository::new())
        .unread_count(&world.driver)
        .await
        .expect("count");

    assert_eq!(count, 1);
}

#[rstest]
#[tokio::test]
async fn repository_outage_is_service_unavailable(world: World) {
    let mut conversations = MockConversationRepository::new();
    conversations
        .expect_list_for_user()
        .times(1)
        .return_once(|_| Err(ConversationRepositoryError::connection("pool exhausted")));

    let error = service(conversations, MockItineraryRepository::new())
        .list(&world.passenger)
        .await
        .expect_err("outage");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

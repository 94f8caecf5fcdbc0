//! Tests for conversation read tracking and message rules.

use chrono::{Duration, TimeZone};
use rstest::{fixture, rstest};

use super::*;

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0)
        .single()
        .expect("valid timestamp")
        + Duration::minutes(minutes)
}

fn body(text: &str) -> MessageBody {
    MessageBody::new(text).expect("valid body")
}

struct Thread {
    passenger: UserId,
    driver: UserId,
    conversation: Conversation,
}

#[fixture]
fn thread() -> Thread {
    let passenger = UserId::random();
    let driver = UserId::random();
    let conversation = Conversation::start(
        Conversable::Itinerary(ItineraryId::random()),
        passenger.clone(),
        driver.clone(),
        body("Is there a seat left?"),
        at(0),
    )
    .expect("conversation");
    Thread {
        passenger,
        driver,
        conversation,
    }
}

#[rstest]
#[case("")]
#[case("  \n ")]
fn blank_bodies_are_rejected(#[case] raw: &str) {
    assert_eq!(MessageBody::new(raw), Err(BodyValidationError::Empty));
}

#[rstest]
fn bodies_are_kept_verbatim() {
    let text = "Thanks\nMate!  ";
    assert_eq!(body(text).as_ref(), text);
}

#[rstest]
fn overlong_bodies_are_rejected() {
    let text = "a".repeat(BODY_MAX + 1);
    assert_eq!(
        MessageBody::new(text),
        Err(BodyValidationError::TooLong { max: BODY_MAX })
    );
}

#[rstest]
fn cannot_talk_to_yourself() {
    let user = UserId::random();
    let result = Conversation::start(
        Conversable::Itinerary(ItineraryId::random()),
        user.clone(),
        user,
        body("hello"),
        at(0),
    );
    assert_eq!(result, Err(ConversationError::SelfConversation));
}

#[rstest]
fn new_thread_is_unread_for_recipient_only(thread: Thread) {
    assert!(thread.conversation.is_unread_for(&thread.driver));
    assert!(!thread.conversation.is_unread_for(&thread.passenger));
}

#[rstest]
fn reading_clears_the_unread_flag(mut thread: Thread) {
    thread
        .conversation
        .mark_as_read(&thread.driver, at(1))
        .expect("participant");
    assert!(!thread.conversation.is_unread_for(&thread.driver));
}

#[rstest]
fn reply_marks_sender_read_and_notifies_other_side(mut thread: Thread) {
    thread
        .conversation
        .reply(&thread.driver, body("Yes, one seat."), at(5))
        .expect("reply");

    assert!(!thread.conversation.is_unread_for(&thread.driver));
    assert!(thread.conversation.is_unread_for(&thread.passenger));
    assert_eq!(thread.conversation.messages().len(), 2);
    assert_eq!(thread.conversation.updated_at(), at(5));
    assert_eq!(
        thread
            .conversation
            .last_message()
            .map(|message| message.body.as_ref()),
        Some("Yes, one seat.")
    );
}

#[rstest]
fn outsiders_cannot_reply(mut thread: Thread) {
    let outsider = UserId::random();
    assert_eq!(
        thread.conversation.reply(&outsider, body("me too"), at(2)),
        Err(ConversationError::NotParticipant)
    );
    assert!(!thread.conversation.is_unread_for(&outsider));
}

#[rstest]
fn others_lists_the_counterpart(thread: Thread) {
    let others: Vec<_> = thread.conversation.others(&thread.passenger).collect();
    assert_eq!(others, vec![&thread.driver]);
}

#[rstest]
fn records_are_rebuilt_in_message_order(thread: Thread) {
    let mut messages = thread.conversation.messages().to_vec();
    messages.push(Message {
        id: Uuid::new_v4(),
        sender_id: thread.driver.clone(),
        body: body("earlier"),
        created_at: at(-5),
    });
    let rebuilt = Conversation::from_record(ConversationRecord {
        id: thread.conversation.id(),
        conversable: thread.conversation.conversable(),
        passenger_id: thread.passenger.clone(),
        participants: thread.conversation.participants().to_vec(),
        messages,
        created_at: at(-5),
        updated_at: at(0),
    });
    assert_eq!(
        rebuilt.last_message().map(|message| message.body.as_ref()),
        Some("Is there a seat left?")
    );
}

#[rstest]
fn conversable_round_trips_through_parts() {
    let conversable = Conversable::Itinerary(ItineraryId::random());
    let rebuilt = Conversable::from_parts(conversable.type_name(), conversable.id());
    assert_eq!(rebuilt, Some(conversable));
    assert_eq!(Conversable::from_parts("Feedback", conversable.id()), None);
}

//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Users derived from a social-login identity.
    users (id) {
        id -> Uuid,
        provider -> Varchar,
        uid -> Varchar,
        display_name -> Varchar,
        email -> Nullable<Varchar>,
        image -> Nullable<Text>,
        gender -> Nullable<Varchar>,
        locale -> Nullable<Varchar>,
        birthday -> Nullable<Date>,
        profile_link -> Nullable<Text>,
        /// Provider token; never logged.
        access_token -> Nullable<Text>,
        access_token_expires_at -> Nullable<Timestamptz>,
        admin -> Bool,
        banned -> Bool,
        friends_count -> Nullable<Int4>,
        /// JSON array of `{ "id", "name" }` objects.
        likes -> Jsonb,
        provider_data_cached_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Rides offered by drivers.
    itineraries (id) {
        id -> Uuid,
        driver_id -> Uuid,
        title -> Varchar,
        description -> Text,
        start_address -> Text,
        start_lat -> Float8,
        start_lng -> Float8,
        end_address -> Text,
        end_lat -> Float8,
        end_lng -> Float8,
        leave_date -> Timestamptz,
        round_trip -> Bool,
        return_date -> Nullable<Timestamptz>,
        daily -> Bool,
        num_people -> Int2,
        fuel_cost -> Int4,
        tolls -> Int4,
        smoking_allowed -> Bool,
        pets_allowed -> Bool,
        pink -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    conversations (id) {
        id -> Uuid,
        /// Polymorphic target type, currently always `Itinerary`.
        conversable_type -> Varchar,
        conversable_id -> Uuid,
        /// User who opened the conversation.
        passenger_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    conversation_participants (conversation_id, user_id) {
        conversation_id -> Uuid,
        user_id -> Uuid,
        read_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    messages (id) {
        id -> Uuid,
        conversation_id -> Uuid,
        sender_id -> Uuid,
        body -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// References between users; unique per author and itinerary.
    user_references (id) {
        id -> Uuid,
        author_id -> Uuid,
        recipient_id -> Uuid,
        itinerary_id -> Uuid,
        outgoing_rating -> Int2,
        outgoing_body -> Text,
        incoming_rating -> Nullable<Int2>,
        incoming_body -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    feedbacks (id) {
        id -> Uuid,
        user_id -> Nullable<Uuid>,
        kind -> Varchar,
        message -> Text,
        url -> Nullable<Text>,
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(itineraries -> users (driver_id));
diesel::joinable!(conversation_participants -> conversations (conversation_id));
diesel::joinable!(messages -> conversations (conversation_id));
diesel::joinable!(feedbacks -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    itineraries,
    conversations,
    conversation_participants,
    messages,
    user_references,
    feedbacks,
);

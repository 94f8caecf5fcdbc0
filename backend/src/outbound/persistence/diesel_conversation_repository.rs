//! PostgreSQL-backed `ConversationRepository` implementation using Diesel ORM.
//!
//! A conversation spans three tables. Saves write the aggregate in one
//! transaction; reads load the conversation rows first and then their
//! participants and messages in two batched queries. The unique key on
//! (conversable, passenger) surfaces as
//! [`ConversationRepositoryError::Duplicate`].

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{ConversationRepository, ConversationRepositoryError};
use crate::domain::{Conversable, Conversation, ConversationId, UserId};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{ConversationRow, ConversationRows, MessageRow, ParticipantRow};
use super::pool::{DbPool, PoolError};
use super::schema::{conversation_participants, conversations, messages};

#[derive(Clone)]
pub struct DieselConversationRepository {
    pool: DbPool,
}

impl DieselConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Load participants and messages for `heads`, preserving their order.
    async fn assemble(
        conn: &mut AsyncPgConnection,
        heads: Vec<ConversationRow>,
    ) -> Result<Vec<Conversation>, ConversationRepositoryError> {
        if heads.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = heads.iter().map(|row| row.id).collect();

        let participant_rows: Vec<ParticipantRow> = conversation_participants::table
            .filter(conversation_participants::conversation_id.eq_any(&ids))
            .select(ParticipantRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)?;
        let message_rows: Vec<MessageRow> = messages::table
            .filter(messages::conversation_id.eq_any(&ids))
            .select(MessageRow::as_select())
            .order_by(messages::created_at.asc())
            .load(conn)
            .await
            .map_err(map_diesel_error)?;

        let mut participants: HashMap<Uuid, Vec<ParticipantRow>> = HashMap::new();
        for row in participant_rows {
            participants.entry(row.conversation_id).or_default().push(row);
        }
        let mut thread_messages: HashMap<Uuid, Vec<MessageRow>> = HashMap::new();
        for row in message_rows {
            thread_messages
                .entry(row.conversation_id)
                .or_default()
                .push(row);
        }

        heads
            .into_iter()
            .map(|conversation| {
                let id = conversation.id;
                let rows = ConversationRows {
                    participants: participants.remove(&id).unwrap_or_default(),
                    messages: thread_messages.remove(&id).unwrap_or_default(),
                    conversation,
                };
                rows.into_record()
                    .map(Conversation::from_record)
                    .map_err(ConversationRepositoryError::query)
            })
            .collect()
    }
}

fn map_pool_error(error: PoolError) -> ConversationRepositoryError {
    map_basic_pool_error(error, ConversationRepositoryError::connection)
}

fn map_save_error(error: diesel::result::Error) -> ConversationRepositoryError {
    if is_unique_violation(&error) {
        return ConversationRepositoryError::duplicate("passenger already opened this conversation");
    }
    map_diesel_error(error)
}

fn map_diesel_error(error: diesel::result::Error) -> ConversationRepositoryError {
    map_basic_diesel_error(
        error,
        ConversationRepositoryError::query,
        ConversationRepositoryError::connection,
    )
}

#[async_trait]
impl ConversationRepository for DieselConversationRepository {
    async fn save(&self, conversation: &Conversation) -> Result<(), ConversationRepositoryError> {
        let rows = ConversationRows::from_conversation(conversation);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(conversations::table)
                    .values(&rows.conversation)
                    .on_conflict(conversations::id)
                    .do_update()
                    .set(conversations::updated_at.eq(excluded(conversations::updated_at)))
                    .execute(conn)
                    .await?;
                diesel::insert_into(conversation_participants::table)
                    .values(&rows.participants)
                    .on_conflict((
                        conversation_participants::conversation_id,
                        conversation_participants::user_id,
                    ))
                    .do_update()
                    .set(
                        conversation_participants::read_at
                            .eq(excluded(conversation_participants::read_at)),
                    )
                    .execute(conn)
                    .await?;
                // Messages are append-only.
                diesel::insert_into(messages::table)
                    .values(&rows.messages)
                    .on_conflict(messages::id)
                    .do_nothing()
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_save_error)
    }

    async fn find_by_id(
        &self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let head: Option<ConversationRow> = conversations::table
            .filter(conversations::id.eq(id.as_uuid()))
            .select(ConversationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let Some(head) = head else {
            return Ok(None);
        };
        Ok(Self::assemble(&mut conn, vec![head]).await?.pop())
    }

    async fn find_for_conversable_and_user(
        &self,
        conversable: &Conversable,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let head: Option<ConversationRow> = conversations::table
            .inner_join(conversation_participants::table)
            .filter(conversations::conversable_type.eq(conversable.type_name()))
            .filter(conversations::conversable_id.eq(conversable.id()))
            .filter(conversation_participants::user_id.eq(user_id.as_uuid()))
            .select(ConversationRow::as_select())
            .order_by(conversations::created_at.asc())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let Some(head) = head else {
            return Ok(None);
        };
        Ok(Self::assemble(&mut conn, vec![head]).await?.pop())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Conversation>, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let heads: Vec<ConversationRow> = conversations::table
            .inner_join(conversation_participants::table)
            .filter(conversation_participants::user_id.eq(user_id.as_uuid()))
            .select(ConversationRow::as_select())
            .order_by(conversations::updated_at.desc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Self::assemble(&mut conn, heads).await
    }
}

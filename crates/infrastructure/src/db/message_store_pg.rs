//! 消息存储的 Postgres 实现
//!
//! 已读/已见/本地删除集合存 uuid 数组，表情回应存 jsonb。
//! 集合追加一律带存在性检查，保证幂等。

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    ChatId, DomainError, DomainResult, Message, MessageId, MessageStore, NewMessage, Reaction,
    UserId,
};
use serde_json::Value as JsonValue;
use sqlx::{query, query_as, query_scalar, FromRow};
use uuid::Uuid;

use crate::db::{storage_error, DbPool};

#[derive(Debug, Clone, FromRow)]
struct DbMessage {
    id: Uuid,
    chat_id: Uuid,
    sender_id: Uuid,
    text: Option<String>,
    media_url: Option<String>,
    media_type: Option<String>,
    public_id: Option<String>,
    read_by: Vec<Uuid>,
    seen_by: Vec<Uuid>,
    deleted_for: Vec<Uuid>,
    reactions: JsonValue,
    is_deleted_globally: bool,
    created_at: DateTime<Utc>,
}

fn id_set(ids: Vec<Uuid>) -> HashSet<UserId> {
    ids.into_iter().map(UserId::new).collect()
}

impl TryFrom<DbMessage> for Message {
    type Error = DomainError;

    fn try_from(row: DbMessage) -> Result<Self, Self::Error> {
        let reactions: Vec<Reaction> = serde_json::from_value(row.reactions)
            .map_err(|e| DomainError::storage(format!("invalid reactions payload: {e}")))?;

        Ok(Message {
            id: MessageId::new(row.id),
            chat_id: ChatId::new(row.chat_id),
            sender_id: UserId::new(row.sender_id),
            text: row.text,
            media_url: row.media_url,
            media_type: row.media_type,
            public_id: row.public_id,
            read_by: id_set(row.read_by),
            seen_by: id_set(row.seen_by),
            reactions,
            deleted_for: id_set(row.deleted_for),
            is_deleted_globally: row.is_deleted_globally,
            created_at: row.created_at,
        })
    }
}

const MESSAGE_COLUMNS: &str = "id, chat_id, sender_id, text, media_url, media_type, public_id, \
     read_by, seen_by, deleted_for, reactions, is_deleted_globally, created_at";

pub struct PgMessageStore {
    pool: Arc<DbPool>,
}

impl PgMessageStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// 更新必须命中一行，否则视为消息不存在。
    fn require_hit(result: sqlx::postgres::PgQueryResult, message_id: MessageId) -> DomainResult<()> {
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("message", message_id));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn create(&self, payload: NewMessage) -> DomainResult<Message> {
        let message = Message::create(payload)?;

        let row: DbMessage = query_as(&format!(
            r#"
            INSERT INTO messages (id, chat_id, sender_id, text, media_url, media_type, public_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MESSAGE_COLUMNS}
            "#,
        ))
        .bind(message.id.0)
        .bind(message.chat_id.0)
        .bind(message.sender_id.0)
        .bind(&message.text)
        .bind(&message.media_url)
        .bind(&message.media_type)
        .bind(&message.public_id)
        .bind(message.created_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(storage_error)?;

        row.try_into()
    }

    async fn find(&self, message_id: MessageId) -> DomainResult<Option<Message>> {
        let row: Option<DbMessage> = query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(message_id.0)
        .fetch_optional(&*self.pool)
        .await
        .map_err(storage_error)?;

        row.map(TryInto::try_into).transpose()
    }

    async fn count_unread_from(
        &self,
        sender_id: UserId,
        chat_id: ChatId,
        reader_id: UserId,
    ) -> DomainResult<u64> {
        let count: i64 = query_scalar(
            r#"
            SELECT COUNT(*) FROM messages
            WHERE chat_id = $1 AND sender_id = $2 AND NOT ($3 = ANY(read_by))
            "#,
        )
        .bind(chat_id.0)
        .bind(sender_id.0)
        .bind(reader_id.0)
        .fetch_one(&*self.pool)
        .await
        .map_err(storage_error)?;

        Ok(count as u64)
    }

    async fn mark_read_from(&self, sender_id: UserId, reader_id: UserId) -> DomainResult<()> {
        query(
            r#"
            UPDATE messages
            SET read_by = array_append(read_by, $2)
            WHERE sender_id = $1 AND NOT ($2 = ANY(read_by))
            "#,
        )
        .bind(sender_id.0)
        .bind(reader_id.0)
        .execute(&*self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn add_seen(&self, message_id: MessageId, user_id: UserId) -> DomainResult<()> {
        let result = query(
            r#"
            UPDATE messages
            SET seen_by = CASE
                WHEN $2 = ANY(seen_by) THEN seen_by
                ELSE array_append(seen_by, $2)
            END
            WHERE id = $1
            "#,
        )
        .bind(message_id.0)
        .bind(user_id.0)
        .execute(&*self.pool)
        .await
        .map_err(storage_error)?;

        Self::require_hit(result, message_id)
    }

    async fn set_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
        emoji: &str,
    ) -> DomainResult<Vec<Reaction>> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let row: Option<(JsonValue,)> =
            query_as("SELECT reactions FROM messages WHERE id = $1 FOR UPDATE")
                .bind(message_id.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(storage_error)?;

        let (payload,) = row.ok_or_else(|| DomainError::not_found("message", message_id))?;
        let mut reactions: Vec<Reaction> = serde_json::from_value(payload)
            .map_err(|e| DomainError::storage(format!("invalid reactions payload: {e}")))?;

        // 替换语义：同一用户至多一条回应
        reactions.retain(|r| r.user != user_id);
        reactions.push(Reaction {
            user: user_id,
            emoji: emoji.to_owned(),
        });

        let payload = serde_json::to_value(&reactions)
            .map_err(|e| DomainError::storage(format!("serialize reactions: {e}")))?;
        query("UPDATE messages SET reactions = $2 WHERE id = $1")
            .bind(message_id.0)
            .bind(payload)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(reactions)
    }

    async fn add_deleted_for(&self, message_id: MessageId, user_id: UserId) -> DomainResult<()> {
        let result = query(
            r#"
            UPDATE messages
            SET deleted_for = CASE
                WHEN $2 = ANY(deleted_for) THEN deleted_for
                ELSE array_append(deleted_for, $2)
            END
            WHERE id = $1
            "#,
        )
        .bind(message_id.0)
        .bind(user_id.0)
        .execute(&*self.pool)
        .await
        .map_err(storage_error)?;

        Self::require_hit(result, message_id)
    }

    async fn tombstone(&self, message_id: MessageId) -> DomainResult<()> {
        let result = query(
            r#"
            UPDATE messages
            SET text = NULL, media_url = NULL, media_type = NULL, public_id = NULL,
                is_deleted_globally = TRUE
            WHERE id = $1
            "#,
        )
        .bind(message_id.0)
        .execute(&*self.pool)
        .await
        .map_err(storage_error)?;

        Self::require_hit(result, message_id)
    }

    async fn list_chat(&self, chat_id: ChatId, viewer_id: UserId) -> DomainResult<Vec<Message>> {
        let rows: Vec<DbMessage> = query_as(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS} FROM messages
            WHERE chat_id = $1 AND NOT ($2 = ANY(deleted_for))
            ORDER BY created_at ASC
            "#,
        ))
        .bind(chat_id.0)
        .bind(viewer_id.0)
        .fetch_all(&*self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

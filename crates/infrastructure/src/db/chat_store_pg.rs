//! 会话存储的 Postgres 实现

use std::sync::Arc;

use async_trait::async_trait;
use domain::{Chat, ChatId, ChatStore, DomainResult, UserId};
use sqlx::{query, query_as, FromRow};
use uuid::Uuid;

use crate::db::{storage_error, DbPool};

#[derive(Debug, Clone, FromRow)]
struct DbChat {
    id: Uuid,
    is_group: bool,
    name: Option<String>,
    admin_id: Option<Uuid>,
    member_ids: Vec<Uuid>,
}

impl From<DbChat> for Chat {
    fn from(row: DbChat) -> Self {
        Chat {
            id: ChatId::new(row.id),
            members: row.member_ids.into_iter().map(UserId::new).collect(),
            is_group: row.is_group,
            name: row.name,
            admin: row.admin_id.map(UserId::new),
        }
    }
}

const CHAT_COLUMNS: &str = "id, is_group, name, admin_id, member_ids";

pub struct PgChatStore {
    pool: Arc<DbPool>,
}

impl PgChatStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn create(&self, chat: Chat) -> DomainResult<Chat> {
        let row: DbChat = query_as(&format!(
            "INSERT INTO chats (id, is_group, name, admin_id, member_ids) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CHAT_COLUMNS}"
        ))
        .bind(chat.id.0)
        .bind(chat.is_group)
        .bind(&chat.name)
        .bind(chat.admin.map(|id| id.0))
        .bind(chat.members.iter().map(|id| id.0).collect::<Vec<Uuid>>())
        .fetch_one(&*self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.into())
    }

    async fn get(&self, chat_id: ChatId) -> DomainResult<Option<Chat>> {
        let row: Option<DbChat> = query_as(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE id = $1"
        ))
        .bind(chat_id.0)
        .fetch_optional(&*self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Into::into))
    }

    async fn find_direct(&self, a: UserId, b: UserId) -> DomainResult<Option<Chat>> {
        let row: Option<DbChat> = query_as(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats \
             WHERE is_group = FALSE AND member_ids @> ARRAY[$1, $2]::uuid[] \
             LIMIT 1"
        ))
        .bind(a.0)
        .bind(b.0)
        .fetch_optional(&*self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Into::into))
    }

    async fn chats_containing(&self, user_id: UserId) -> DomainResult<Vec<Chat>> {
        let rows: Vec<DbChat> = query_as(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE $1 = ANY(member_ids)"
        ))
        .bind(user_id.0)
        .fetch_all(&*self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn direct_chats_of(&self, user_id: UserId) -> DomainResult<Vec<Chat>> {
        let rows: Vec<DbChat> = query_as(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE $1 = ANY(member_ids) AND is_group = FALSE"
        ))
        .bind(user_id.0)
        .fetch_all(&*self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_member(&self, chat_id: ChatId, user_id: UserId) -> DomainResult<()> {
        // 数组追加带存在性检查，重复追加是无害的空操作
        query(
            r#"
            UPDATE chats
            SET member_ids = array_append(member_ids, $2)
            WHERE id = $1 AND NOT ($2 = ANY(member_ids))
            "#,
        )
        .bind(chat_id.0)
        .bind(user_id.0)
        .execute(&*self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn remove_member(&self, chat_id: ChatId, user_id: UserId) -> DomainResult<()> {
        query("UPDATE chats SET member_ids = array_remove(member_ids, $2) WHERE id = $1")
            .bind(chat_id.0)
            .bind(user_id.0)
            .execute(&*self.pool)
            .await
            .map_err(storage_error)?;

        Ok(())
    }
}

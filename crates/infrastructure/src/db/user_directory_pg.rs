//! 用户目录的 Postgres 实现

use std::sync::Arc;

use async_trait::async_trait;
use domain::{DomainError, DomainResult, UserDirectory, UserId, UserSummary};
use sqlx::{query_as, FromRow};
use uuid::Uuid;

use crate::db::{storage_error, DbPool};

#[derive(Debug, Clone, FromRow)]
struct DbUserSummary {
    id: Uuid,
    name: String,
    avatar_url: Option<String>,
}

impl From<DbUserSummary> for UserSummary {
    fn from(row: DbUserSummary) -> Self {
        UserSummary {
            id: UserId::new(row.id),
            name: row.name,
            avatar_url: row.avatar_url,
        }
    }
}

pub struct PgUserDirectory {
    pool: Arc<DbPool>,
}

impl PgUserDirectory {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn friend_ids(&self, user_id: UserId) -> DomainResult<Vec<UserId>> {
        let row: Option<(Vec<Uuid>,)> =
            query_as("SELECT friend_ids FROM users WHERE id = $1")
                .bind(user_id.0)
                .fetch_optional(&*self.pool)
                .await
                .map_err(storage_error)?;

        let (friend_ids,) = row.ok_or_else(|| DomainError::not_found("user", user_id))?;
        Ok(friend_ids.into_iter().map(UserId::new).collect())
    }

    async fn summaries(&self, user_ids: &[UserId]) -> DomainResult<Vec<UserSummary>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = user_ids.iter().map(|id| id.0).collect();
        let rows: Vec<DbUserSummary> = query_as(
            r#"
            SELECT u.id, u.name, u.avatar_url
            FROM unnest($1::uuid[]) WITH ORDINALITY AS req(id, ord)
            JOIN users u ON u.id = req.id
            ORDER BY req.ord
            "#,
        )
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

//! PostgreSQL 存储层
//!
//! 连接池创建、建表语句与三个存储 trait 的 Postgres 实现。

use domain::DomainError;
use sqlx::{Pool, Postgres};

mod chat_store_pg;
mod message_store_pg;
mod user_directory_pg;

pub use chat_store_pg::PgChatStore;
pub use message_store_pg::PgMessageStore;
pub use user_directory_pg::PgUserDirectory;

pub type DbPool = Pool<Postgres>;

/// 创建数据库连接池。
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// 启动时按需建表。成员与状态集合存 uuid 数组，表情回应存 jsonb。
pub async fn ensure_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            avatar_url TEXT,
            friend_ids UUID[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chats (
            id UUID PRIMARY KEY,
            is_group BOOLEAN NOT NULL DEFAULT FALSE,
            name TEXT,
            admin_id UUID,
            member_ids UUID[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id UUID PRIMARY KEY,
            chat_id UUID NOT NULL,
            sender_id UUID NOT NULL,
            text TEXT,
            media_url TEXT,
            media_type TEXT,
            public_id TEXT,
            read_by UUID[] NOT NULL DEFAULT '{}',
            seen_by UUID[] NOT NULL DEFAULT '{}',
            deleted_for UUID[] NOT NULL DEFAULT '{}',
            reactions JSONB NOT NULL DEFAULT '[]',
            is_deleted_globally BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_chat_created ON messages (chat_id, created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

pub(crate) fn storage_error(err: sqlx::Error) -> DomainError {
    DomainError::storage(err.to_string())
}

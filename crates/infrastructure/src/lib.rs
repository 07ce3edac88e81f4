//! 基础设施层
//!
//! PostgreSQL 存储实现、Redis 跨实例事件扇出与外部媒体释放客户端。

pub mod db;
pub mod media;
pub mod redis;

pub use crate::db::{create_pool, ensure_schema, DbPool};
pub use crate::media::HttpMediaStorage;
pub use crate::redis::{run_subscriber, EventEnvelope, RedisEventRouter, RedisRouterError};

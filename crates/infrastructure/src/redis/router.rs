//! 跨实例事件路由

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use application::{BroadcastError, EventRouter, LocalEventRouter, ServerEvent};
use domain::{ChatId, UserId};

#[derive(Debug, Error)]
pub enum RedisRouterError {
    #[error("连接 Redis 失败: {0}")]
    Connect(#[from] redis::RedisError),
}

/// 投递目标：单个用户，或一个房间（可选跳过一名成员）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum EventScope {
    User {
        user_id: UserId,
    },
    Chat {
        chat_id: ChatId,
        skip: Option<UserId>,
    },
}

/// 发布到共享频道的信封。`origin` 是发起实例的标识，
/// 订阅端据此丢弃本实例已经投递过的事件。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub origin: Uuid,
    #[serde(flatten)]
    pub target: EventScope,
    pub event: ServerEvent,
}

/// 用 Redis Pub/Sub 包装本地路由。
///
/// 每次投递先走本地连接表，再把信封发布到共享频道让其他
/// 实例补投。发布失败只记日志：本地投递已经完成，跨实例
/// 扇出属于尽力而为。
pub struct RedisEventRouter {
    local: LocalEventRouter,
    publisher: Mutex<ConnectionManager>,
    channel: String,
    instance_id: Uuid,
}

impl RedisEventRouter {
    pub async fn connect(
        local: LocalEventRouter,
        redis_url: &str,
        channel: impl Into<String>,
    ) -> Result<Self, RedisRouterError> {
        let client = redis::Client::open(redis_url)?;
        let publisher = ConnectionManager::new(client).await?;
        let instance_id = Uuid::new_v4();

        tracing::info!(%instance_id, "Redis 事件路由已连接");

        Ok(Self {
            local,
            publisher: Mutex::new(publisher),
            channel: channel.into(),
            instance_id,
        })
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// 把其他实例发来的信封交给本地路由补投。
    pub async fn deliver_remote(&self, envelope: EventEnvelope) -> Result<(), BroadcastError> {
        if envelope.origin == self.instance_id {
            return Ok(());
        }
        match envelope.target {
            EventScope::User { user_id } => self.local.to_user(user_id, envelope.event).await,
            EventScope::Chat { chat_id, skip } => {
                self.local.to_chat(chat_id, skip, envelope.event).await
            }
        }
    }

    async fn publish(&self, target: EventScope, event: ServerEvent) {
        let envelope = EventEnvelope {
            origin: self.instance_id,
            target,
            event,
        };

        let payload = match serde_json::to_string(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "序列化事件信封失败");
                return;
            }
        };

        let mut publisher = self.publisher.lock().await;
        if let Err(e) = publisher
            .publish::<_, _, ()>(&self.channel, payload)
            .await
        {
            tracing::warn!(error = %e, channel = %self.channel, "跨实例事件发布失败");
        }
    }
}

#[async_trait]
impl EventRouter for RedisEventRouter {
    async fn to_user(&self, user_id: UserId, event: ServerEvent) -> Result<(), BroadcastError> {
        self.local.to_user(user_id, event.clone()).await?;
        self.publish(EventScope::User { user_id }, event).await;
        Ok(())
    }

    async fn to_chat(
        &self,
        chat_id: ChatId,
        skip: Option<UserId>,
        event: ServerEvent,
    ) -> Result<(), BroadcastError> {
        self.local.to_chat(chat_id, skip, event.clone()).await?;
        self.publish(EventScope::Chat { chat_id, skip }, event)
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trips_with_flattened_scope() {
        let envelope = EventEnvelope {
            origin: Uuid::new_v4(),
            target: EventScope::Chat {
                chat_id: ChatId::new(Uuid::new_v4()),
                skip: None,
            },
            event: ServerEvent::AuthError,
        };

        let json = serde_json::to_string(&envelope).expect("serialize");
        assert!(json.contains("\"scope\":\"chat\""));

        let parsed: EventEnvelope = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.origin, envelope.origin);
        assert!(matches!(parsed.target, EventScope::Chat { skip: None, .. }));
    }
}

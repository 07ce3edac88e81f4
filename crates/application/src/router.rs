use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use domain::{ChatId, UserId};

use crate::events::ServerEvent;
use crate::state::CoordinatorState;

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("broadcast failed: {0}")]
    Failed(String),
}

impl BroadcastError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// 事件路由抽象：按用户或按房间投递服务端事件。
///
/// 单实例部署使用 [`LocalEventRouter`]；多实例部署用 Redis
/// Pub/Sub 包装本地路由，使消息广播对实例透明。
#[async_trait]
pub trait EventRouter: Send + Sync {
    /// 投递到指定用户的活跃连接。用户离线时静默丢弃。
    async fn to_user(&self, user_id: UserId, event: ServerEvent) -> Result<(), BroadcastError>;

    /// 投递到房间的当前订阅者，可选地跳过一名用户（通常是发起者）。
    async fn to_chat(
        &self,
        chat_id: ChatId,
        skip: Option<UserId>,
        event: ServerEvent,
    ) -> Result<(), BroadcastError>;
}

/// 本实例内的事件路由：通过连接注册表与房间订阅表解析目标连接。
pub struct LocalEventRouter {
    state: Arc<CoordinatorState>,
}

impl LocalEventRouter {
    pub fn new(state: Arc<CoordinatorState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl EventRouter for LocalEventRouter {
    async fn to_user(&self, user_id: UserId, event: ServerEvent) -> Result<(), BroadcastError> {
        if let Some(handle) = self.state.handle_of(user_id).await {
            if !handle.send(event) {
                tracing::debug!(%user_id, "连接接收端已关闭，事件被丢弃");
            }
        }
        Ok(())
    }

    async fn to_chat(
        &self,
        chat_id: ChatId,
        skip: Option<UserId>,
        event: ServerEvent,
    ) -> Result<(), BroadcastError> {
        for member in self.state.room_members(chat_id).await {
            if skip == Some(member) {
                continue;
            }
            if let Some(handle) = self.state.handle_of(member).await {
                if !handle.send(event.clone()) {
                    tracing::debug!(%member, %chat_id, "连接接收端已关闭，事件被丢弃");
                }
            }
        }
        Ok(())
    }
}

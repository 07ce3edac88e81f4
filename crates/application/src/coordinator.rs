//! 协调器服务
//!
//! 各事件处理器分布在 `presence` / `rooms` / `typing` / `unread` /
//! `messages` / `chats` 模块中，共享这里定义的依赖。

use std::sync::Arc;

use domain::{ChatStore, MessageStore, UserDirectory};

use crate::media::MediaStorage;
use crate::router::EventRouter;
use crate::state::CoordinatorState;

/// 协调器依赖集合
pub struct CoordinatorDependencies {
    pub state: Arc<CoordinatorState>,
    pub users: Arc<dyn UserDirectory>,
    pub chats: Arc<dyn ChatStore>,
    pub messages: Arc<dyn MessageStore>,
    pub router: Arc<dyn EventRouter>,
    pub media: Arc<dyn MediaStorage>,
}

/// 在线状态与消息协调器
pub struct Coordinator {
    pub(crate) state: Arc<CoordinatorState>,
    pub(crate) users: Arc<dyn UserDirectory>,
    pub(crate) chats: Arc<dyn ChatStore>,
    pub(crate) messages: Arc<dyn MessageStore>,
    pub(crate) router: Arc<dyn EventRouter>,
    pub(crate) media: Arc<dyn MediaStorage>,
}

impl Coordinator {
    pub fn new(deps: CoordinatorDependencies) -> Self {
        Self {
            state: deps.state,
            users: deps.users,
            chats: deps.chats,
            messages: deps.messages,
            router: deps.router,
            media: deps.media,
        }
    }

    pub fn state(&self) -> &Arc<CoordinatorState> {
        &self.state
    }
}

//! 集成测试共用脚手架：内存存储 + 真实协调器状态与本地路由。

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use application::memory::{InMemoryChatStore, InMemoryMessageStore, InMemoryUserDirectory};
use application::{
    ConnectionHandle, Coordinator, CoordinatorDependencies, CoordinatorState, LocalEventRouter,
    NoopMediaStorage, ServerEvent,
};
use domain::{Chat, ChatId, UserId, UserSummary};

/// 一个已连接用户的测试视角。
pub struct Client {
    pub user_id: UserId,
    pub connection_id: Uuid,
    rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Client {
    /// 取出目前已投递到该连接的全部事件。
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

pub struct TestBed {
    pub coordinator: Coordinator,
    pub state: Arc<CoordinatorState>,
    pub users: Arc<InMemoryUserDirectory>,
    pub chats: Arc<InMemoryChatStore>,
    pub messages: Arc<InMemoryMessageStore>,
}

impl TestBed {
    pub fn new() -> Self {
        let state = Arc::new(CoordinatorState::new());
        let users = Arc::new(InMemoryUserDirectory::new());
        let chats = Arc::new(InMemoryChatStore::new());
        let messages = Arc::new(InMemoryMessageStore::new());
        let router = Arc::new(LocalEventRouter::new(state.clone()));

        let coordinator = Coordinator::new(CoordinatorDependencies {
            state: state.clone(),
            users: users.clone(),
            chats: chats.clone(),
            messages: messages.clone(),
            router,
            media: Arc::new(NoopMediaStorage),
        });

        Self {
            coordinator,
            state,
            users,
            chats,
            messages,
        }
    }

    pub async fn register_user(&self, name: &str) -> UserId {
        let user_id = UserId::new(Uuid::new_v4());
        self.users.insert_user(UserSummary::new(user_id, name)).await;
        user_id
    }

    pub async fn befriend(&self, a: UserId, b: UserId) {
        self.users.befriend(a, b).await;
    }

    pub async fn direct_chat(&self, a: UserId, b: UserId) -> ChatId {
        let chat = Chat::direct(ChatId::new(Uuid::new_v4()), a, b);
        let chat_id = chat.id;
        self.chats.insert(chat).await;
        chat_id
    }

    pub async fn group_chat(&self, name: &str, admin: UserId, members: Vec<UserId>) -> ChatId {
        let chat = Chat::group(ChatId::new(Uuid::new_v4()), name, admin, members);
        let chat_id = chat.id;
        self.chats.insert(chat).await;
        chat_id
    }

    /// 建立连接并完成 join 编排，返回客户端视角。
    pub async fn connect(&self, user_id: UserId) -> Client {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle::new(tx);
        let connection_id = handle.connection_id;
        self.coordinator
            .join(user_id, handle)
            .await
            .expect("join should succeed for a registered user");
        Client {
            user_id,
            connection_id,
            rx,
        }
    }

    pub async fn disconnect(&self, client: &Client) {
        self.coordinator
            .disconnect(client.user_id, client.connection_id)
            .await
            .expect("disconnect cleanup should not fail");
    }
}

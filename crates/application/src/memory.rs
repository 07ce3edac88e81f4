//! 内存实现的存储接口（用于测试与单实例开发环境）

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use domain::{
    Chat, ChatId, ChatStore, DomainError, DomainResult, Message, MessageId, MessageStore,
    NewMessage, Reaction, UserDirectory, UserId, UserSummary,
};

/// 内存用户目录
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserSummary>>,
    friends: RwLock<HashMap<UserId, Vec<UserId>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, summary: UserSummary) {
        self.users.write().await.insert(summary.id, summary);
    }

    /// 建立双向好友关系。
    pub async fn befriend(&self, a: UserId, b: UserId) {
        let mut friends = self.friends.write().await;
        friends.entry(a).or_default().push(b);
        friends.entry(b).or_default().push(a);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn friend_ids(&self, user_id: UserId) -> DomainResult<Vec<UserId>> {
        if !self.users.read().await.contains_key(&user_id) {
            return Err(DomainError::not_found("user", user_id));
        }
        Ok(self
            .friends
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn summaries(&self, user_ids: &[UserId]) -> DomainResult<Vec<UserSummary>> {
        let users = self.users.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect())
    }
}

/// 内存会话存储
#[derive(Debug, Default)]
pub struct InMemoryChatStore {
    chats: RwLock<HashMap<ChatId, Chat>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, chat: Chat) {
        self.chats.write().await.insert(chat.id, chat);
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn create(&self, chat: Chat) -> DomainResult<Chat> {
        self.chats.write().await.insert(chat.id, chat.clone());
        Ok(chat)
    }

    async fn get(&self, chat_id: ChatId) -> DomainResult<Option<Chat>> {
        Ok(self.chats.read().await.get(&chat_id).cloned())
    }

    async fn find_direct(&self, a: UserId, b: UserId) -> DomainResult<Option<Chat>> {
        Ok(self
            .chats
            .read()
            .await
            .values()
            .find(|chat| !chat.is_group && chat.is_member(a) && chat.is_member(b))
            .cloned())
    }

    async fn chats_containing(&self, user_id: UserId) -> DomainResult<Vec<Chat>> {
        Ok(self
            .chats
            .read()
            .await
            .values()
            .filter(|chat| chat.is_member(user_id))
            .cloned()
            .collect())
    }

    async fn direct_chats_of(&self, user_id: UserId) -> DomainResult<Vec<Chat>> {
        Ok(self
            .chats
            .read()
            .await
            .values()
            .filter(|chat| !chat.is_group && chat.is_member(user_id))
            .cloned()
            .collect())
    }

    async fn add_member(&self, chat_id: ChatId, user_id: UserId) -> DomainResult<()> {
        let mut chats = self.chats.write().await;
        let chat = chats
            .get_mut(&chat_id)
            .ok_or_else(|| DomainError::not_found("chat", chat_id))?;
        if !chat.members.contains(&user_id) {
            chat.members.push(user_id);
        }
        Ok(())
    }

    async fn remove_member(&self, chat_id: ChatId, user_id: UserId) -> DomainResult<()> {
        let mut chats = self.chats.write().await;
        let chat = chats
            .get_mut(&chat_id)
            .ok_or_else(|| DomainError::not_found("chat", chat_id))?;
        chat.members.retain(|id| *id != user_id);
        Ok(())
    }
}

/// 内存消息存储。以插入顺序保存消息，与按创建时间排序等价。
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<Vec<Message>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn with_message<T>(
        &self,
        message_id: MessageId,
        apply: impl FnOnce(&mut Message) -> T,
    ) -> DomainResult<T> {
        let mut messages = self.messages.write().await;
        let message = messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| DomainError::not_found("message", message_id))?;
        Ok(apply(message))
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn create(&self, payload: NewMessage) -> DomainResult<Message> {
        let message = Message::create(payload)?;
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn find(&self, message_id: MessageId) -> DomainResult<Option<Message>> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .find(|m| m.id == message_id)
            .cloned())
    }

    async fn count_unread_from(
        &self,
        sender_id: UserId,
        chat_id: ChatId,
        reader_id: UserId,
    ) -> DomainResult<u64> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| {
                m.chat_id == chat_id && m.sender_id == sender_id && !m.is_read_by(reader_id)
            })
            .count() as u64)
    }

    async fn mark_read_from(&self, sender_id: UserId, reader_id: UserId) -> DomainResult<()> {
        for message in self
            .messages
            .write()
            .await
            .iter_mut()
            .filter(|m| m.sender_id == sender_id)
        {
            message.mark_read(reader_id);
        }
        Ok(())
    }

    async fn add_seen(&self, message_id: MessageId, user_id: UserId) -> DomainResult<()> {
        self.with_message(message_id, |message| {
            message.mark_seen(user_id);
        })
        .await
    }

    async fn set_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
        emoji: &str,
    ) -> DomainResult<Vec<Reaction>> {
        self.with_message(message_id, |message| {
            message.set_reaction(user_id, emoji);
            message.reactions.clone()
        })
        .await
    }

    async fn add_deleted_for(&self, message_id: MessageId, user_id: UserId) -> DomainResult<()> {
        self.with_message(message_id, |message| {
            message.delete_for(user_id);
        })
        .await
    }

    async fn tombstone(&self, message_id: MessageId) -> DomainResult<()> {
        self.with_message(message_id, |message| message.tombstone())
            .await
    }

    async fn list_chat(&self, chat_id: ChatId, viewer_id: UserId) -> DomainResult<Vec<Message>> {
        Ok(self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.chat_id == chat_id && m.is_visible_to(viewer_id))
            .cloned()
            .collect())
    }
}

use async_trait::async_trait;

use crate::entities::chat::Chat;
use crate::errors::DomainResult;
use crate::value_objects::{ChatId, UserId};

/// 会话存储：持久化的会话文档与成员关系。
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// 持久化一个新会话并返回完整记录。
    async fn create(&self, chat: Chat) -> DomainResult<Chat>;

    /// 按 ID 查找会话。
    async fn get(&self, chat_id: ChatId) -> DomainResult<Option<Chat>>;

    /// 查找同时包含两名成员的 1:1 会话。
    async fn find_direct(&self, a: UserId, b: UserId) -> DomainResult<Option<Chat>>;

    /// 用户作为持久化成员所属的全部会话。
    async fn chats_containing(&self, user_id: UserId) -> DomainResult<Vec<Chat>>;

    /// 用户所属的全部 1:1 会话（未读计数重建用）。
    async fn direct_chats_of(&self, user_id: UserId) -> DomainResult<Vec<Chat>>;

    /// 向会话追加成员。调用方负责管理员鉴权与重复成员检查。
    async fn add_member(&self, chat_id: ChatId, user_id: UserId) -> DomainResult<()>;

    /// 从会话移除成员。移除不存在的成员是无害的空操作。
    async fn remove_member(&self, chat_id: ChatId, user_id: UserId) -> DomainResult<()>;
}

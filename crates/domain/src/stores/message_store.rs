use async_trait::async_trait;

use crate::entities::message::{Message, NewMessage, Reaction};
use crate::errors::DomainResult;
use crate::value_objects::{ChatId, MessageId, UserId};

/// 消息存储：消息记录的创建与生命周期字段更新。
///
/// 未读计数等内存缓存永远以这里的计数为权威来源。
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// 持久化一条新消息并返回完整记录。
    async fn create(&self, payload: NewMessage) -> DomainResult<Message>;

    /// 按 ID 查找消息。
    async fn find(&self, message_id: MessageId) -> DomainResult<Option<Message>>;

    /// 指定会话中某发送者尚未被 `reader` 标记已读的消息数。
    async fn count_unread_from(
        &self,
        sender_id: UserId,
        chat_id: ChatId,
        reader_id: UserId,
    ) -> DomainResult<u64>;

    /// 批量已读：将 `reader` 加入该发送者全部消息的已读集合。
    async fn mark_read_from(&self, sender_id: UserId, reader_id: UserId) -> DomainResult<()>;

    /// 幂等地将用户加入消息的已见集合。消息不存在时返回 `NotFound`。
    async fn add_seen(&self, message_id: MessageId, user_id: UserId) -> DomainResult<()>;

    /// 替换式设置用户的表情回应，返回更新后的完整回应列表。
    async fn set_reaction(
        &self,
        message_id: MessageId,
        user_id: UserId,
        emoji: &str,
    ) -> DomainResult<Vec<Reaction>>;

    /// 幂等地将用户加入消息的本地删除集合。
    async fn add_deleted_for(&self, message_id: MessageId, user_id: UserId) -> DomainResult<()>;

    /// 全局删除：清空内容字段并落下墓碑标记。
    async fn tombstone(&self, message_id: MessageId) -> DomainResult<()>;

    /// 会话的消息列表，排除 `viewer` 本地删除的行，保留墓碑。
    async fn list_chat(&self, chat_id: ChatId, viewer_id: UserId) -> DomainResult<Vec<Message>>;
}

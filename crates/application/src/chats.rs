//! 会话创建与群成员增删
//!
//! 1:1 会话按成员对查找或创建，不产生重复文档；群聊创建要求
//! 名称与至少两名其他成员，请求者自动成为管理员兼成员。成员
//! 增删要求请求者等于群聊存储的管理员。重复添加以冲突拒绝
//! （而非静默忽略），移除不存在的成员则是幂等接受。

use uuid::Uuid;

use domain::{Chat, ChatId, ChatWithMembers, DomainError, UserId};

use crate::coordinator::Coordinator;
use crate::error::ApplicationResult;

impl Coordinator {
    /// 查找或创建两名用户之间的 1:1 会话。
    ///
    /// 返回会话与是否新建：已有会话直接复用，保证同一对用户
    /// 至多一个 1:1 会话文档。
    pub async fn create_direct_chat(
        &self,
        actor_id: UserId,
        other_id: UserId,
    ) -> ApplicationResult<(ChatWithMembers, bool)> {
        if actor_id == other_id {
            return Err(
                DomainError::validation("otherUserId", "cannot start a chat with yourself").into(),
            );
        }

        if let Some(existing) = self.chats.find_direct(actor_id, other_id).await? {
            let resolved = self.resolve_members(existing.id).await?;
            return Ok((resolved, false));
        }

        let chat = self
            .chats
            .create(Chat::direct(ChatId::new(Uuid::new_v4()), actor_id, other_id))
            .await?;

        tracing::info!(chat_id = %chat.id, %actor_id, %other_id, "1:1 会话已创建");
        Ok((self.resolve_members(chat.id).await?, true))
    }

    /// 创建群聊，请求者成为管理员。
    pub async fn create_group_chat(
        &self,
        actor_id: UserId,
        name: &str,
        mut members: Vec<UserId>,
    ) -> ApplicationResult<ChatWithMembers> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("chatName", "group name is required").into());
        }
        members.retain(|id| *id != actor_id);
        if members.len() < 2 {
            return Err(DomainError::validation(
                "members",
                "group must have at least 2 other members",
            )
            .into());
        }
        members.push(actor_id);

        let chat = self
            .chats
            .create(Chat::group(
                ChatId::new(Uuid::new_v4()),
                name.trim(),
                actor_id,
                members,
            ))
            .await?;

        tracing::info!(chat_id = %chat.id, %actor_id, "群聊已创建");
        self.resolve_members(chat.id).await
    }

    /// 管理员向群聊添加成员。
    pub async fn add_member(
        &self,
        actor_id: UserId,
        chat_id: ChatId,
        target_id: UserId,
    ) -> ApplicationResult<ChatWithMembers> {
        let chat = self.require_group(chat_id).await?;

        if !chat.is_admin(actor_id) {
            return Err(DomainError::forbidden("only the group admin can add members").into());
        }
        if chat.is_member(target_id) {
            return Err(DomainError::conflict("user is already a member").into());
        }

        self.chats.add_member(chat_id, target_id).await?;

        tracing::info!(%chat_id, %target_id, "群成员已添加");
        self.resolve_members(chat_id).await
    }

    /// 管理员从群聊移除成员。
    pub async fn remove_member(
        &self,
        actor_id: UserId,
        chat_id: ChatId,
        target_id: UserId,
    ) -> ApplicationResult<ChatWithMembers> {
        let chat = self.require_group(chat_id).await?;

        if !chat.is_admin(actor_id) {
            return Err(DomainError::forbidden("only the group admin can remove members").into());
        }

        self.chats.remove_member(chat_id, target_id).await?;

        tracing::info!(%chat_id, %target_id, "群成员已移除");
        self.resolve_members(chat_id).await
    }

    /// 会话必须存在且为群聊。
    async fn require_group(&self, chat_id: ChatId) -> ApplicationResult<domain::Chat> {
        self.chats
            .get(chat_id)
            .await?
            .filter(|chat| chat.is_group)
            .ok_or_else(|| DomainError::not_found("group chat", chat_id).into())
    }

    /// 更新之后重新读取会话并把成员解析为展示摘要。
    async fn resolve_members(&self, chat_id: ChatId) -> ApplicationResult<ChatWithMembers> {
        let chat = self
            .chats
            .get(chat_id)
            .await?
            .ok_or_else(|| DomainError::not_found("group chat", chat_id))?;

        let members = self.users.summaries(&chat.members).await?;
        Ok(ChatWithMembers::new(chat, members))
    }
}

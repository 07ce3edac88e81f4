//! 房间订阅跟踪
//!
//! 房间订阅是瞬时状态：用户可以是会话的持久化成员而不订阅其
//! 实时更新（客户端停留在其他视图）。成员的在线/离线划分基于
//! 连接注册表——"在线"指有活跃连接，而非正在查看该会话。

use domain::{ChatId, DomainError, UserId, UserSummary};

use crate::coordinator::Coordinator;
use crate::error::ApplicationResult;
use crate::events::ServerEvent;

impl Coordinator {
    /// 用户订阅会话的实时更新。
    pub async fn join_chat(&self, user_id: UserId, chat_id: ChatId) -> ApplicationResult<()> {
        // 没有活跃连接的订阅请求直接忽略
        if !self.state.is_online(user_id).await {
            return Ok(());
        }

        self.state.join_room(chat_id, user_id).await;

        let chat = self
            .chats
            .get(chat_id)
            .await?
            .ok_or_else(|| DomainError::not_found("chat", chat_id))?;

        let others = chat.members_excluding(user_id);
        let summaries = self.users.summaries(&others).await?;

        let mut online_members: Vec<UserSummary> = Vec::new();
        let mut offline_members: Vec<UserSummary> = Vec::new();
        for summary in summaries {
            if self.state.is_online(summary.id).await {
                online_members.push(summary);
            } else {
                offline_members.push(summary);
            }
        }

        self.router
            .to_user(
                user_id,
                ServerEvent::ChatMembersStatus {
                    chat_id,
                    online_members,
                    offline_members,
                },
            )
            .await?;

        self.router
            .to_chat(
                chat_id,
                Some(user_id),
                ServerEvent::MemberJoinedChat { user_id, chat_id },
            )
            .await?;

        Ok(())
    }

    /// 用户取消订阅会话，空订阅集随之回收。
    pub async fn leave_chat(&self, user_id: UserId, chat_id: ChatId) -> ApplicationResult<()> {
        if !self.state.is_online(user_id).await {
            return Ok(());
        }

        self.state.leave_room(chat_id, user_id).await;

        self.router
            .to_chat(
                chat_id,
                Some(user_id),
                ServerEvent::MemberLeftChat { user_id, chat_id },
            )
            .await?;

        Ok(())
    }
}

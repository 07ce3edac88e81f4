//! 消息生命周期管理
//!
//! 消息状态机：活跃 -> {已见、已读、有回应}（并发、非互斥）->
//! 全局删除（终态）或本地删除（仅影响删除者视图）。每次存储
//! 往返之后都重新读取相关实体再做变更写入。

use domain::{ChatId, DomainError, Message, MessageId, NewMessage, UserId};

use crate::coordinator::Coordinator;
use crate::error::ApplicationResult;
use crate::events::ServerEvent;

/// 发送消息命令
#[derive(Debug, Clone)]
pub struct SendMessage {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub text: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub public_id: Option<String>,
}

/// 删除模式：全局删除或仅删除者本地删除
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    Everyone,
    Me,
}

impl Coordinator {
    /// 创建并投递一条新消息。
    ///
    /// 持久化之后解析会话成员：不在房间订阅集中的接收者重新统计
    /// 未读数（权威计数，而非本地加一），当前订阅者收到完整消息。
    pub async fn send_message(&self, command: SendMessage) -> ApplicationResult<Message> {
        let payload = NewMessage {
            chat_id: command.chat_id,
            sender_id: command.sender_id,
            text: command.text,
            media_url: command.media_url,
            media_type: command.media_type,
            public_id: command.public_id,
        };
        payload.validate()?;

        let message = self.messages.create(payload).await?;

        // 持久化往返之后重新确认会话仍然存在
        let chat = self
            .chats
            .get(command.chat_id)
            .await?
            .ok_or_else(|| DomainError::not_found("chat", command.chat_id))?;

        for recipient_id in chat.members_excluding(command.sender_id) {
            if self.state.room_has(chat.id, recipient_id).await {
                continue;
            }

            let count = self
                .messages
                .count_unread_from(command.sender_id, chat.id, recipient_id)
                .await?;
            self.state
                .set_unread(recipient_id, command.sender_id, count)
                .await;
            let _ = self
                .router
                .to_user(
                    recipient_id,
                    ServerEvent::UnreadCountUpdate {
                        sender_id: command.sender_id,
                        count,
                    },
                )
                .await;
        }

        self.router
            .to_chat(
                chat.id,
                None,
                ServerEvent::ReceiveMessage {
                    message: message.clone(),
                },
            )
            .await?;

        tracing::info!(message_id = %message.id, chat_id = %chat.id, sender_id = %command.sender_id, "消息已投递");
        Ok(message)
    }

    /// 幂等记录消息已见并广播到房间。
    pub async fn message_seen(
        &self,
        user_id: UserId,
        message_id: MessageId,
        chat_id: ChatId,
    ) -> ApplicationResult<()> {
        self.messages.add_seen(message_id, user_id).await?;

        self.router
            .to_chat(
                chat_id,
                None,
                ServerEvent::MessageSeenUpdate {
                    message_id,
                    user_id,
                },
            )
            .await?;

        Ok(())
    }

    /// 设置表情回应并广播更新后的完整回应列表。
    ///
    /// 同一用户在同一消息上至多一条回应：新回应替换旧回应。
    pub async fn react(
        &self,
        user_id: UserId,
        message_id: MessageId,
        chat_id: ChatId,
        emoji: &str,
    ) -> ApplicationResult<()> {
        if emoji.trim().is_empty() {
            return Err(DomainError::validation("emoji", "cannot be empty").into());
        }

        let reactions = self
            .messages
            .set_reaction(message_id, user_id, emoji)
            .await?;

        self.router
            .to_chat(
                chat_id,
                None,
                ServerEvent::ReactionUpdate {
                    message_id,
                    reactions,
                },
            )
            .await?;

        Ok(())
    }

    /// 两级删除。
    ///
    /// 本地删除：幂等地把请求者加入 `deletedFor`，不做广播。
    /// 全局删除：仅消息发送者可发起，且除发送者外任何成员都未
    /// 见过该消息才允许；满足条件时尽力释放外部媒体资源（失败
    /// 只记日志）、落墓碑并广播删除事件。
    pub async fn delete_message(
        &self,
        user_id: UserId,
        message_id: MessageId,
        mode: DeleteMode,
    ) -> ApplicationResult<()> {
        let message = self
            .messages
            .find(message_id)
            .await?
            .ok_or_else(|| DomainError::not_found("message", message_id))?;

        let chat = self
            .chats
            .get(message.chat_id)
            .await?
            .ok_or_else(|| DomainError::not_found("chat", message.chat_id))?;

        if !chat.is_member(user_id) {
            return Err(DomainError::forbidden("you are not a member of this chat").into());
        }

        match mode {
            DeleteMode::Me => {
                self.messages.add_deleted_for(message_id, user_id).await?;
                Ok(())
            }
            DeleteMode::Everyone => {
                if message.sender_id != user_id {
                    return Err(DomainError::forbidden(
                        "only the sender can delete a message for everyone",
                    )
                    .into());
                }

                // 成员资格确认后重新读取消息，对最新的已见集合判定
                let message = self
                    .messages
                    .find(message_id)
                    .await?
                    .ok_or_else(|| DomainError::not_found("message", message_id))?;

                let seen_by_other = chat
                    .members_excluding(message.sender_id)
                    .into_iter()
                    .any(|member_id| message.is_seen_by(member_id));
                if seen_by_other {
                    return Err(DomainError::policy_violation(
                        "message has already been seen",
                    )
                    .into());
                }

                if let Some(public_id) = message.public_id.as_deref() {
                    if let Err(err) = self
                        .media
                        .release(public_id, message.media_type.as_deref())
                        .await
                    {
                        tracing::warn!(%message_id, error = %err, "释放外部媒体资源失败");
                    }
                }

                self.messages.tombstone(message_id).await?;

                self.router
                    .to_chat(
                        chat.id,
                        None,
                        ServerEvent::MessageDeleted {
                            message_id,
                            chat_id: chat.id,
                            delete_type: "everyone".to_owned(),
                        },
                    )
                    .await?;

                tracing::info!(%message_id, chat_id = %chat.id, "消息已全局删除");
                Ok(())
            }
        }
    }

    /// 会话消息列表，排除查看者本地删除的行（墓碑保留）。
    pub async fn list_messages(
        &self,
        chat_id: ChatId,
        viewer_id: UserId,
    ) -> ApplicationResult<Vec<Message>> {
        let chat = self
            .chats
            .get(chat_id)
            .await?
            .ok_or_else(|| DomainError::not_found("chat", chat_id))?;

        if !chat.is_member(viewer_id) {
            return Err(DomainError::forbidden("you are not a member of this chat").into());
        }

        Ok(self.messages.list_chat(chat_id, viewer_id).await?)
    }
}

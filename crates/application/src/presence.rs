//! 连接与在线状态处理
//!
//! 连接事件的编排顺序：注册连接与好友缓存、重建未读计数、
//! 广播上线通知。断开事件无论有无在途处理都会执行清理。

use uuid::Uuid;

use domain::UserId;

use crate::coordinator::Coordinator;
use crate::error::ApplicationResult;
use crate::events::{PresenceStatus, ServerEvent};
use crate::state::ConnectionHandle;

impl Coordinator {
    /// 处理已鉴权连接的加入。
    ///
    /// 用户 ID 无法在用户目录解析时以 `NotFound` 失败，调用方
    /// 仅向该连接回发鉴权失败信号，不广播任何状态。
    pub async fn join(&self, user_id: UserId, handle: ConnectionHandle) -> ApplicationResult<()> {
        // 先解析好友列表：目录查不到的用户不留下任何注册痕迹
        let friend_ids = self.users.friend_ids(user_id).await?;

        self.state.register_connection(user_id, handle).await;
        self.state.set_friends(user_id, friend_ids.clone()).await;

        let unread = self.rehydrate_unread(user_id, &friend_ids).await?;
        let online_friends = self.state.online_subset(&friend_ids).await;

        self.router
            .to_user(
                user_id,
                ServerEvent::OnlineFriends {
                    friends: online_friends.clone(),
                },
            )
            .await?;
        self.router
            .to_user(user_id, ServerEvent::UnreadCounts { counts: unread })
            .await?;

        for friend_id in online_friends {
            self.router
                .to_user(
                    friend_id,
                    ServerEvent::FriendStatusChange {
                        user_id,
                        status: PresenceStatus::Online,
                    },
                )
                .await?;
        }

        self.notify_chats_status(user_id, PresenceStatus::Online)
            .await;

        tracing::info!(%user_id, "用户上线");
        Ok(())
    }

    /// 处理连接断开。
    ///
    /// 传入的连接 ID 与注册表不一致时说明该用户已经重连，旧连接
    /// 的断开不得清理新连接的状态。
    pub async fn disconnect(&self, user_id: UserId, connection_id: Uuid) -> ApplicationResult<()> {
        if !self.state.remove_connection(user_id, connection_id).await {
            tracing::debug!(%user_id, "忽略已被替换连接的断开事件");
            return Ok(());
        }

        // 向每个输入对象补发停止输入信号后丢弃输入状态
        for recipient_id in self.state.take_typing(user_id).await {
            let _ = self
                .router
                .to_user(
                    recipient_id,
                    ServerEvent::UserTyping {
                        user_id,
                        is_typing: false,
                    },
                )
                .await;
        }

        self.state.leave_all_rooms(user_id).await;

        // 离线广播使用断开前缓存的好友快照
        let friend_ids = self.state.drop_friends(user_id).await;
        for friend_id in self.state.online_subset(&friend_ids).await {
            let _ = self
                .router
                .to_user(
                    friend_id,
                    ServerEvent::FriendStatusChange {
                        user_id,
                        status: PresenceStatus::Offline,
                    },
                )
                .await;
        }

        self.notify_chats_status(user_id, PresenceStatus::Offline)
            .await;

        self.state.drop_unread(user_id).await;

        tracing::info!(%user_id, "用户下线");
        Ok(())
    }

    /// 向用户所属的每个持久化会话广播上下线事件。
    ///
    /// 会话归属查询走会话存储而非本地缓存，避免陈旧数据；
    /// 查询失败只记录日志，不影响连接事件本身。
    async fn notify_chats_status(&self, user_id: UserId, status: PresenceStatus) {
        match self.chats.chats_containing(user_id).await {
            Ok(chats) => {
                for chat in chats {
                    let _ = self
                        .router
                        .to_chat(
                            chat.id,
                            None,
                            ServerEvent::ChatMemberStatusChange {
                                user_id,
                                status,
                                chat_id: chat.id,
                            },
                        )
                        .await;
                }
            }
            Err(err) => {
                tracing::warn!(%user_id, error = %err, "查询用户所属会话失败");
            }
        }
    }
}

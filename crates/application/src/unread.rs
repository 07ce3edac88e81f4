//! 未读计数
//!
//! 计数只是缓存，权威数值永远来自消息存储的重新统计。连接时
//! 对好友的 1:1 会话做整体重建，标记已读时先做批量持久化更新
//! 再清理缓存。

use std::collections::HashMap;

use domain::UserId;

use crate::coordinator::Coordinator;
use crate::error::ApplicationResult;
use crate::events::ServerEvent;

impl Coordinator {
    /// 从消息存储重建用户的未读计数缓存。
    ///
    /// 仅扫描 1:1 会话，且对端必须在当前好友列表中；只有严格为
    /// 正的计数才会出现在结果里。
    pub(crate) async fn rehydrate_unread(
        &self,
        user_id: UserId,
        friend_ids: &[UserId],
    ) -> ApplicationResult<HashMap<UserId, u64>> {
        let mut counts = HashMap::new();

        for chat in self.chats.direct_chats_of(user_id).await? {
            let Some(other_id) = chat.other_member(user_id) else {
                continue;
            };
            if !friend_ids.contains(&other_id) {
                continue;
            }

            let count = self
                .messages
                .count_unread_from(other_id, chat.id, user_id)
                .await?;
            if count > 0 {
                counts.insert(other_id, count);
            }
        }

        self.state.set_unread_map(user_id, counts.clone()).await;
        Ok(counts)
    }

    /// 将某发送者发给该用户的全部消息标记为已读。
    ///
    /// 持久化更新成功后才清零缓存并通知用户，保证缓存不会领先
    /// 于持久化状态。
    pub async fn mark_read(&self, user_id: UserId, sender_id: UserId) -> ApplicationResult<()> {
        self.messages.mark_read_from(sender_id, user_id).await?;

        self.state.clear_unread_from(user_id, sender_id).await;

        self.router
            .to_user(
                user_id,
                ServerEvent::UnreadCountUpdate {
                    sender_id,
                    count: 0,
                },
            )
            .await?;

        Ok(())
    }
}

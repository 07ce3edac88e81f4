//! 输入状态跟踪
//!
//! 输入提示是纯瞬时信号：不落盘、不重试，接收方离线即丢弃。

use domain::{ChatId, UserId};

use crate::coordinator::Coordinator;
use crate::error::ApplicationResult;
use crate::events::ServerEvent;

impl Coordinator {
    /// 向好友发送输入状态信号。
    ///
    /// 输入提示仅限好友可见：目标不在发起者缓存的好友列表中时
    /// 整个调用是无操作（不报错、不广播）。
    pub async fn set_typing(
        &self,
        user_id: UserId,
        recipient_id: UserId,
        is_typing: bool,
    ) -> ApplicationResult<()> {
        if !self.state.friends_of(user_id).await.contains(&recipient_id) {
            return Ok(());
        }

        self.state
            .set_typing_to(user_id, recipient_id, is_typing)
            .await;

        self.router
            .to_user(recipient_id, ServerEvent::UserTyping { user_id, is_typing })
            .await?;

        Ok(())
    }

    /// 向房间其他订阅者发送输入状态信号（不含发起者本人）。
    pub async fn set_typing_in_chat(
        &self,
        user_id: UserId,
        chat_id: ChatId,
        is_typing: bool,
    ) -> ApplicationResult<()> {
        self.router
            .to_chat(
                chat_id,
                Some(user_id),
                ServerEvent::UserTypingInChat {
                    user_id,
                    is_typing,
                    chat_id,
                },
            )
            .await?;

        Ok(())
    }
}

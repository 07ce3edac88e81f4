//! 客户端入站事件
//!
//! WebSocket 文本帧的 JSON 载荷，`type` 字段路由到具体事件。

use domain::{ChatId, MessageId, UserId};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// 连接鉴权并进入在线状态
    #[serde(rename_all = "camelCase")]
    Join { user_id: UserId },
    /// 订阅会话房间
    #[serde(rename_all = "camelCase")]
    JoinChat { chat_id: ChatId },
    /// 退订会话房间
    #[serde(rename_all = "camelCase")]
    LeaveChat { chat_id: ChatId },
    /// 发送消息，发送者取自当前连接
    #[serde(rename_all = "camelCase")]
    SendMessage {
        chat_id: ChatId,
        text: Option<String>,
        media_url: Option<String>,
        media_type: Option<String>,
        public_id: Option<String>,
    },
    /// 向好友发送输入状态
    #[serde(rename_all = "camelCase")]
    Typing {
        recipient_id: UserId,
        is_typing: bool,
    },
    /// 向房间发送输入状态
    #[serde(rename_all = "camelCase")]
    TypingInChat { chat_id: ChatId, is_typing: bool },
    /// 把指定发送者的消息全部标记为已读
    #[serde(rename_all = "camelCase")]
    MarkAsRead { sender_id: UserId },
    /// 标记消息已见
    #[serde(rename_all = "camelCase")]
    MessageSeen {
        message_id: MessageId,
        chat_id: ChatId,
    },
    /// 设置表情回应
    #[serde(rename_all = "camelCase")]
    MessageReact {
        message_id: MessageId,
        chat_id: ChatId,
        emoji: String,
    },
}

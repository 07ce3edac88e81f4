//! 服务端推送事件
//!
//! 协调器对外广播的全部事件类型，`type` 字段携带 kebab-case
//! 事件名，与客户端协议保持一致。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use domain::{ChatId, Message, MessageId, Reaction, UserId, UserSummary};

/// 在线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// 服务端推送事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// 连接建立后回传的在线好友列表
    OnlineFriends { friends: Vec<UserId> },
    /// 连接建立后回传的未读计数快照（发送者 -> 数量）
    UnreadCounts { counts: HashMap<UserId, u64> },
    /// 好友上下线通知
    #[serde(rename_all = "camelCase")]
    FriendStatusChange {
        user_id: UserId,
        status: PresenceStatus,
    },
    /// 会话成员上下线通知（按持久化会话逐条发送）
    #[serde(rename_all = "camelCase")]
    ChatMemberStatusChange {
        user_id: UserId,
        status: PresenceStatus,
        chat_id: ChatId,
    },
    /// 加入房间时回传的成员在线/离线划分
    #[serde(rename_all = "camelCase")]
    ChatMembersStatus {
        chat_id: ChatId,
        online_members: Vec<UserSummary>,
        offline_members: Vec<UserSummary>,
    },
    /// 其他订阅者加入房间
    #[serde(rename_all = "camelCase")]
    MemberJoinedChat { user_id: UserId, chat_id: ChatId },
    /// 其他订阅者离开房间
    #[serde(rename_all = "camelCase")]
    MemberLeftChat { user_id: UserId, chat_id: ChatId },
    /// 新消息投递
    ReceiveMessage { message: Message },
    /// 未读计数变化
    #[serde(rename_all = "camelCase")]
    UnreadCountUpdate { sender_id: UserId, count: u64 },
    /// 好友正在输入
    #[serde(rename_all = "camelCase")]
    UserTyping { user_id: UserId, is_typing: bool },
    /// 房间内成员正在输入
    #[serde(rename_all = "camelCase")]
    UserTypingInChat {
        user_id: UserId,
        is_typing: bool,
        chat_id: ChatId,
    },
    /// 消息已见状态更新
    #[serde(rename_all = "camelCase")]
    MessageSeenUpdate {
        message_id: MessageId,
        user_id: UserId,
    },
    /// 表情回应列表更新
    #[serde(rename_all = "camelCase")]
    ReactionUpdate {
        message_id: MessageId,
        reactions: Vec<Reaction>,
    },
    /// 消息被全局删除
    #[serde(rename_all = "camelCase")]
    MessageDeleted {
        message_id: MessageId,
        chat_id: ChatId,
        delete_type: String,
    },
    /// 连接鉴权失败
    AuthError,
    /// 消息操作失败
    MessageError { message: String },
    /// 通用错误
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn events_carry_kebab_case_wire_names() {
        let user_id = UserId::new(Uuid::new_v4());
        let event = ServerEvent::FriendStatusChange {
            user_id,
            status: PresenceStatus::Online,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "friend-status-change");
        assert_eq!(json["status"], "online");
        assert_eq!(json["userId"], user_id.to_string());
    }

    #[test]
    fn auth_error_serializes_as_bare_tag() {
        let json = serde_json::to_value(ServerEvent::AuthError).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "auth-error" }));
    }

    #[test]
    fn unread_count_update_uses_camel_case_fields() {
        let sender_id = UserId::new(Uuid::new_v4());
        let json = serde_json::to_value(ServerEvent::UnreadCountUpdate {
            sender_id,
            count: 0,
        })
        .unwrap();
        assert_eq!(json["type"], "unread-count-update");
        assert_eq!(json["senderId"], sender_id.to_string());
        assert_eq!(json["count"], 0);
    }
}

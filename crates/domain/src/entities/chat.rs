//! 会话实体
//!
//! 会话是持久化的成员关系：成员列表、群聊标记、群管理员。
//! 成员资格与连接状态无关，房间订阅状态由协调器单独维护。

use serde::{Deserialize, Serialize};

use crate::entities::user::UserSummary;
use crate::value_objects::{ChatId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    pub members: Vec<UserId>,
    pub is_group: bool,
    pub name: Option<String>,
    /// 仅群聊有意义，成员增删操作要求请求者等于该字段。
    pub admin: Option<UserId>,
}

impl Chat {
    pub fn direct(id: ChatId, a: UserId, b: UserId) -> Self {
        Self {
            id,
            members: vec![a, b],
            is_group: false,
            name: None,
            admin: None,
        }
    }

    pub fn group(
        id: ChatId,
        name: impl Into<String>,
        admin: UserId,
        members: Vec<UserId>,
    ) -> Self {
        Self {
            id,
            members,
            is_group: true,
            name: Some(name.into()),
            admin: Some(admin),
        }
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.members.contains(&user_id)
    }

    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admin == Some(user_id)
    }

    /// 1:1 会话中除指定用户之外的另一名成员。
    pub fn other_member(&self, user_id: UserId) -> Option<UserId> {
        if self.is_group {
            return None;
        }
        self.members.iter().copied().find(|id| *id != user_id)
    }

    /// 除指定用户之外的所有成员。
    pub fn members_excluding(&self, user_id: UserId) -> Vec<UserId> {
        self.members
            .iter()
            .copied()
            .filter(|id| *id != user_id)
            .collect()
    }
}

/// 成员列表已解析为用户摘要的会话视图。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatWithMembers {
    pub id: ChatId,
    pub is_group: bool,
    pub name: Option<String>,
    pub admin: Option<UserId>,
    pub members: Vec<UserSummary>,
}

impl ChatWithMembers {
    pub fn new(chat: Chat, members: Vec<UserSummary>) -> Self {
        Self {
            id: chat.id,
            is_group: chat.is_group,
            name: chat.name,
            admin: chat.admin,
            members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> UserId {
        UserId::new(Uuid::new_v4())
    }

    #[test]
    fn other_member_resolves_for_direct_chat() {
        let (a, b) = (user(), user());
        let chat = Chat::direct(ChatId::new(Uuid::new_v4()), a, b);
        assert_eq!(chat.other_member(a), Some(b));
        assert_eq!(chat.other_member(b), Some(a));
    }

    #[test]
    fn other_member_is_none_for_group_chat() {
        let (admin, member) = (user(), user());
        let chat = Chat::group(
            ChatId::new(Uuid::new_v4()),
            "team",
            admin,
            vec![admin, member],
        );
        assert_eq!(chat.other_member(admin), None);
        assert!(chat.is_admin(admin));
        assert!(!chat.is_admin(member));
    }
}

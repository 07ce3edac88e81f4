//! 消息实体
//!
//! 创建字段一经持久化不可变；生命周期字段（已读集合、已见集合、
//! 表情回应、删除标记）通过实体方法演进。全局删除后消息成为
//! 墓碑：正文与媒体字段被清空，对所有成员呈现为"已删除"。

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};
use crate::value_objects::{ChatId, MessageId, Timestamp, UserId};

/// 单个用户对消息的表情回应，每名用户至多一条。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub user: UserId,
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub text: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    /// 外部媒体存储的资源引用，全局删除时尽力释放。
    pub public_id: Option<String>,
    pub read_by: HashSet<UserId>,
    pub seen_by: HashSet<UserId>,
    pub reactions: Vec<Reaction>,
    pub deleted_for: HashSet<UserId>,
    pub is_deleted_globally: bool,
    pub created_at: Timestamp,
}

/// 消息创建载荷。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub chat_id: ChatId,
    pub sender_id: UserId,
    pub text: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub public_id: Option<String>,
}

impl NewMessage {
    /// 校验载荷：正文（去除首尾空白后）与媒体引用至少有其一。
    pub fn validate(&self) -> DomainResult<()> {
        let has_text = self
            .text
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        if !has_text && self.media_url.is_none() {
            return Err(DomainError::validation(
                "message",
                "text or media reference required",
            ));
        }
        Ok(())
    }
}

impl Message {
    /// 从已校验的创建载荷生成消息实体。
    pub fn create(payload: NewMessage) -> DomainResult<Self> {
        payload.validate()?;
        Ok(Self {
            id: MessageId::new(Uuid::new_v4()),
            chat_id: payload.chat_id,
            sender_id: payload.sender_id,
            text: payload.text.map(|t| t.trim().to_owned()).filter(|t| !t.is_empty()),
            media_url: payload.media_url,
            media_type: payload.media_type,
            public_id: payload.public_id,
            read_by: HashSet::new(),
            seen_by: HashSet::new(),
            reactions: Vec::new(),
            deleted_for: HashSet::new(),
            is_deleted_globally: false,
            created_at: Utc::now(),
        })
    }

    /// 幂等地记录用户已见该消息。返回是否发生变化。
    pub fn mark_seen(&mut self, user_id: UserId) -> bool {
        self.seen_by.insert(user_id)
    }

    /// 幂等地记录用户已读该消息。
    pub fn mark_read(&mut self, user_id: UserId) -> bool {
        self.read_by.insert(user_id)
    }

    /// 设置用户的表情回应。同一用户的新回应替换旧回应，而非追加。
    pub fn set_reaction(&mut self, user_id: UserId, emoji: impl Into<String>) {
        self.reactions.retain(|r| r.user != user_id);
        self.reactions.push(Reaction {
            user: user_id,
            emoji: emoji.into(),
        });
    }

    /// 用户本地删除。仅影响该用户自己的消息列表视图。
    pub fn delete_for(&mut self, user_id: UserId) -> bool {
        self.deleted_for.insert(user_id)
    }

    /// 全局删除：清空正文与媒体字段，保留行作为墓碑。
    pub fn tombstone(&mut self) {
        self.is_deleted_globally = true;
        self.text = None;
        self.media_url = None;
        self.media_type = None;
        self.public_id = None;
    }

    pub fn is_seen_by(&self, user_id: UserId) -> bool {
        self.seen_by.contains(&user_id)
    }

    pub fn is_read_by(&self, user_id: UserId) -> bool {
        self.read_by.contains(&user_id)
    }

    /// 消息是否出现在指定用户的列表中（墓碑仍然可见）。
    pub fn is_visible_to(&self, user_id: UserId) -> bool {
        !self.deleted_for.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(chat_id: ChatId, sender_id: UserId) -> NewMessage {
        NewMessage {
            chat_id,
            sender_id,
            text: Some("hello".to_owned()),
            media_url: None,
            media_type: None,
            public_id: None,
        }
    }

    fn ids() -> (ChatId, UserId) {
        (ChatId::new(Uuid::new_v4()), UserId::new(Uuid::new_v4()))
    }

    #[test]
    fn create_rejects_empty_payload() {
        let (chat_id, sender_id) = ids();
        let mut empty = payload(chat_id, sender_id);
        empty.text = Some("   ".to_owned());
        assert!(matches!(
            Message::create(empty),
            Err(DomainError::Validation { .. })
        ));
    }

    #[test]
    fn create_accepts_media_without_text() {
        let (chat_id, sender_id) = ids();
        let mut media_only = payload(chat_id, sender_id);
        media_only.text = None;
        media_only.media_url = Some("https://cdn.example/x.png".to_owned());
        media_only.media_type = Some("image/png".to_owned());
        assert!(Message::create(media_only).is_ok());
    }

    #[test]
    fn create_trims_text() {
        let (chat_id, sender_id) = ids();
        let mut padded = payload(chat_id, sender_id);
        padded.text = Some("  hi  ".to_owned());
        let message = Message::create(padded).unwrap();
        assert_eq!(message.text.as_deref(), Some("hi"));
    }

    #[test]
    fn reaction_replaces_previous_one_from_same_user() {
        let (chat_id, sender_id) = ids();
        let mut message = Message::create(payload(chat_id, sender_id)).unwrap();
        let reactor = UserId::new(Uuid::new_v4());

        message.set_reaction(reactor, "👍");
        message.set_reaction(reactor, "🎉");

        assert_eq!(message.reactions.len(), 1);
        assert_eq!(message.reactions[0].user, reactor);
        assert_eq!(message.reactions[0].emoji, "🎉");
    }

    #[test]
    fn mark_seen_is_idempotent() {
        let (chat_id, sender_id) = ids();
        let mut message = Message::create(payload(chat_id, sender_id)).unwrap();
        let viewer = UserId::new(Uuid::new_v4());

        assert!(message.mark_seen(viewer));
        assert!(!message.mark_seen(viewer));
        assert_eq!(message.seen_by.len(), 1);
    }

    #[test]
    fn tombstone_clears_content_fields() {
        let (chat_id, sender_id) = ids();
        let mut media = payload(chat_id, sender_id);
        media.media_url = Some("https://cdn.example/x.mp4".to_owned());
        media.media_type = Some("video/mp4".to_owned());
        media.public_id = Some("abc123".to_owned());
        let mut message = Message::create(media).unwrap();

        message.tombstone();

        assert!(message.is_deleted_globally);
        assert!(message.text.is_none());
        assert!(message.media_url.is_none());
        assert!(message.media_type.is_none());
        assert!(message.public_id.is_none());
    }
}

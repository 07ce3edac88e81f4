//! 协调器的进程内瞬时状态
//!
//! 连接注册表、好友缓存、房间订阅、输入状态、未读计数五张表。
//! 状态对象在进程启动时创建一次，显式注入各处理器，不做全局
//! 变量。所有表都只是缓存：未读计数随时可以从消息存储重建。

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use domain::{ChatId, UserId};

use crate::events::ServerEvent;

/// 单条活跃连接的句柄。
///
/// `connection_id` 用于区分同一用户先后建立的连接：被替换的旧
/// 连接断开时不得清理新连接的注册表项。
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub connection_id: Uuid,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            sender,
        }
    }

    /// 投递事件到连接。接收端已关闭时返回 false。
    pub fn send(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// 协调器瞬时状态存储
#[derive(Debug, Default)]
pub struct CoordinatorState {
    /// 用户 -> 最近一条活跃连接
    connections: RwLock<HashMap<UserId, ConnectionHandle>>,
    /// 用户 -> 连接时缓存的好友列表
    friends: RwLock<HashMap<UserId, Vec<UserId>>>,
    /// 会话 -> 当前订阅该房间的用户集合
    rooms: RwLock<HashMap<ChatId, HashSet<UserId>>>,
    /// 用户 -> 正在向其输入的对端集合
    typing: RwLock<HashMap<UserId, HashSet<UserId>>>,
    /// 用户 -> (发送者 -> 未读数) 缓存
    unread: RwLock<HashMap<UserId, HashMap<UserId, u64>>>,
}

impl CoordinatorState {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- 连接注册表 ----

    pub async fn register_connection(&self, user_id: UserId, handle: ConnectionHandle) {
        self.connections.write().await.insert(user_id, handle);
    }

    /// 移除连接注册。仅当注册表中的连接 ID 与传入一致时生效，
    /// 返回是否确实移除（false 表示该断开来自已被替换的旧连接）。
    pub async fn remove_connection(&self, user_id: UserId, connection_id: Uuid) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get(&user_id) {
            Some(handle) if handle.connection_id == connection_id => {
                connections.remove(&user_id);
                true
            }
            _ => false,
        }
    }

    pub async fn is_online(&self, user_id: UserId) -> bool {
        self.connections.read().await.contains_key(&user_id)
    }

    /// 给定集合中当前在线的子集，保持输入顺序。
    pub async fn online_subset(&self, user_ids: &[UserId]) -> Vec<UserId> {
        let connections = self.connections.read().await;
        user_ids
            .iter()
            .copied()
            .filter(|id| connections.contains_key(id))
            .collect()
    }

    pub async fn handle_of(&self, user_id: UserId) -> Option<ConnectionHandle> {
        self.connections.read().await.get(&user_id).cloned()
    }

    // ---- 好友缓存 ----

    pub async fn set_friends(&self, user_id: UserId, friend_ids: Vec<UserId>) {
        self.friends.write().await.insert(user_id, friend_ids);
    }

    pub async fn friends_of(&self, user_id: UserId) -> Vec<UserId> {
        self.friends
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// 移除好友缓存并返回断开前的快照，供离线广播使用。
    pub async fn drop_friends(&self, user_id: UserId) -> Vec<UserId> {
        self.friends
            .write()
            .await
            .remove(&user_id)
            .unwrap_or_default()
    }

    // ---- 房间订阅 ----

    pub async fn join_room(&self, chat_id: ChatId, user_id: UserId) {
        self.rooms
            .write()
            .await
            .entry(chat_id)
            .or_default()
            .insert(user_id);
    }

    pub async fn leave_room(&self, chat_id: ChatId, user_id: UserId) {
        let mut rooms = self.rooms.write().await;
        if let Some(subscribers) = rooms.get_mut(&chat_id) {
            subscribers.remove(&user_id);
            if subscribers.is_empty() {
                rooms.remove(&chat_id);
            }
        }
    }

    /// 将用户从其订阅的所有房间移除，返回受影响的会话。
    pub async fn leave_all_rooms(&self, user_id: UserId) -> Vec<ChatId> {
        let mut rooms = self.rooms.write().await;
        let mut affected = Vec::new();
        rooms.retain(|chat_id, subscribers| {
            if subscribers.remove(&user_id) {
                affected.push(*chat_id);
            }
            !subscribers.is_empty()
        });
        affected
    }

    pub async fn room_has(&self, chat_id: ChatId, user_id: UserId) -> bool {
        self.rooms
            .read()
            .await
            .get(&chat_id)
            .map(|subscribers| subscribers.contains(&user_id))
            .unwrap_or(false)
    }

    pub async fn room_members(&self, chat_id: ChatId) -> Vec<UserId> {
        self.rooms
            .read()
            .await
            .get(&chat_id)
            .map(|subscribers| subscribers.iter().copied().collect())
            .unwrap_or_default()
    }

    // ---- 输入状态 ----

    pub async fn set_typing_to(&self, user_id: UserId, recipient_id: UserId, is_typing: bool) {
        let mut typing = self.typing.write().await;
        if is_typing {
            typing.entry(user_id).or_default().insert(recipient_id);
        } else if let Some(recipients) = typing.get_mut(&user_id) {
            recipients.remove(&recipient_id);
            if recipients.is_empty() {
                typing.remove(&user_id);
            }
        }
    }

    /// 取出并清空用户的输入状态集合，断开时用于补发停止信号。
    pub async fn take_typing(&self, user_id: UserId) -> Vec<UserId> {
        self.typing
            .write()
            .await
            .remove(&user_id)
            .map(|recipients| recipients.into_iter().collect())
            .unwrap_or_default()
    }

    // ---- 未读计数缓存 ----

    pub async fn set_unread_map(&self, user_id: UserId, counts: HashMap<UserId, u64>) {
        self.unread.write().await.insert(user_id, counts);
    }

    pub async fn set_unread(&self, user_id: UserId, sender_id: UserId, count: u64) {
        self.unread
            .write()
            .await
            .entry(user_id)
            .or_default()
            .insert(sender_id, count);
    }

    pub async fn clear_unread_from(&self, user_id: UserId, sender_id: UserId) {
        if let Some(counts) = self.unread.write().await.get_mut(&user_id) {
            counts.remove(&sender_id);
        }
    }

    pub async fn drop_unread(&self, user_id: UserId) {
        self.unread.write().await.remove(&user_id);
    }

    pub async fn unread_of(&self, user_id: UserId) -> HashMap<UserId, u64> {
        self.unread
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new(Uuid::new_v4())
    }

    fn handle() -> (ConnectionHandle, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionHandle::new(tx), rx)
    }

    #[tokio::test]
    async fn stale_disconnect_does_not_evict_replacement() {
        let state = CoordinatorState::new();
        let user_id = user();
        let (old, _rx_old) = handle();
        let (new, _rx_new) = handle();
        let old_id = old.connection_id;

        state.register_connection(user_id, old).await;
        state.register_connection(user_id, new).await;

        assert!(!state.remove_connection(user_id, old_id).await);
        assert!(state.is_online(user_id).await);
    }

    #[tokio::test]
    async fn empty_rooms_are_pruned() {
        let state = CoordinatorState::new();
        let chat_id = ChatId::new(Uuid::new_v4());
        let (a, b) = (user(), user());

        state.join_room(chat_id, a).await;
        state.join_room(chat_id, b).await;
        state.leave_room(chat_id, a).await;
        assert_eq!(state.room_members(chat_id).await.len(), 1);

        let affected = state.leave_all_rooms(b).await;
        assert_eq!(affected, vec![chat_id]);
        assert!(state.room_members(chat_id).await.is_empty());
        assert!(state.rooms.read().await.is_empty());
    }

    #[tokio::test]
    async fn typing_set_clears_when_last_recipient_removed() {
        let state = CoordinatorState::new();
        let (typist, recipient) = (user(), user());

        state.set_typing_to(typist, recipient, true).await;
        state.set_typing_to(typist, recipient, false).await;
        assert!(state.take_typing(typist).await.is_empty());
    }
}

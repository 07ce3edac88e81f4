//! 上线/下线编排的集成测试。

mod support;

use application::{ApplicationError, PresenceStatus, ServerEvent};
use uuid::Uuid;

use domain::UserId;
use support::TestBed;

#[tokio::test]
async fn join_sends_online_friends_and_unread_snapshot() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    bed.befriend(alice, bob).await;

    let mut bob_client = bed.connect(bob).await;
    let mut alice_client = bed.connect(alice).await;

    let events = alice_client.drain();
    assert!(
        events.contains(&ServerEvent::OnlineFriends {
            friends: vec![bob]
        }),
        "online snapshot should list bob: {events:?}"
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, ServerEvent::UnreadCounts { counts } if counts.is_empty())));

    // 对方恰好收到一次上线通知
    let bob_events = bob_client.drain();
    let notices = bob_events
        .iter()
        .filter(|e| {
            matches!(
                e,
                ServerEvent::FriendStatusChange { user_id, status: PresenceStatus::Online }
                    if *user_id == alice
            )
        })
        .count();
    assert_eq!(notices, 1);
}

#[tokio::test]
async fn join_rejects_unknown_user_without_registering() {
    let bed = TestBed::new();
    let ghost = UserId::new(Uuid::new_v4());

    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = application::ConnectionHandle::new(tx);
    let err = bed
        .coordinator
        .join(ghost, handle)
        .await
        .expect_err("unknown user must be rejected");

    assert!(matches!(&err, ApplicationError::Domain(_) if err.is_not_found()));
    assert!(!bed.state.is_online(ghost).await);
}

#[tokio::test]
async fn disconnect_notifies_friends_exactly_once() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    bed.befriend(alice, bob).await;

    let mut bob_client = bed.connect(bob).await;
    let alice_client = bed.connect(alice).await;
    bob_client.drain();

    bed.disconnect(&alice_client).await;

    let offline_notices = bob_client
        .drain()
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                ServerEvent::FriendStatusChange { user_id, status: PresenceStatus::Offline }
                    if *user_id == alice
            )
        })
        .count();
    assert_eq!(offline_notices, 1);
    assert!(!bed.state.is_online(alice).await);
}

#[tokio::test]
async fn disconnect_notifies_chat_members_per_chat() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    let chat_id = bed.direct_chat(alice, bob).await;

    let mut bob_client = bed.connect(bob).await;
    let alice_client = bed.connect(alice).await;
    bob_client.drain();

    bed.disconnect(&alice_client).await;

    let events = bob_client.drain();
    assert!(events.contains(&ServerEvent::ChatMemberStatusChange {
        user_id: alice,
        status: PresenceStatus::Offline,
        chat_id,
    }));
}

#[tokio::test]
async fn stale_disconnect_does_not_evict_replacement_connection() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;

    let first = bed.connect(alice).await;
    let _second = bed.connect(alice).await;

    // 旧连接的迟到断开不得把新连接打下线
    bed.disconnect(&first).await;
    assert!(bed.state.is_online(alice).await);
}

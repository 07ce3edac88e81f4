//! 房间订阅与输入提示的集成测试。

mod support;

use application::ServerEvent;
use support::TestBed;

#[tokio::test]
async fn join_chat_splits_members_by_presence() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    let carol = bed.register_user("carol").await;
    let chat_id = bed.group_chat("trio", alice, vec![alice, bob, carol]).await;

    let _bob_client = bed.connect(bob).await;
    let mut alice_client = bed.connect(alice).await;
    alice_client.drain();

    bed.coordinator
        .join_chat(alice, chat_id)
        .await
        .expect("join chat");

    let events = alice_client.drain();
    let status = events
        .iter()
        .find_map(|e| match e {
            ServerEvent::ChatMembersStatus {
                online_members,
                offline_members,
                ..
            } => Some((online_members, offline_members)),
            _ => None,
        })
        .expect("caller should receive the membership split");
    assert_eq!(status.0.iter().map(|m| m.id).collect::<Vec<_>>(), vec![bob]);
    assert_eq!(
        status.1.iter().map(|m| m.id).collect::<Vec<_>>(),
        vec![carol]
    );
    assert!(bed.state.room_has(chat_id, alice).await);
}

#[tokio::test]
async fn room_join_and_leave_are_broadcast_to_other_subscribers() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    let chat_id = bed.direct_chat(alice, bob).await;

    let mut bob_client = bed.connect(bob).await;
    let _alice_client = bed.connect(alice).await;
    bed.coordinator.join_chat(bob, chat_id).await.expect("join chat");
    bob_client.drain();

    bed.coordinator.join_chat(alice, chat_id).await.expect("join chat");
    assert!(bob_client.drain().contains(&ServerEvent::MemberJoinedChat {
        user_id: alice,
        chat_id,
    }));

    bed.coordinator.leave_chat(alice, chat_id).await.expect("leave chat");
    assert!(bob_client.drain().contains(&ServerEvent::MemberLeftChat {
        user_id: alice,
        chat_id,
    }));
    assert!(!bed.state.room_has(chat_id, alice).await);
}

#[tokio::test]
async fn join_chat_is_a_noop_for_offline_user() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    let chat_id = bed.direct_chat(alice, bob).await;

    bed.coordinator
        .join_chat(alice, chat_id)
        .await
        .expect("offline join is silently ignored");
    assert!(!bed.state.room_has(chat_id, alice).await);
}

#[tokio::test]
async fn typing_signal_is_limited_to_friends() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    let carol = bed.register_user("carol").await;
    bed.befriend(alice, bob).await;

    let mut bob_client = bed.connect(bob).await;
    let mut carol_client = bed.connect(carol).await;
    let _alice_client = bed.connect(alice).await;
    bob_client.drain();

    bed.coordinator
        .set_typing(alice, bob, true)
        .await
        .expect("typing to a friend");
    bed.coordinator
        .set_typing(alice, carol, true)
        .await
        .expect("typing to a stranger is a no-op");

    assert!(bob_client.drain().contains(&ServerEvent::UserTyping {
        user_id: alice,
        is_typing: true,
    }));
    assert!(carol_client.drain().is_empty());
}

#[tokio::test]
async fn typing_in_chat_skips_the_sender() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    let chat_id = bed.direct_chat(alice, bob).await;

    let mut bob_client = bed.connect(bob).await;
    let mut alice_client = bed.connect(alice).await;
    bed.coordinator.join_chat(alice, chat_id).await.expect("join chat");
    bed.coordinator.join_chat(bob, chat_id).await.expect("join chat");
    alice_client.drain();
    bob_client.drain();

    bed.coordinator
        .set_typing_in_chat(alice, chat_id, true)
        .await
        .expect("typing in chat");

    assert!(bob_client.drain().contains(&ServerEvent::UserTypingInChat {
        user_id: alice,
        is_typing: true,
        chat_id,
    }));
    assert!(alice_client.drain().is_empty());
}

#[tokio::test]
async fn disconnect_prunes_rooms_and_stops_typing() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    bed.befriend(alice, bob).await;
    let chat_id = bed.direct_chat(alice, bob).await;

    let mut bob_client = bed.connect(bob).await;
    let alice_client = bed.connect(alice).await;
    bed.coordinator.join_chat(alice, chat_id).await.expect("join chat");
    bed.coordinator
        .set_typing(alice, bob, true)
        .await
        .expect("typing to a friend");
    bob_client.drain();

    bed.disconnect(&alice_client).await;

    // 断连后输入提示收到显式停止信号，房间订阅被清理
    assert!(bob_client.drain().contains(&ServerEvent::UserTyping {
        user_id: alice,
        is_typing: false,
    }));
    assert!(!bed.state.room_has(chat_id, alice).await);
}

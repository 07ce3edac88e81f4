//! 会话创建的集成测试：1:1 查找或创建、群聊校验与管理员指派。

mod support;

use application::ApplicationError;
use domain::DomainError;
use support::TestBed;

#[tokio::test]
async fn direct_chat_is_created_once_and_then_reused() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;

    let (first, created) = bed
        .coordinator
        .create_direct_chat(alice, bob)
        .await
        .expect("first creation");
    assert!(created);
    assert!(!first.is_group);

    // 无论哪一方再次发起，都复用同一个会话文档。
    let (second, created) = bed
        .coordinator
        .create_direct_chat(bob, alice)
        .await
        .expect("second lookup");
    assert!(!created);
    assert_eq!(second.id, first.id);
}

#[tokio::test]
async fn direct_chat_with_self_is_rejected() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;

    let err = bed
        .coordinator
        .create_direct_chat(alice, alice)
        .await
        .expect_err("self chat must fail");
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Validation { .. })
    ));
}

#[tokio::test]
async fn group_chat_assigns_creator_as_admin_and_member() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    let dave = bed.register_user("dave").await;

    let roster = bed
        .coordinator
        .create_group_chat(alice, "team", vec![bob, dave])
        .await
        .expect("group creation");

    assert!(roster.is_group);
    assert_eq!(roster.name.as_deref(), Some("team"));
    assert_eq!(roster.admin, Some(alice));
    let member_ids: Vec<_> = roster.members.iter().map(|m| m.id).collect();
    assert!(member_ids.contains(&alice));
    assert!(member_ids.contains(&bob));
    assert!(member_ids.contains(&dave));
}

#[tokio::test]
async fn group_chat_requires_name_and_two_other_members() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    let dave = bed.register_user("dave").await;

    let err = bed
        .coordinator
        .create_group_chat(alice, "  ", vec![bob, dave])
        .await
        .expect_err("blank name must fail");
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Validation { .. })
    ));

    let err = bed
        .coordinator
        .create_group_chat(alice, "team", vec![bob])
        .await
        .expect_err("one other member is not enough");
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Validation { .. })
    ));

    // 把发起者自己塞进成员列表不能凑数。
    let err = bed
        .coordinator
        .create_group_chat(alice, "team", vec![alice, bob])
        .await
        .expect_err("creator does not count towards the minimum");
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Validation { .. })
    ));
}

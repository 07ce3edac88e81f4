//! 群成员管理的集成测试：仅管理员可增删成员。

mod support;

use application::ApplicationError;
use domain::DomainError;
use support::TestBed;

#[tokio::test]
async fn admin_adds_member_and_gets_resolved_roster() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    let dave = bed.register_user("dave").await;
    let chat_id = bed.group_chat("team", alice, vec![alice, bob]).await;

    let roster = bed
        .coordinator
        .add_member(alice, chat_id, dave)
        .await
        .expect("admin add");

    assert!(roster.members.iter().any(|m| m.id == dave));
    assert_eq!(roster.admin, Some(alice));
}

#[tokio::test]
async fn non_admin_cannot_manage_members() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    let dave = bed.register_user("dave").await;
    let chat_id = bed.group_chat("team", alice, vec![alice, bob]).await;

    let err = bed
        .coordinator
        .add_member(bob, chat_id, dave)
        .await
        .expect_err("non-admin add must fail");
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Forbidden { .. })
    ));

    let err = bed
        .coordinator
        .remove_member(bob, chat_id, alice)
        .await
        .expect_err("non-admin remove must fail");
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn adding_an_existing_member_is_a_conflict() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    let chat_id = bed.group_chat("team", alice, vec![alice, bob]).await;

    let err = bed
        .coordinator
        .add_member(alice, chat_id, bob)
        .await
        .expect_err("duplicate add must fail");
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Conflict { .. })
    ));
}

#[tokio::test]
async fn removing_a_non_member_is_idempotent() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    let dave = bed.register_user("dave").await;
    let chat_id = bed.group_chat("team", alice, vec![alice, bob]).await;

    let roster = bed
        .coordinator
        .remove_member(alice, chat_id, dave)
        .await
        .expect("removing an outsider succeeds without effect");
    assert_eq!(
        roster.members.iter().map(|m| m.id).collect::<Vec<_>>(),
        vec![alice, bob]
    );
}

#[tokio::test]
async fn direct_chats_reject_membership_management() {
    let bed = TestBed::new();
    let alice = bed.register_user("alice").await;
    let bob = bed.register_user("bob").await;
    let dave = bed.register_user("dave").await;
    let chat_id = bed.direct_chat(alice, bob).await;

    let err = bed
        .coordinator
        .add_member(alice, chat_id, dave)
        .await
        .expect_err("1:1 chats have no managed membership");
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::NotFound { .. })
    ));
}

use async_trait::async_trait;

use crate::entities::user::UserSummary;
use crate::errors::DomainResult;
use crate::value_objects::UserId;

/// 用户目录：解析用户的好友列表与展示摘要。
///
/// 账号的创建与认证由外部协作方负责，协调器只做只读查询。
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// 解析用户的好友 ID 列表。用户不存在时返回 `NotFound`。
    async fn friend_ids(&self, user_id: UserId) -> DomainResult<Vec<UserId>>;

    /// 批量解析展示安全的用户摘要，未知 ID 被跳过。
    async fn summaries(&self, user_ids: &[UserId]) -> DomainResult<Vec<UserSummary>>;
}

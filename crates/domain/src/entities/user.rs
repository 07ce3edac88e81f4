use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// 对外展示安全的用户摘要，不包含任何凭据字段。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl UserSummary {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar_url: None,
        }
    }
}

//! 应用层错误定义

use domain::DomainError;
use thiserror::Error;

use crate::router::BroadcastError;

/// 应用层错误类型
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 领域层错误
    #[error("领域错误: {0}")]
    Domain(#[from] DomainError),

    /// 事件广播错误
    #[error("广播错误: {0}")]
    Broadcast(#[from] BroadcastError),

    /// 基础设施层错误
    #[error("基础设施错误: {0}")]
    Infrastructure(String),
}

impl ApplicationError {
    pub fn infrastructure(message: impl Into<String>) -> Self {
        Self::Infrastructure(message.into())
    }

    /// 错误是否由于引用的用户无法解析（连接鉴权失败信号）。
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Domain(DomainError::NotFound { .. }))
    }
}

/// 应用层结果类型
pub type ApplicationResult<T> = Result<T, ApplicationError>;

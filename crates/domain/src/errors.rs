//! 领域模型错误定义
//!
//! 按照错误分类建模：载荷校验、权限、资源不存在、冲突、
//! 业务规则违反、以及持久化存储的瞬时故障。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 载荷校验错误
    #[error("验证失败: {field}: {message}")]
    Validation { field: String, message: String },

    /// 权限错误
    #[error("权限不足: {action}")]
    Forbidden { action: String },

    /// 资源不存在错误
    #[error("资源不存在: {resource_type} {resource_id}")]
    NotFound {
        resource_type: String,
        resource_id: String,
    },

    /// 资源冲突错误
    #[error("资源冲突: {message}")]
    Conflict { message: String },

    /// 业务规则违反错误
    #[error("业务规则违反: {rule}")]
    PolicyViolation { rule: String },

    /// 持久化存储瞬时故障
    #[error("存储错误: {message}")]
    Storage { message: String },
}

impl DomainError {
    /// 创建载荷校验错误
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 创建权限错误
    pub fn forbidden(action: impl Into<String>) -> Self {
        Self::Forbidden {
            action: action.into(),
        }
    }

    /// 创建资源不存在错误
    pub fn not_found(resource_type: impl Into<String>, resource_id: impl ToString) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            resource_id: resource_id.to_string(),
        }
    }

    /// 创建资源冲突错误
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// 创建业务规则违反错误
    pub fn policy_violation(rule: impl Into<String>) -> Self {
        Self::PolicyViolation { rule: rule.into() }
    }

    /// 创建存储错误
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

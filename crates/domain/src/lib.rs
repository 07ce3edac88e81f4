//! 聊天系统核心领域模型
//!
//! 包含用户摘要、会话、消息等核心实体，以及协调器所依赖的
//! 持久化存储接口（用户目录、会话存储、消息存储）。

pub mod entities;
pub mod errors;
pub mod stores;
pub mod value_objects;

// 重新导出常用类型
pub use entities::*;
pub use errors::*;
pub use stores::*;
pub use value_objects::*;

//! 在线状态与消息协调器。
//!
//! 这里实现事件驱动的核心子系统：连接注册表、房间订阅跟踪、
//! 好友关系缓存、输入状态跟踪、未读计数缓存，以及消息生命周期
//! 管理。对外部适配器（事件路由、媒体存储）只依赖抽象接口。

pub mod chats;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod media;
pub mod memory;
pub mod messages;
pub mod presence;
pub mod rooms;
pub mod router;
pub mod state;
pub mod typing;
pub mod unread;

pub use coordinator::{Coordinator, CoordinatorDependencies};
pub use error::{ApplicationError, ApplicationResult};
pub use events::{PresenceStatus, ServerEvent};
pub use media::{resource_kind, MediaError, MediaStorage, NoopMediaStorage};
pub use messages::{DeleteMode, SendMessage};
pub use router::{BroadcastError, EventRouter, LocalEventRouter};
pub use state::{ConnectionHandle, CoordinatorState};

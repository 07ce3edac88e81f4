//! Redis Pub/Sub 事件扇出
//!
//! 多实例部署时把按用户/按房间的事件投递发布到共享频道，
//! 各实例的订阅任务收到信封后交给本地路由补投，发起实例
//! 通过信封里的 origin 标识跳过自己已经投递过的事件。

mod router;
mod subscriber;

pub use router::{EventEnvelope, EventScope, RedisEventRouter, RedisRouterError};
pub use subscriber::run_subscriber;

//! Web API 层。
//!
//! 提供 Axum 路由，将 WebSocket 会话与 REST 请求委托给应用层协调器。

mod error;
mod events;
mod routes;
mod state;
mod websocket;

pub use error::ApiError;
pub use events::ClientEvent;
pub use routes::router;
pub use state::AppState;

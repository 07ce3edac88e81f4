pub mod chat;
pub mod message;
pub mod user;

pub use chat::{Chat, ChatWithMembers};
pub use message::{Message, NewMessage, Reaction};
pub use user::UserSummary;

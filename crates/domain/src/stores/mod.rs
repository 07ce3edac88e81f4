//! 协调器消费的持久化存储接口

pub mod chat_store;
pub mod message_store;
pub mod user_directory;

pub use chat_store::ChatStore;
pub use message_store::MessageStore;
pub use user_directory::UserDirectory;

//! 数据模型

mod api;
mod chat_history;
mod system_prompt;
mod user_file;

pub use api::*;
pub use chat_history::{
    Conversation, ConversationWithMessages, Message, MessageRole, STATUS_ACTIVE,
};
pub use system_prompt::SystemPrompt;
pub use user_file::{NewUserFile, UserFile, DEFAULT_USER_ID};

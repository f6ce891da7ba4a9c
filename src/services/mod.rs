//! 服务层模块

mod ai_service;
mod chat_history_service;
mod file_service;
mod prompt_service;

pub use ai_service::{format_messages, AiService, DEFAULT_SYSTEM_PROMPT};
pub use chat_history_service::{ChatHistoryService, DEFAULT_CONVERSATION_NAME};
pub use file_service::{
    detected_mime_type, is_audio_mime, is_image_mime, FileManagerService, FileStorage, Upload,
};
pub use prompt_service::PromptService;

#[cfg(test)]
pub(crate) use ai_service::tests::FakeProvider;

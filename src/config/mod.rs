//! 配置模块

mod ai_settings;
mod app_config;

pub use ai_settings::{AiSettings, AiSettingsUpdate};
pub use app_config::{AppConfig, DEFAULT_MAX_UPLOAD_SIZE};

//! LLM 类型定义

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;

/// 聊天消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// 角色：system, user, assistant
    pub role: String,
    /// 消息内容
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// 流式响应块
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatChunk {
    /// 文本内容
    pub content: Option<String>,
    /// 完成原因
    pub finish_reason: Option<String>,
}

/// 流式响应
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatChunk, LlmError>> + Send>>;

/// 聊天选项
#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// 模型名称
    pub model: String,
    /// 温度参数
    pub temperature: Option<f64>,
    /// 最大 token 数
    pub max_tokens: Option<u32>,
}

/// 图片尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1024x1024")]
    Small,
    #[serde(rename = "1792x1024")]
    Medium,
    #[serde(rename = "1024x1792")]
    Large,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Small => "1024x1024",
            ImageSize::Medium => "1792x1024",
            ImageSize::Large => "1024x1792",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 生成的图片
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "revised_prompt")]
    pub revised_prompt: Option<String>,
}

/// 待识别的图片
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// MIME 类型，如 image/png
    pub mime_type: String,
    /// 原始字节
    pub bytes: Vec<u8>,
}

/// 待转写的音频
#[derive(Debug, Clone)]
pub struct AudioInput {
    /// 上传给提供方时使用的文件名（提供方依赖扩展名判断格式）
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// LLM 错误类型
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP 请求错误
    #[error("HTTP 请求失败: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API 返回错误
    #[error("API 错误 ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 流中途由上游报告的错误
    #[error("流解析错误: {0}")]
    StreamError(String),

    /// 响应格式不符合预期
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// 提供方不支持该能力
    #[error("{0}")]
    Unsupported(String),
}

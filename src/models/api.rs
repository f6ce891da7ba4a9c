//! REST API 请求/响应模型

use serde::{Deserialize, Serialize};

use crate::config::AiSettings;
use crate::llm::{GeneratedImage, ImageSize};

/// 聊天请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    #[serde(default)]
    pub stream: bool,
    /// 提供时，消息会写入该会话并携带历史
    pub conversation_id: Option<String>,
}

/// 非流式聊天响应
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// 向量请求
#[derive(Debug, Deserialize)]
pub struct EmbeddingRequest {
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
}

/// 参数更新响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdateResponse {
    pub message: String,
    pub current_settings: AiSettings,
}

/// 图片生成请求
#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub prompt: Option<String>,
    #[serde(default)]
    pub size: ImageSize,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub images: Vec<GeneratedImage>,
}

/// 图片理解请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisionRequest {
    pub file_id: Option<String>,
    pub user_prompt: Option<String>,
    pub system_prompt: Option<String>,
}

/// 语音转写请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionRequest {
    pub file_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// 系统提示词创建/更新请求
#[derive(Debug, Deserialize)]
pub struct SystemPromptRequest {
    pub name: Option<String>,
    pub content: Option<String>,
}

/// 新建会话请求
#[derive(Debug, Default, Deserialize)]
pub struct CreateConversationRequest {
    pub name: Option<String>,
}

/// 会话重命名请求
#[derive(Debug, Deserialize)]
pub struct RenameConversationRequest {
    pub name: Option<String>,
}

/// 追加消息请求
#[derive(Debug, Deserialize)]
pub struct AddMessageRequest {
    pub role: Option<String>,
    pub content: Option<String>,
}

/// 通用消息响应
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 取出非空字符串字段
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_camel_case() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"systemPrompt":"Be brief.","userPrompt":"Hi","stream":true,"conversationId":"abc"}"#,
        )
        .unwrap();
        assert_eq!(req.system_prompt.as_deref(), Some("Be brief."));
        assert_eq!(req.user_prompt.as_deref(), Some("Hi"));
        assert!(req.stream);
        assert_eq!(req.conversation_id.as_deref(), Some("abc"));
    }

    #[test]
    fn test_chat_request_defaults() {
        let req: ChatRequest = serde_json::from_str(r#"{"userPrompt":"Hi"}"#).unwrap();
        assert!(!req.stream);
        assert!(req.system_prompt.is_none());
    }

    #[test]
    fn test_image_request_default_size() {
        let req: ImageRequest = serde_json::from_str(r#"{"prompt":"a cat"}"#).unwrap();
        assert_eq!(req.size, ImageSize::Small);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("x".to_string())), Some("x".to_string()));
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }
}

//! LLM 提供方抽象
//!
//! 路由层只依赖该 trait；OpenAI 之外的提供方只需实现聊天相关方法，
//! 其余能力默认返回 [`LlmError::Unsupported`]。

use async_trait::async_trait;

use super::types::{
    AudioInput, ChatMessage, ChatOptions, ChatStream, GeneratedImage, ImageInput, ImageSize,
    LlmError,
};

#[async_trait]
pub trait AiProvider: Send + Sync {
    /// 提供方名称，用于日志
    fn name(&self) -> &'static str;

    /// 非流式聊天，返回完整回复
    async fn complete(&self, messages: Vec<ChatMessage>, options: &ChatOptions) -> Result<String, LlmError>;

    /// 流式聊天
    fn stream(&self, messages: Vec<ChatMessage>, options: &ChatOptions) -> ChatStream;

    /// 文本向量
    async fn create_embedding(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
        Err(LlmError::Unsupported("Embedding creation not implemented".to_string()))
    }

    /// 图片生成
    async fn create_image(&self, _prompt: &str, _size: ImageSize) -> Result<Vec<GeneratedImage>, LlmError> {
        Err(LlmError::Unsupported("Image generation not implemented".to_string()))
    }

    /// 语音转文字
    async fn transcribe_audio(&self, _audio: AudioInput) -> Result<String, LlmError> {
        Err(LlmError::Unsupported("Audio transcription not implemented".to_string()))
    }

    /// 图片理解
    async fn describe_image(
        &self,
        _image: ImageInput,
        _user_prompt: &str,
        _system_prompt: Option<&str>,
        _options: &ChatOptions,
    ) -> Result<String, LlmError> {
        Err(LlmError::Unsupported("Image analysis not implemented".to_string()))
    }
}

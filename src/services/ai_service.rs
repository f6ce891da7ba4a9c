//! AI 服务封装
//!
//! 持有提供方与运行时可修改的模型参数，所有 LLM 调用都经过这里。

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

use crate::config::{AiSettings, AiSettingsUpdate};
use crate::llm::{
    preview, AiProvider, AudioInput, ChatMessage, ChatOptions, ChatStream, GeneratedImage,
    ImageInput, ImageSize, LlmError,
};

/// 未指定系统提示词时使用
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// AI 服务
pub struct AiService {
    provider: Arc<dyn AiProvider>,
    settings: RwLock<AiSettings>,
}

impl AiService {
    pub fn new(provider: Arc<dyn AiProvider>, settings: AiSettings) -> Self {
        Self {
            provider,
            settings: RwLock::new(settings),
        }
    }

    /// 当前参数（克隆）
    pub fn settings(&self) -> AiSettings {
        self.settings.read().clone()
    }

    /// 调试模式下记录日志
    fn log_debug(&self, message: &str) {
        let settings = self.settings.read();
        if settings.debugging_mode {
            info!("[{}] {}", settings.model, message);
        }
    }

    pub fn set_model(&self, model: impl Into<String>) {
        let model = model.into();
        self.settings.write().model = model.clone();
        self.log_debug(&format!("Model changed to: {}", model));
    }

    pub fn set_temperature(&self, temperature: f64) -> Result<(), String> {
        validate_temperature(temperature)?;
        self.settings.write().temperature = temperature;
        self.log_debug(&format!("Temperature changed to: {}", temperature));
        Ok(())
    }

    pub fn set_max_tokens(&self, max_tokens: i64) -> Result<(), String> {
        let max_tokens = validate_max_tokens(max_tokens)?;
        self.settings.write().max_tokens = max_tokens;
        self.log_debug(&format!("MaxTokens changed to: {}", max_tokens));
        Ok(())
    }

    pub fn set_debugging_mode(&self, debugging_mode: bool) {
        self.settings.write().debugging_mode = debugging_mode;
        self.log_debug(&format!("DebuggingMode changed to: {}", debugging_mode));
    }

    /// 应用部分更新
    ///
    /// 先整体校验，任一字段不合法时不修改任何参数。
    pub fn apply(&self, update: AiSettingsUpdate) -> Result<AiSettings, String> {
        if let Some(temperature) = update.temperature {
            validate_temperature(temperature)?;
        }
        if let Some(max_tokens) = update.max_tokens {
            validate_max_tokens(max_tokens)?;
        }

        if let Some(model) = update.model {
            self.set_model(model);
        }
        if let Some(temperature) = update.temperature {
            self.set_temperature(temperature)?;
        }
        if let Some(max_tokens) = update.max_tokens {
            self.set_max_tokens(max_tokens)?;
        }
        if let Some(debugging_mode) = update.debugging_mode {
            self.set_debugging_mode(debugging_mode);
        }

        Ok(self.settings())
    }

    fn chat_options(&self) -> ChatOptions {
        let settings = self.settings.read();
        ChatOptions {
            model: settings.model.clone(),
            temperature: Some(settings.temperature),
            max_tokens: Some(settings.max_tokens),
        }
    }

    /// 非流式聊天
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, LlmError> {
        let options = self.chat_options();
        info!(
            "LLM request: provider={}, model={}, messages={}",
            self.provider.name(),
            options.model,
            messages.len()
        );

        match self.provider.complete(messages, &options).await {
            Ok(reply) => {
                self.log_debug(&format!("Completion: {}", preview(&reply, 200)));
                Ok(reply)
            }
            Err(e) => {
                self.log_debug(&format!("Error in OpenAI completion: {}", e));
                Err(e)
            }
        }
    }

    /// 流式聊天
    pub fn stream(&self, messages: Vec<ChatMessage>) -> ChatStream {
        let options = self.chat_options();
        info!(
            "LLM stream request: provider={}, model={}, messages={}",
            self.provider.name(),
            options.model,
            messages.len()
        );
        self.provider.stream(messages, &options)
    }

    pub async fn create_embedding(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.log_debug(&format!("Creating embedding for {} chars", text.chars().count()));
        self.provider.create_embedding(text).await
    }

    pub async fn create_image(&self, prompt: &str, size: ImageSize) -> Result<Vec<GeneratedImage>, LlmError> {
        self.log_debug(&format!("Generating image: size={}", size));
        self.provider.create_image(prompt, size).await
    }

    pub async fn transcribe_audio(&self, audio: AudioInput) -> Result<String, LlmError> {
        self.log_debug(&format!("Transcribing audio: {}", audio.file_name));
        self.provider.transcribe_audio(audio).await
    }

    pub async fn describe_image(
        &self,
        image: ImageInput,
        user_prompt: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, LlmError> {
        let options = self.chat_options();
        self.log_debug(&format!(
            "Processing image: mime={}, bytes={}",
            image.mime_type,
            image.bytes.len()
        ));
        self.provider
            .describe_image(image, user_prompt, system_prompt, &options)
            .await
    }
}

fn validate_temperature(temperature: f64) -> Result<(), String> {
    if !(0.0..=2.0).contains(&temperature) {
        return Err("Temperature must be between 0 and 2".to_string());
    }
    Ok(())
}

fn validate_max_tokens(max_tokens: i64) -> Result<u32, String> {
    if max_tokens < 1 {
        return Err("MaxTokens must be greater than 0".to_string());
    }
    u32::try_from(max_tokens).map_err(|_| format!("MaxTokens is too large: {}", max_tokens))
}

/// 构建发送给模型的消息：系统提示词、历史消息、本次用户输入
pub fn format_messages(system_prompt: &str, history: &[ChatMessage], user_prompt: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(user_prompt));
    messages
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::TryStreamExt;
    use parking_lot::Mutex;

    use crate::llm::ChatChunk;

    /// 记录请求并返回固定内容的提供方
    #[derive(Default)]
    pub(crate) struct FakeProvider {
        pub requests: Mutex<Vec<(Vec<ChatMessage>, ChatOptions)>>,
        pub fail_stream_after: Option<usize>,
    }

    impl FakeProvider {
        pub(crate) fn reply_for(messages: &[ChatMessage]) -> String {
            let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
            format!("echo: {}", last)
        }
    }

    #[async_trait]
    impl AiProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn complete(&self, messages: Vec<ChatMessage>, options: &ChatOptions) -> Result<String, LlmError> {
            let reply = Self::reply_for(&messages);
            self.requests.lock().push((messages, options.clone()));
            Ok(reply)
        }

        fn stream(&self, messages: Vec<ChatMessage>, options: &ChatOptions) -> ChatStream {
            let reply = Self::reply_for(&messages);
            self.requests.lock().push((messages, options.clone()));

            let mut items: Vec<Result<ChatChunk, LlmError>> = reply
                .split_inclusive(' ')
                .map(|word| {
                    Ok(ChatChunk {
                        content: Some(word.to_string()),
                        finish_reason: None,
                    })
                })
                .collect();
            items.insert(
                0,
                Ok(ChatChunk {
                    content: Some(String::new()),
                    finish_reason: None,
                }),
            );
            if let Some(n) = self.fail_stream_after {
                items.truncate(n);
                items.push(Err(LlmError::StreamError("connection reset".to_string())));
            } else {
                items.push(Ok(ChatChunk {
                    content: None,
                    finish_reason: Some("stop".to_string()),
                }));
            }
            Box::pin(futures::stream::iter(items))
        }

        async fn create_embedding(&self, text: &str) -> Result<Vec<f32>, LlmError> {
            Ok(vec![text.len() as f32, 0.5])
        }
    }

    fn service() -> (Arc<FakeProvider>, AiService) {
        let provider = Arc::new(FakeProvider::default());
        let service = AiService::new(provider.clone(), AiSettings::default());
        (provider, service)
    }

    #[test]
    fn test_format_messages_order() {
        let history = vec![ChatMessage::user("first"), ChatMessage::assistant("reply")];
        let messages = format_messages("Be brief.", &history, "second");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], ChatMessage::system("Be brief."));
        assert_eq!(messages[1], ChatMessage::user("first"));
        assert_eq!(messages[3], ChatMessage::user("second"));
    }

    #[test]
    fn test_temperature_validation() {
        let (_, service) = service();
        assert!(service.set_temperature(2.0).is_ok());
        assert_eq!(
            service.set_temperature(2.5).unwrap_err(),
            "Temperature must be between 0 and 2"
        );
        assert!(service.set_temperature(-0.1).is_err());
        assert!((service.settings().temperature - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_max_tokens_validation() {
        let (_, service) = service();
        assert_eq!(
            service.set_max_tokens(0).unwrap_err(),
            "MaxTokens must be greater than 0"
        );
        service.set_max_tokens(1).unwrap();
        assert_eq!(service.settings().max_tokens, 1);
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let (_, service) = service();
        let update = AiSettingsUpdate {
            model: Some("gpt-4o-mini".to_string()),
            temperature: Some(5.0),
            ..Default::default()
        };
        assert!(service.apply(update).is_err());
        assert_eq!(service.settings(), AiSettings::default());

        let update = AiSettingsUpdate {
            model: Some("gpt-4o-mini".to_string()),
            max_tokens: Some(512),
            debugging_mode: Some(true),
            ..Default::default()
        };
        let settings = service.apply(update).unwrap();
        assert_eq!(settings.model, "gpt-4o-mini");
        assert_eq!(settings.max_tokens, 512);
        assert!(settings.debugging_mode);
    }

    #[tokio::test]
    async fn test_complete_uses_current_settings() {
        let (provider, service) = service();
        service.set_model("gpt-4o-mini");

        let reply = service
            .complete(format_messages(DEFAULT_SYSTEM_PROMPT, &[], "Hi"))
            .await
            .unwrap();
        assert_eq!(reply, "echo: Hi");

        let requests = provider.requests.lock();
        assert_eq!(requests[0].1.model, "gpt-4o-mini");
        assert_eq!(requests[0].1.max_tokens, Some(2000));
    }

    #[tokio::test]
    async fn test_stream_passes_through() {
        let (_, service) = service();
        let chunks: Vec<ChatChunk> = service
            .stream(vec![ChatMessage::user("a b")])
            .try_collect()
            .await
            .unwrap();
        let text: String = chunks.iter().filter_map(|c| c.content.clone()).collect();
        assert_eq!(text, "echo: a b");
    }

    #[tokio::test]
    async fn test_unsupported_capability() {
        let (_, service) = service();
        let result = service.create_image("a cat", ImageSize::Small).await;
        assert!(matches!(result, Err(LlmError::Unsupported(_))));
    }
}

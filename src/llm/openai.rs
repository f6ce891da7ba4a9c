//! OpenAI API 实现
//!
//! Chat Completions（流式与非流式）、Embeddings、Images、Audio 转写。

use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error};

use super::format::{build_openai_endpoint, image_data_url, preview};
use super::provider::AiProvider;
use super::types::{
    AudioInput, ChatChunk, ChatMessage, ChatOptions, ChatStream, GeneratedImage, ImageInput,
    ImageSize, LlmError,
};

const EMBEDDING_MODEL: &str = "text-embedding-3-large";
const IMAGE_MODEL: &str = "dall-e-3";
const TRANSCRIPTION_MODEL: &str = "whisper-1";

/// 非流式请求的整体超时；流式请求只受连接超时约束
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Chat Completions 请求载荷
#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// 非流式响应
#[derive(Deserialize, Debug)]
struct ChatCompletion {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize, Debug)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize, Debug)]
struct CompletionMessage {
    content: Option<String>,
}

/// SSE 响应块
#[derive(Deserialize, Debug)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize, Debug)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct StreamDelta {
    content: Option<String>,
}

/// 流中途下发的错误帧：`{"error": {"message": ...}}`
#[derive(Deserialize, Debug)]
struct StreamErrorFrame {
    error: StreamErrorDetail,
}

#[derive(Deserialize, Debug)]
struct StreamErrorDetail {
    message: String,
}

#[derive(Deserialize, Debug)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize, Debug)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize, Debug)]
struct ImagesResponse {
    data: Vec<GeneratedImage>,
}

#[derive(Deserialize, Debug)]
struct TranscriptionResponse {
    text: String,
}

/// SSE 帧中的 data 负载
#[derive(Debug, PartialEq)]
pub(crate) enum SseData {
    Payload(String),
    Done,
}

/// SSE 行缓冲
///
/// 按字节缓冲直到遇到换行，避免多字节字符被网络分包截断。
#[derive(Default)]
pub(crate) struct SseBuffer {
    buffer: Vec<u8>,
}

impl SseBuffer {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<SseData> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim();

            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim_start();
                if data == "[DONE]" {
                    events.push(SseData::Done);
                } else if !data.is_empty() {
                    events.push(SseData::Payload(data.to_string()));
                }
            }
        }
        events
    }
}

/// 解析单个 SSE 负载；无法解析或没有 choice 时返回 None
pub(crate) fn parse_stream_chunk(data: &str) -> Option<ChatChunk> {
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => chunk.choices.into_iter().next().map(|choice| ChatChunk {
            content: choice.delta.content,
            finish_reason: choice.finish_reason,
        }),
        Err(e) => {
            debug!("Failed to parse OpenAI response: {}, data: {}", e, preview(data, 200));
            None
        }
    }
}

/// 识别错误帧，返回其中的错误信息
pub(crate) fn parse_stream_error(data: &str) -> Option<String> {
    serde_json::from_str::<StreamErrorFrame>(data)
        .ok()
        .map(|frame| frame.error.message)
}

/// 非 2xx 响应转换为 ApiError
async fn ensure_success(response: Response) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let status_code = status.as_u16();
    let error_text = response.text().await.unwrap_or_default();
    error!("OpenAI API error: status={}, body={}", status_code, preview(&error_text, 500));
    Err(LlmError::ApiError {
        status: status_code,
        message: error_text,
    })
}

/// 发送流式请求并逐块解析 SSE 响应
fn stream_completion(
    request: RequestBuilder,
    messages: Vec<ChatMessage>,
    options: ChatOptions,
) -> impl Stream<Item = Result<ChatChunk, LlmError>> + Send {
    try_stream! {
        let payload = ChatCompletionRequest {
            model: &options.model,
            messages,
            stream: true,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = request.json(&payload).send().await?;
        let response = ensure_success(response).await?;

        let mut sse = SseBuffer::default();
        let mut body = response.bytes_stream();

        while let Some(bytes) = body.next().await {
            let bytes = bytes?;
            for event in sse.push(&bytes) {
                match event {
                    SseData::Done => return,
                    SseData::Payload(data) => {
                        if let Some(message) = parse_stream_error(&data) {
                            Err::<(), _>(LlmError::StreamError(message))?;
                        }
                        if let Some(chunk) = parse_stream_chunk(&data) {
                            yield chunk;
                        }
                    }
                }
            }
        }
    }
}

/// OpenAI 提供方
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    request_timeout: Duration,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LlmError::ConfigError("API Key is required".to_string()));
        }

        // 构建 HTTP 客户端
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(5)
            .build()
            .map_err(LlmError::HttpError)?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into(),
            request_timeout: REQUEST_TIMEOUT,
        })
    }

    #[cfg(test)]
    fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// 不设整体超时的请求，流式响应可以持续任意时长
    fn request(&self, resource: &str) -> RequestBuilder {
        let endpoint = build_openai_endpoint(&self.base_url, resource);
        debug!("OpenAI API request: endpoint={}", endpoint);
        self.client.post(endpoint).bearer_auth(&self.api_key)
    }

    fn post(&self, resource: &str) -> RequestBuilder {
        self.request(resource).timeout(self.request_timeout)
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, messages: Vec<ChatMessage>, options: &ChatOptions) -> Result<String, LlmError> {
        let payload = ChatCompletionRequest {
            model: &options.model,
            messages,
            stream: false,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self.post("chat/completions").json(&payload).send().await?;
        let completion: ChatCompletion = ensure_success(response).await?.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| LlmError::UnexpectedResponse("completion has no message content".to_string()))
    }

    fn stream(&self, messages: Vec<ChatMessage>, options: &ChatOptions) -> ChatStream {
        let request = self.request("chat/completions");
        Box::pin(stream_completion(request, messages, options.clone()))
    }

    async fn create_embedding(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let payload = json!({ "model": EMBEDDING_MODEL, "input": text });

        let response = self.post("embeddings").json(&payload).send().await?;
        let embedding: EmbeddingResponse = ensure_success(response).await?.json().await?;

        embedding
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::UnexpectedResponse("embedding response has no data".to_string()))
    }

    async fn create_image(&self, prompt: &str, size: ImageSize) -> Result<Vec<GeneratedImage>, LlmError> {
        let payload = json!({
            "model": IMAGE_MODEL,
            "prompt": prompt,
            "size": size.as_str(),
        });

        let response = self.post("images/generations").json(&payload).send().await?;
        let images: ImagesResponse = ensure_success(response).await?.json().await?;
        Ok(images.data)
    }

    async fn transcribe_audio(&self, audio: AudioInput) -> Result<String, LlmError> {
        let part = Part::bytes(audio.bytes).file_name(audio.file_name);
        let form = Form::new()
            .text("model", TRANSCRIPTION_MODEL)
            .part("file", part);

        let response = self.post("audio/transcriptions").multipart(form).send().await?;
        let transcription: TranscriptionResponse = ensure_success(response).await?.json().await?;
        Ok(transcription.text)
    }

    async fn describe_image(
        &self,
        image: ImageInput,
        user_prompt: &str,
        system_prompt: Option<&str>,
        options: &ChatOptions,
    ) -> Result<String, LlmError> {
        let mut messages = Vec::new();
        if let Some(system_prompt) = system_prompt {
            messages.push(json!({ "role": "system", "content": system_prompt }));
        }
        messages.push(json!({
            "role": "user",
            "content": [
                { "type": "text", "text": user_prompt },
                {
                    "type": "image_url",
                    "image_url": { "url": image_data_url(&image.mime_type, &image.bytes) },
                },
            ],
        }));

        let payload = json!({
            "model": options.model,
            "messages": messages,
            "max_tokens": options.max_tokens,
        });

        let response = self.post("chat/completions").json(&payload).send().await?;
        let completion: ChatCompletion = ensure_success(response).await?.json().await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::UnexpectedResponse("completion has no message content".to_string()))
    }
}

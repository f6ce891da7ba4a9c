//! AI 代理端点
//!
//! 聊天（含 SSE 流式转发）、向量、图片生成、图片理解与语音转写。

use async_stream::stream;
use axum::{
    extract::State,
    http::header,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::post,
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::llm::{AudioInput, ChatStream, ImageInput};
use crate::models::{
    non_empty, ChatRequest, ChatResponse, EmbeddingRequest, EmbeddingResponse, ImageRequest,
    ImageResponse, MessageRole, TranscriptionRequest, TranscriptionResponse, VisionRequest,
};
use crate::services::{
    detected_mime_type, format_messages, is_audio_mime, is_image_mime, DEFAULT_SYSTEM_PROMPT,
};
use crate::state::AppState;

/// 内容块事件：`data: {"content": "..."}`
fn content_event(content: &str) -> Event {
    Event::default().data(json!({ "content": content }).to_string())
}

/// 错误事件：`data: {"error": "..."}`
fn error_event(message: &str) -> Event {
    Event::default().data(json!({ "error": message }).to_string())
}

/// 发送聊天消息
async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> AppResult<Response> {
    let user_prompt = non_empty(req.user_prompt)
        .ok_or_else(|| AppError::BadRequest("User prompt is required".to_string()))?;
    let system_prompt =
        non_empty(req.system_prompt).unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

    // 指定会话时携带历史并写入消息
    let conversation_id = match non_empty(req.conversation_id) {
        Some(id) => Some(state.history.require_conversation(&id).await?.id),
        None => None,
    };
    let history = match conversation_id {
        Some(id) => state.history.history(id).await?,
        None => Vec::new(),
    };
    let messages = format_messages(&system_prompt, &history, &user_prompt);

    if let Some(id) = conversation_id {
        state.history.add_message(id, MessageRole::User, &user_prompt).await?;
    }

    if req.stream {
        // 首个结果到达前不发送响应头，连接或鉴权失败仍按普通错误返回
        let mut upstream = state.ai.stream(messages);
        let first = match upstream.next().await {
            Some(Err(e)) => return Err(AppError::llm("Error processing AI request")(e)),
            first => first,
        };
        let upstream: ChatStream = Box::pin(futures::stream::iter(first).chain(upstream));

        let events = relay_stream(Arc::clone(&state), upstream, conversation_id);
        let response = ([(header::CACHE_CONTROL, "no-cache")], Sse::new(events));
        return Ok(response.into_response());
    }

    let response = state
        .ai
        .complete(messages)
        .await
        .map_err(AppError::llm("Error processing AI request"))?;

    if let Some(id) = conversation_id {
        state.history.add_message(id, MessageRole::Assistant, &response).await?;
    }

    Ok(Json(ChatResponse { response }).into_response())
}

/// 转发上游流
///
/// 每个非空内容块对应一个事件；上游中途出错时发送错误事件并结束。
/// 完整回复在流正常结束后写入会话。
fn relay_stream(
    state: Arc<AppState>,
    mut upstream: ChatStream,
    conversation_id: Option<Uuid>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream! {
        let mut reply = String::new();

        while let Some(result) = upstream.next().await {
            match result {
                Ok(chunk) => {
                    if let Some(content) = chunk.content.filter(|c| !c.is_empty()) {
                        reply.push_str(&content);
                        yield Ok::<_, Infallible>(content_event(&content));
                    }
                }
                Err(e) => {
                    error!("AI stream error: {}", e);
                    yield Ok::<_, Infallible>(error_event(&format!("Error processing AI request: {}", e)));
                    return;
                }
            }
        }

        if let Some(id) = conversation_id {
            if reply.is_empty() {
                return;
            }
            if let Err(e) = state.history.add_message(id, MessageRole::Assistant, &reply).await {
                error!("Failed to save streamed reply: conversation_id={}, error={}", id, e);
            }
        }
        info!("Chat stream completed: chars={}", reply.chars().count());
    }
}

/// 文本向量
async fn create_embedding(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EmbeddingRequest>,
) -> AppResult<Json<EmbeddingResponse>> {
    let text = non_empty(req.text)
        .ok_or_else(|| AppError::BadRequest("Text is required".to_string()))?;

    let embedding = state
        .ai
        .create_embedding(&text)
        .await
        .map_err(AppError::llm("Error creating embedding"))?;

    Ok(Json(EmbeddingResponse { embedding }))
}

/// 图片生成
async fn create_image(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImageRequest>,
) -> AppResult<Json<ImageResponse>> {
    let prompt = non_empty(req.prompt)
        .ok_or_else(|| AppError::BadRequest("Prompt is required".to_string()))?;

    let images = state
        .ai
        .create_image(&prompt, req.size)
        .await
        .map_err(AppError::llm("Error generating image"))?;

    Ok(Json(ImageResponse { images }))
}

/// 识别已上传的图片
async fn read_image(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VisionRequest>,
) -> AppResult<Json<ChatResponse>> {
    let (Some(file_id), Some(user_prompt)) = (non_empty(req.file_id), non_empty(req.user_prompt)) else {
        return Err(AppError::BadRequest(
            "File ID and user prompt are required".to_string(),
        ));
    };

    let (file, bytes) = state.files.read_file(&file_id).await?;
    let mime_type = detected_mime_type(&file);
    if !is_image_mime(mime_type) {
        return Err(AppError::BadRequest("File is not an image".to_string()));
    }

    let image = ImageInput {
        mime_type: mime_type.to_string(),
        bytes,
    };
    let system_prompt = non_empty(req.system_prompt);
    let response = state
        .ai
        .describe_image(image, &user_prompt, system_prompt.as_deref())
        .await
        .map_err(AppError::llm("Error analyzing image"))?;

    Ok(Json(ChatResponse { response }))
}

/// 转写已上传的音频
async fn audio_to_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TranscriptionRequest>,
) -> AppResult<Json<TranscriptionResponse>> {
    let file_id = non_empty(req.file_id)
        .ok_or_else(|| AppError::BadRequest("File ID is required".to_string()))?;

    let (file, bytes) = state.files.read_file(&file_id).await?;
    if !is_audio_mime(detected_mime_type(&file)) {
        return Err(AppError::BadRequest("File is not an audio file".to_string()));
    }

    let audio = AudioInput {
        file_name: file.filename,
        bytes,
    };
    let text = state
        .ai
        .transcribe_audio(audio)
        .await
        .map_err(AppError::llm("Error transcribing audio"))?;

    Ok(Json(TranscriptionResponse { text }))
}

/// 创建 AI 代理路由
pub fn chat_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ai/chat", post(send_message))
        .route("/api/ai/embedding", post(create_embedding))
        .route("/api/ai/image", post(create_image))
        .route("/api/ai/vision", post(read_image))
        .route("/api/ai/transcribe", post(audio_to_text))
}

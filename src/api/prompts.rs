//! 系统提示词端点

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{non_empty, MessageResponse, SystemPrompt, SystemPromptRequest};
use crate::state::AppState;

/// 校验名称与内容
fn name_and_content(req: SystemPromptRequest, message: &str) -> AppResult<(String, String)> {
    match (non_empty(req.name), non_empty(req.content)) {
        (Some(name), Some(content)) => Ok((name, content)),
        _ => Err(AppError::BadRequest(message.to_string())),
    }
}

async fn get_all_prompts(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<SystemPrompt>>> {
    Ok(Json(state.prompts.get_all_prompts().await?))
}

async fn create_prompt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SystemPromptRequest>,
) -> AppResult<Json<SystemPrompt>> {
    let (name, content) = name_and_content(req, "Name and content are required")?;
    Ok(Json(state.prompts.create_prompt(&name, &content).await?))
}

async fn get_prompt(
    State(state): State<Arc<AppState>>,
    Path(uuid): Path<String>,
) -> AppResult<Json<SystemPrompt>> {
    state
        .prompts
        .get_prompt(&uuid)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("System prompt not found".to_string()))
}

async fn update_prompt(
    State(state): State<Arc<AppState>>,
    Path(uuid): Path<String>,
    Json(req): Json<SystemPromptRequest>,
) -> AppResult<Json<SystemPrompt>> {
    let (name, content) = name_and_content(req, "UUID, name and content are required")?;

    state
        .prompts
        .update_prompt(&uuid, &name, &content)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("System prompt not found".to_string()))
}

async fn delete_prompt(
    State(state): State<Arc<AppState>>,
    Path(uuid): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    if !state.prompts.delete_prompt(&uuid).await? {
        return Err(AppError::NotFound("System prompt not found".to_string()));
    }
    Ok(Json(MessageResponse::new("System prompt deleted successfully")))
}

/// 创建系统提示词路由
pub fn prompts_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ai/prompts", get(get_all_prompts).post(create_prompt))
        .route("/api/ai/prompts/:uuid", get(get_prompt).put(update_prompt).delete(delete_prompt))
}

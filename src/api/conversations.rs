//! 会话历史端点

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{
    non_empty, AddMessageRequest, Conversation, ConversationWithMessages, CreateConversationRequest,
    Message, MessageResponse, MessageRole, RenameConversationRequest,
};
use crate::services::DEFAULT_CONVERSATION_NAME;
use crate::state::AppState;

async fn get_all_conversations(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Conversation>>> {
    Ok(Json(state.history.get_all_conversations().await?))
}

async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<ConversationWithMessages>> {
    Ok(Json(state.history.get_conversation_with_messages(&id).await?))
}

async fn create_conversation(
    State(state): State<Arc<AppState>>,
    req: Option<Json<CreateConversationRequest>>,
) -> AppResult<Json<Conversation>> {
    let req = req.map(|Json(req)| req).unwrap_or_default();
    let name = non_empty(req.name).unwrap_or_else(|| DEFAULT_CONVERSATION_NAME.to_string());
    Ok(Json(state.history.create_conversation(&name).await?))
}

async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    if !state.history.delete_conversation(&id).await? {
        return Err(AppError::NotFound("Conversation not found".to_string()));
    }
    Ok(Json(MessageResponse::new("Conversation deleted successfully")))
}

async fn update_conversation_name(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RenameConversationRequest>,
) -> AppResult<Json<Conversation>> {
    let name = non_empty(req.name)
        .ok_or_else(|| AppError::BadRequest("Name is required".to_string()))?;
    Ok(Json(state.history.rename_conversation(&id, &name).await?))
}

async fn add_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AddMessageRequest>,
) -> AppResult<Json<Message>> {
    let (Some(role), Some(content)) = (non_empty(req.role), non_empty(req.content)) else {
        return Err(AppError::BadRequest("Role and content are required".to_string()));
    };
    let role: MessageRole = role.parse().map_err(AppError::BadRequest)?;

    let conversation = state.history.require_conversation(&id).await?;
    Ok(Json(state.history.add_message(conversation.id, role, &content).await?))
}

/// 创建会话历史路由
pub fn conversations_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/ai/conversations",
            get(get_all_conversations).post(create_conversation),
        )
        .route(
            "/api/ai/conversations/:id",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/api/ai/conversations/:id/name", put(update_conversation_name))
        .route("/api/ai/conversations/:id/messages", post(add_message))
}

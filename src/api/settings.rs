//! 模型参数端点

use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use crate::config::{AiSettings, AiSettingsUpdate};
use crate::error::{AppError, AppResult};
use crate::models::SettingsUpdateResponse;
use crate::state::AppState;

/// 获取当前参数
async fn get_settings(State(state): State<Arc<AppState>>) -> Json<AiSettings> {
    Json(state.ai.settings())
}

/// 更新参数
async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AiSettingsUpdate>,
) -> AppResult<Json<SettingsUpdateResponse>> {
    let current_settings = state.ai.apply(req).map_err(|details| AppError::Invalid {
        message: "Error updating settings",
        details,
    })?;

    Ok(Json(SettingsUpdateResponse {
        message: "Settings updated successfully".to_string(),
        current_settings,
    }))
}

/// 创建参数路由
pub fn settings_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/ai/settings", get(get_settings).post(update_settings))
}

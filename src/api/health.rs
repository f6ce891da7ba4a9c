//! 健康检查与连通性测试端点

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// 根路径
async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "message": "API is running",
        "environment": state.config.environment,
    }))
}

/// 前端连通性测试
async fn test_connection() -> Json<Value> {
    Json(json!({
        "message": "Backend connection works"
    }))
}

/// 数据库连通性测试
async fn test_database(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let timestamp = state
        .db
        .now()
        .await
        .map_err(AppError::db("Database connection error"))?;

    Ok(Json(json!({
        "message": "Database connection works",
        "timestamp": timestamp,
    })))
}

/// 健康检查处理器
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok"
    }))
}

/// 创建健康检查路由
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/api/test", get(test_connection))
        .route("/api/test-db", get(test_database))
        .route("/api/health", get(health_check))
}

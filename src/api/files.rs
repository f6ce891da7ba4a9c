//! 文件管理端点

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{UserFile, DEFAULT_USER_ID};
use crate::services::Upload;
use crate::state::AppState;

/// multipart 读取错误；超出大小限制时返回 413
fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("File is too large".to_string())
    } else {
        AppError::BadRequest(format!("Multipart error: {}", e.body_text()))
    }
}

/// 上传单个文件（表单字段 `file`）
async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<UserFile>> {
    let mut upload: Option<Upload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("file").to_string();
        let mime_type = field.content_type().map(|c| c.to_string());
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.len() > state.config.max_upload_size {
            return Err(AppError::PayloadTooLarge("File is too large".to_string()));
        }

        upload = Some(Upload {
            original_name,
            mime_type,
            bytes: bytes.to_vec(),
        });
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    Ok(Json(state.files.save_file(upload, DEFAULT_USER_ID).await?))
}

async fn get_user_files(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<UserFile>>> {
    Ok(Json(state.files.get_user_files(DEFAULT_USER_ID).await?))
}

async fn get_file_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<UserFile>> {
    state
        .files
        .get_file_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))
}

/// multipart 边界与表头的额外空间
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// 创建文件管理路由
pub fn files_routes(max_upload_size: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/files/upload",
            post(upload_file).layer(DefaultBodyLimit::max(max_upload_size + MULTIPART_OVERHEAD)),
        )
        .route("/api/files/files", get(get_user_files))
        .route("/api/files/files/:id", get(get_file_by_id))
}

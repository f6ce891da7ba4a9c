//! 统一错误处理模块
//!
//! 定义应用级错误类型，并实现 axum 的 IntoResponse trait 以便自动转换为 HTTP 响应。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::llm::LlmError;

/// 应用错误枚举
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 上游 LLM 调用失败，`context` 作为对外的错误标题
    #[error("{context}: {source}")]
    Llm {
        context: &'static str,
        #[source]
        source: LlmError,
    },

    /// 提供方不支持的能力
    #[error("未实现: {0}")]
    NotImplemented(String),

    /// 数据库错误
    #[error("{context}: {source}")]
    Database {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// 文件存储错误
    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// 请求参数错误
    #[error("请求错误: {0}")]
    BadRequest(String),

    /// 请求参数错误，附带细节
    #[error("{message}: {details}")]
    Invalid { message: &'static str, details: String },

    /// 上传内容超出限制
    #[error("内容过大: {0}")]
    PayloadTooLarge(String),

    /// 资源未找到
    #[error("未找到: {0}")]
    NotFound(String),
}

impl AppError {
    /// 包装 LLM 错误；提供方不支持的能力映射为 501
    pub fn llm(context: &'static str) -> impl FnOnce(LlmError) -> AppError {
        move |source| match source {
            LlmError::Unsupported(what) => AppError::NotImplemented(what),
            source => AppError::Llm { context, source },
        }
    }

    pub fn db(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
        move |source| AppError::Database { context, source }
    }

    pub fn storage(context: &'static str) -> impl FnOnce(std::io::Error) -> AppError {
        move |source| AppError::Storage { context, source }
    }

    /// HTTP 状态码
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Llm { .. } | AppError::Database { .. } | AppError::Storage { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            AppError::BadRequest(_) | AppError::Invalid { .. } => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Llm { context, source } => {
                error!("{}: {}", context, source);
                json!({ "error": context, "details": source.to_string() })
            }
            AppError::Database { context, source } => {
                error!("{}: {}", context, source);
                json!({ "error": context, "details": source.to_string() })
            }
            AppError::Storage { context, source } => {
                error!("{}: {}", context, source);
                json!({ "error": context, "details": source.to_string() })
            }
            AppError::Invalid { message, details } => {
                json!({ "error": message, "details": details })
            }
            AppError::Config(msg) => {
                error!("{}", self);
                json!({ "error": msg })
            }
            AppError::NotImplemented(msg)
            | AppError::BadRequest(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::NotFound(msg) => {
                json!({ "error": msg })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// 便捷类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_llm_error_carries_details() {
        let err = AppError::llm("Error processing AI request")(LlmError::ApiError {
            status: 429,
            message: "rate limited".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Error processing AI request");
        assert!(body["details"].as_str().unwrap().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_unsupported_maps_to_not_implemented() {
        let err = AppError::llm("Error creating embedding")(LlmError::Unsupported(
            "Embedding creation not implemented".to_string(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            body_json(response).await["error"],
            "Embedding creation not implemented"
        );
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = AppError::NotFound("File not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "File not found");
        assert!(body.get("details").is_none());
    }
}

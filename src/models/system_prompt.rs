//! 系统提示词

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 保存的系统提示词
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SystemPrompt {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

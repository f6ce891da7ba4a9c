//! 上传文件记录

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 默认用户；目前没有多用户支持
pub const DEFAULT_USER_ID: &str = "0";

/// 已上传文件的元数据
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserFile {
    pub id: Uuid,
    pub user_id: String,
    /// 磁盘上的文件名（`<uuid><.ext>`）
    pub filename: String,
    /// 客户端上传时的文件名
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    /// 相对路径，如 `uploads/0/<uuid>.png`
    pub path: String,
    pub created_at: DateTime<Utc>,
}

/// 待写入的文件记录
#[derive(Debug, Clone)]
pub struct NewUserFile {
    pub user_id: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub path: String,
}

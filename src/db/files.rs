//! user_files 表

use uuid::Uuid;

use super::Database;
use crate::models::{NewUserFile, UserFile};

const FILE_COLUMNS: &str = "id, user_id, filename, original_name, mime_type, size, path, created_at";

impl Database {
    pub async fn create_user_file(&self, file: NewUserFile) -> Result<UserFile, sqlx::Error> {
        sqlx::query_as::<_, UserFile>(&format!(
            r#"
            INSERT INTO user_files (id, user_id, filename, original_name, mime_type, size, path)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {FILE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&file.user_id)
        .bind(&file.filename)
        .bind(&file.original_name)
        .bind(&file.mime_type)
        .bind(file.size)
        .bind(&file.path)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_user_files(&self, user_id: &str) -> Result<Vec<UserFile>, sqlx::Error> {
        sqlx::query_as::<_, UserFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM user_files WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_user_file(&self, id: Uuid) -> Result<Option<UserFile>, sqlx::Error> {
        sqlx::query_as::<_, UserFile>(&format!("SELECT {FILE_COLUMNS} FROM user_files WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }
}

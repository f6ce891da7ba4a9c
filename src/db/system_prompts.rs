//! system_prompts 表

use uuid::Uuid;

use super::Database;
use crate::models::SystemPrompt;

impl Database {
    pub async fn list_system_prompts(&self) -> Result<Vec<SystemPrompt>, sqlx::Error> {
        sqlx::query_as::<_, SystemPrompt>(
            "SELECT id, name, content, created_at FROM system_prompts ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create_system_prompt(&self, name: &str, content: &str) -> Result<SystemPrompt, sqlx::Error> {
        sqlx::query_as::<_, SystemPrompt>(
            r#"
            INSERT INTO system_prompts (id, name, content)
            VALUES ($1, $2, $3)
            RETURNING id, name, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_system_prompt(&self, id: Uuid) -> Result<Option<SystemPrompt>, sqlx::Error> {
        sqlx::query_as::<_, SystemPrompt>(
            "SELECT id, name, content, created_at FROM system_prompts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// 不存在时返回 None
    pub async fn update_system_prompt(
        &self,
        id: Uuid,
        name: &str,
        content: &str,
    ) -> Result<Option<SystemPrompt>, sqlx::Error> {
        sqlx::query_as::<_, SystemPrompt>(
            r#"
            UPDATE system_prompts SET name = $1, content = $2
            WHERE id = $3
            RETURNING id, name, content, created_at
            "#,
        )
        .bind(name)
        .bind(content)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// 返回是否删除了记录
    pub async fn delete_system_prompt(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM system_prompts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

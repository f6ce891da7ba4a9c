//! conversations / messages 表

use uuid::Uuid;

use super::Database;
use crate::models::{Conversation, Message, MessageRole};

const CONVERSATION_COLUMNS: &str = "id, user_id, name, status, created_at, updated_at";

impl Database {
    pub async fn create_conversation(
        &self,
        user_id: &str,
        name: &str,
        status: &str,
    ) -> Result<Conversation, sqlx::Error> {
        sqlx::query_as::<_, Conversation>(&format!(
            r#"
            INSERT INTO conversations (id, user_id, name, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {CONVERSATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_conversations(&self) -> Result<Vec<Conversation>, sqlx::Error> {
        sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn find_conversation(&self, id: Uuid) -> Result<Option<Conversation>, sqlx::Error> {
        sqlx::query_as::<_, Conversation>(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// 重命名并刷新 updated_at；不存在时返回 None
    pub async fn rename_conversation(&self, id: Uuid, name: &str) -> Result<Option<Conversation>, sqlx::Error> {
        sqlx::query_as::<_, Conversation>(&format!(
            r#"
            UPDATE conversations SET name = $1, updated_at = now()
            WHERE id = $2
            RETURNING {CONVERSATION_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn touch_conversation(&self, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE conversations SET updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// 消息随外键级联删除
    pub async fn delete_conversation(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn add_message(
        &self,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, sqlx::Error> {
        // clock_timestamp() 保证同一事务内连续插入的消息顺序可区分
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, created_at)
            VALUES ($1, $2, $3, $4, clock_timestamp())
            RETURNING id, conversation_id, role, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(role.as_str())
        .bind(content)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, role, content, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
    }
}

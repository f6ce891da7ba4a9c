//! 系统提示词服务

use tracing::{info, warn};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::SystemPrompt;

/// 解析路径中的 UUID；无法解析视为不存在
pub fn parse_id(raw: &str) -> Option<Uuid> {
    match Uuid::parse_str(raw.trim()) {
        Ok(id) => Some(id),
        Err(_) => {
            warn!("Invalid ID provided: {:?}", raw);
            None
        }
    }
}

/// 系统提示词服务
#[derive(Clone)]
pub struct PromptService {
    db: Database,
}

impl PromptService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn get_all_prompts(&self) -> AppResult<Vec<SystemPrompt>> {
        self.db
            .list_system_prompts()
            .await
            .map_err(AppError::db("Error fetching system prompts"))
    }

    pub async fn create_prompt(&self, name: &str, content: &str) -> AppResult<SystemPrompt> {
        let prompt = self
            .db
            .create_system_prompt(name, content)
            .await
            .map_err(AppError::db("Error creating system prompt"))?;
        info!("System prompt created: id={}", prompt.id);
        Ok(prompt)
    }

    /// 不存在时返回 None
    pub async fn get_prompt(&self, id: &str) -> AppResult<Option<SystemPrompt>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        self.db
            .find_system_prompt(id)
            .await
            .map_err(AppError::db("Error fetching system prompt"))
    }

    /// 不存在时返回 None
    pub async fn update_prompt(&self, id: &str, name: &str, content: &str) -> AppResult<Option<SystemPrompt>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        self.db
            .update_system_prompt(id, name, content)
            .await
            .map_err(AppError::db("Error updating system prompt"))
    }

    /// 返回是否删除了记录
    pub async fn delete_prompt(&self, id: &str) -> AppResult<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        info!("Deleting system prompt: id={}", id);
        self.db
            .delete_system_prompt(id)
            .await
            .map_err(AppError::db("Error deleting system prompt"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()), Some(id));
        assert_eq!(parse_id("undefined"), None);
        assert_eq!(parse_id(""), None);
    }
}

//! 会话历史服务

use tracing::info;
use uuid::Uuid;

use super::prompt_service::parse_id;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::llm::ChatMessage;
use crate::models::{Conversation, ConversationWithMessages, Message, MessageRole, DEFAULT_USER_ID, STATUS_ACTIVE};

/// 未提供名称时的会话名
pub const DEFAULT_CONVERSATION_NAME: &str = "New conversation";

/// 会话历史服务
#[derive(Clone)]
pub struct ChatHistoryService {
    db: Database,
}

impl ChatHistoryService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_conversation(&self, name: &str) -> AppResult<Conversation> {
        let conversation = self
            .db
            .create_conversation(DEFAULT_USER_ID, name, STATUS_ACTIVE)
            .await
            .map_err(AppError::db("Error creating conversation"))?;
        info!("Conversation created: id={}", conversation.id);
        Ok(conversation)
    }

    pub async fn get_all_conversations(&self) -> AppResult<Vec<Conversation>> {
        self.db
            .list_conversations()
            .await
            .map_err(AppError::db("Error fetching conversations"))
    }

    /// 查找会话，不存在时返回 NotFound
    pub async fn require_conversation(&self, id: &str) -> AppResult<Conversation> {
        let not_found = || AppError::NotFound("Conversation not found".to_string());
        let id = parse_id(id).ok_or_else(not_found)?;
        self.db
            .find_conversation(id)
            .await
            .map_err(AppError::db("Error fetching conversation"))?
            .ok_or_else(not_found)
    }

    pub async fn get_conversation_with_messages(&self, id: &str) -> AppResult<ConversationWithMessages> {
        let conversation = self.require_conversation(id).await?;
        let messages = self.get_messages(conversation.id).await?;
        Ok(ConversationWithMessages {
            conversation,
            messages,
        })
    }

    pub async fn get_messages(&self, conversation_id: Uuid) -> AppResult<Vec<Message>> {
        self.db
            .list_messages(conversation_id)
            .await
            .map_err(AppError::db("Error fetching messages"))
    }

    /// 会话历史，转换为模型消息
    pub async fn history(&self, conversation_id: Uuid) -> AppResult<Vec<ChatMessage>> {
        let messages = self.get_messages(conversation_id).await?;
        Ok(messages.iter().map(ChatMessage::from).collect())
    }

    pub async fn add_message(&self, conversation_id: Uuid, role: MessageRole, content: &str) -> AppResult<Message> {
        let message = self
            .db
            .add_message(conversation_id, role, content)
            .await
            .map_err(AppError::db("Error saving message"))?;
        self.db
            .touch_conversation(conversation_id)
            .await
            .map_err(AppError::db("Error saving message"))?;
        Ok(message)
    }

    pub async fn rename_conversation(&self, id: &str, name: &str) -> AppResult<Conversation> {
        let not_found = || AppError::NotFound("Conversation not found".to_string());
        let id = parse_id(id).ok_or_else(not_found)?;
        self.db
            .rename_conversation(id, name)
            .await
            .map_err(AppError::db("Error updating conversation name"))?
            .ok_or_else(not_found)
    }

    /// 返回是否删除了记录
    pub async fn delete_conversation(&self, id: &str) -> AppResult<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        info!("Deleting conversation: id={}", id);
        self.db
            .delete_conversation(id)
            .await
            .map_err(AppError::db("Error deleting conversation"))
    }
}

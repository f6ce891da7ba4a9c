//! 应用状态管理
//!
//! 定义在请求处理器之间共享的状态。

use std::sync::Arc;

use crate::config::{AiSettings, AppConfig};
use crate::db::Database;
use crate::llm::AiProvider;
use crate::services::{AiService, ChatHistoryService, FileManagerService, FileStorage, PromptService};

/// 应用共享状态
///
/// 使用 Arc 包裹以便在多个处理器之间安全共享
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub ai: AiService,
    pub prompts: PromptService,
    pub history: ChatHistoryService,
    pub files: FileManagerService,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(config: AppConfig, db: Database, provider: Arc<dyn AiProvider>) -> Self {
        let storage = FileStorage::new(config.upload_dir.clone());
        Self {
            ai: AiService::new(provider, AiSettings::default()),
            prompts: PromptService::new(db.clone()),
            history: ChatHistoryService::new(db.clone()),
            files: FileManagerService::new(db.clone(), storage),
            db,
            config,
        }
    }
}

/// 创建可共享的应用状态
pub fn create_shared_state(config: AppConfig, db: Database, provider: Arc<dyn AiProvider>) -> Arc<AppState> {
    Arc::new(AppState::new(config, db, provider))
}

//! API 路由模块

mod chat;
mod conversations;
mod files;
mod health;
mod prompts;
mod settings;

pub use chat::chat_routes;
pub use conversations::conversations_routes;
pub use files::files_routes;
pub use health::health_routes;
pub use prompts::prompts_routes;
pub use settings::settings_routes;

use axum::Router;

use crate::state::AppState;
use std::sync::Arc;

/// 创建所有 API 路由
pub fn create_api_routes(state: Arc<AppState>) -> Router {
    let max_upload_size = state.config.max_upload_size;

    Router::new()
        .merge(health_routes())
        .merge(chat_routes())
        .merge(settings_routes())
        .merge(prompts_routes())
        .merge(conversations_routes())
        .merge(files_routes(max_upload_size))
        .with_state(state)
}

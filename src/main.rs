//! AI Chat Backend
//!
//! 使用 axum 框架构建的后端服务，代理 OpenAI 能力并持久化提示词、会话与上传文件。

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod db;
mod error;
mod llm;
mod models;
mod services;
mod state;

use api::create_api_routes;
use config::AppConfig;
use db::Database;
use llm::OpenAiProvider;
use state::create_shared_state;

/// 在 Windows 上设置控制台代码页为 UTF-8
#[cfg(windows)]
fn setup_console_encoding() {
    unsafe {
        extern "system" {
            fn SetConsoleOutputCP(code_page: u32) -> i32;
            fn SetConsoleCP(code_page: u32) -> i32;
        }
        SetConsoleOutputCP(65001);
        SetConsoleCP(65001);
    }
}

#[cfg(not(windows))]
fn setup_console_encoding() {}

/// 仅允许前端来源访问
fn cors_layer(frontend_url: &str) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(frontend_url)
        .with_context(|| format!("FRONTEND_URL is not a valid origin: {}", frontend_url))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::PUT])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_console_encoding();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_chat_backend=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting AI chat backend...");

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: environment={}, port={}, upload_dir={}",
        config.environment,
        config.port,
        config.upload_dir.display()
    );

    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Error initializing database")?;

    let provider = OpenAiProvider::new(config.api_key.clone(), config.base_url.clone())
        .context("Failed to create OpenAI client")?;

    let cors = cors_layer(&config.frontend_url)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let state = create_shared_state(config, db, Arc::new(provider));

    let app = Router::new()
        .merge(create_api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!("Server listening on: {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Postgres 持久化
//!
//! 每张表一个子模块，均以 `impl Database` 的形式提供查询。

mod chat_history;
mod files;
mod system_prompts;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const CREATE_SYSTEM_PROMPTS: &str = r#"
    CREATE TABLE IF NOT EXISTS system_prompts (
        id UUID PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

const CREATE_CONVERSATIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS conversations (
        id UUID PRIMARY KEY,
        user_id VARCHAR(255) NOT NULL DEFAULT '0',
        name VARCHAR(255) NOT NULL,
        status VARCHAR(50) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

const CREATE_MESSAGES: &str = r#"
    CREATE TABLE IF NOT EXISTS messages (
        id UUID PRIMARY KEY,
        conversation_id UUID NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
        role TEXT NOT NULL CHECK (role IN ('system', 'user', 'assistant')),
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

const CREATE_MESSAGES_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_messages_conversation
        ON messages (conversation_id, created_at)
"#;

const CREATE_USER_FILES: &str = r#"
    CREATE TABLE IF NOT EXISTS user_files (
        id UUID PRIMARY KEY,
        user_id VARCHAR(255) NOT NULL DEFAULT '0',
        filename VARCHAR(255) NOT NULL,
        original_name VARCHAR(255) NOT NULL,
        mime_type VARCHAR(255) NOT NULL,
        size BIGINT NOT NULL,
        path TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

/// 数据库句柄
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 建立连接池
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// 惰性连接池，首次查询时才建立连接
    pub fn connect_lazy(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    /// 创建缺失的表
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        for statement in [
            CREATE_SYSTEM_PROMPTS,
            CREATE_CONVERSATIONS,
            CREATE_MESSAGES,
            CREATE_MESSAGES_INDEX,
            CREATE_USER_FILES,
        ] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database tables initialized successfully");
        Ok(())
    }

    /// 数据库当前时间，用于连接检查
    pub async fn now(&self) -> Result<DateTime<Utc>, sqlx::Error> {
        sqlx::query_scalar("SELECT now()").fetch_one(&self.pool).await
    }
}

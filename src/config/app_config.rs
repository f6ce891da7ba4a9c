//! 应用配置管理
//!
//! 启动时从环境变量（以及可选的 `.env` 文件）读取配置。

use std::path::PathBuf;

use crate::error::AppError;

/// 单个上传文件的默认大小上限（10MB）
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// 应用配置结构体
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres 连接串
    pub database_url: String,

    /// LLM API 密钥
    pub api_key: String,

    /// LLM API 基础 URL
    pub base_url: String,

    /// 监听端口
    pub port: u16,

    /// 允许跨域的前端地址
    pub frontend_url: String,

    /// 运行环境名称
    pub environment: String,

    /// 上传文件根目录
    pub upload_dir: PathBuf,

    /// 单个上传文件的大小上限（字节）
    pub max_upload_size: usize,
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

impl AppConfig {
    /// 从进程环境读取配置
    pub fn from_env() -> Result<Self, AppError> {
        // .env 不存在时忽略
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意查找函数构建配置
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| AppError::Config("DATABASE_URL is not defined in environment variables".to_string()))?;
        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| AppError::Config("OPENAI_API_KEY is not defined in environment variables".to_string()))?;

        let port = match get("BACKEND_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::Config(format!("BACKEND_PORT is not a valid port: {}", raw)))?,
            None => default_port(),
        };

        let max_upload_size = match get("MAX_UPLOAD_SIZE") {
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::Config(format!("MAX_UPLOAD_SIZE is not a number: {}", raw)))?,
            None => DEFAULT_MAX_UPLOAD_SIZE,
        };

        Ok(Self {
            database_url,
            api_key,
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(default_base_url),
            port,
            frontend_url: get("FRONTEND_URL").unwrap_or_else(default_frontend_url),
            environment: get("APP_ENV")
                .or_else(|| get("NODE_ENV"))
                .unwrap_or_else(default_environment),
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_upload_dir),
            max_upload_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/chat"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://api.openai.com");
        assert_eq!(config.port, 4000);
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.environment, "development");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_missing_api_key() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/chat")]))
            .unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/chat"),
            ("OPENAI_API_KEY", "sk-test"),
            ("BACKEND_PORT", "8080"),
            ("NODE_ENV", "production"),
            ("UPLOAD_DIR", "/var/lib/chat"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, "production");
        assert_eq!(config.upload_dir, PathBuf::from("/var/lib/chat"));
    }

    #[test]
    fn test_invalid_port() {
        let result = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/chat"),
            ("OPENAI_API_KEY", "sk-test"),
            ("BACKEND_PORT", "not-a-port"),
        ]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}

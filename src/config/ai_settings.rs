//! 运行时可修改的模型参数

use serde::{Deserialize, Serialize};

/// 模型参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    /// 模型名称
    pub model: String,
    /// 温度参数 (0.0 - 2.0)
    pub temperature: f64,
    /// 最大 token 数
    pub max_tokens: u32,
    /// 调试模式：开启后记录每次请求的详细日志
    pub debugging_mode: bool,
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            debugging_mode: false,
        }
    }
}

/// 参数更新请求，未提供的字段保持不变
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettingsUpdate {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    /// 允许负数进入，以便给出明确的校验错误
    pub max_tokens: Option<i64>,
    pub debugging_mode: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AiSettings::default();
        assert_eq!(settings.model, "gpt-4o");
        assert!((settings.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(settings.max_tokens, 2000);
        assert!(!settings.debugging_mode);
    }

    #[test]
    fn test_settings_serialize_camel_case() {
        let json = serde_json::to_value(AiSettings::default()).unwrap();
        assert_eq!(json["maxTokens"], 2000);
        assert_eq!(json["debuggingMode"], false);
    }

    #[test]
    fn test_partial_update() {
        let update: AiSettingsUpdate = serde_json::from_str(r#"{"temperature": 1.2}"#).unwrap();
        assert_eq!(update.temperature, Some(1.2));
        assert!(update.model.is_none());
        assert!(update.max_tokens.is_none());
    }
}

//! URL 构建与请求负载辅助工具

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// 修复 base_url
///
/// - 移除末尾斜杠
/// - 修复双斜杠（保留协议部分）
pub fn fix_base_url(base_url: &str) -> String {
    let mut url = base_url.trim_end_matches('/').to_string();

    // 修复双斜杠（跳过协议部分）
    if let Some(pos) = url.find("://") {
        let (protocol, rest) = url.split_at(pos + 3);
        let fixed_rest = rest.replace("//", "/");
        url = format!("{}{}", protocol, fixed_rest);
    }

    url
}

/// 构建 OpenAI 兼容端点
///
/// `resource` 如 `chat/completions`、`embeddings`。base_url 可以是根地址、
/// 带 `/v1` 的地址，或直接指向 `/chat/completions` 的完整地址。
pub fn build_openai_endpoint(base_url: &str, resource: &str) -> String {
    let url = fix_base_url(base_url);
    let url = url.strip_suffix("/chat/completions").unwrap_or(&url);

    if url.ends_with("/v1") {
        format!("{}/{}", url, resource)
    } else {
        format!("{}/v1/{}", url, resource)
    }
}

/// 将图片编码为 data URL
pub fn image_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// 截断日志中的长文本
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_base_url() {
        assert_eq!(fix_base_url("https://api.openai.com/"), "https://api.openai.com");
        assert_eq!(fix_base_url("https://api.openai.com//v1"), "https://api.openai.com/v1");
    }

    #[test]
    fn test_build_openai_endpoint() {
        assert_eq!(
            build_openai_endpoint("https://api.openai.com", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            build_openai_endpoint("https://api.openai.com/v1", "embeddings"),
            "https://api.openai.com/v1/embeddings"
        );
        assert_eq!(
            build_openai_endpoint("https://api.openai.com/v1/chat/completions", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            build_openai_endpoint("https://proxy.local/v1/chat/completions", "audio/transcriptions"),
            "https://proxy.local/v1/audio/transcriptions"
        );
    }

    #[test]
    fn test_image_data_url() {
        assert_eq!(image_data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("zażółć gęślą", 4), "zażó...");
    }
}

//! LLM 模块
//!
//! 定义提供方抽象，并提供 OpenAI API 实现。

mod format;
mod openai;
mod provider;
mod types;

pub use format::preview;
pub use openai::OpenAiProvider;
pub use provider::AiProvider;
pub use types::*;

#[cfg(test)]
pub(crate) use openai::tests::spawn_mock;

//! Language-model seam: service trait, HTTP client, model selection and
//! completion parsing
//!
//! This module provides:
//! - `LanguageModel` trait with `LlmClient` for OpenAI-compatible backends
//! - `RetryingModel` bounded-backoff wrapper
//! - `ModelSelector`, the single authority for model variant choice
//! - `ResponseParser` turning completions into `ToolCall`s

mod client;
mod error;
mod message;
pub mod model_selector;
pub mod parser;
pub mod prompt;
mod retry;

pub use client::{
    function_schema, Completion, CompletionOptions, LanguageModel, LlmClient, LlmClientConfig,
    ModelStatus,
};
pub use error::LlmError;
pub use message::{ChatMessage, Role};
pub use model_selector::{
    HardwarePreset, ModelSelector, ModelSelectorConfig, ModelVariant, TaskKind,
};
pub use parser::{encode_tool_call, ParseStrategy, ParsedCompletion, ResponseParser};
pub use prompt::{build_system_prompt, DEFAULT_PERSONA};
pub use retry::{RetryConfig, RetryingModel};

//! Configuration for the cognitive loop.

use crate::llm::DEFAULT_PERSONA;
use serde::{Deserialize, Serialize};

/// Configuration for a cognitive loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CognitiveConfig {
    /// Maximum turns kept in the conversation context
    pub context_capacity: usize,

    /// Memories fetched for recall and for context before generation
    pub recall_top_k: usize,

    /// Store salient user/assistant exchanges as conversation memories
    pub remember_conversations: bool,

    /// Persona text; the tool section is appended when tools are known
    pub persona: String,

    /// Temperature for completions
    pub temperature: f32,

    /// Token cap for completions
    pub max_output_tokens: u32,
}

impl Default for CognitiveConfig {
    fn default() -> Self {
        Self {
            context_capacity: 20,
            recall_top_k: 3,
            remember_conversations: true,
            persona: DEFAULT_PERSONA.to_string(),
            temperature: std::env::var("AIDE_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(0.7),
            max_output_tokens: 1024,
        }
    }
}

impl CognitiveConfig {
    /// Config that never writes conversation memories
    pub fn without_auto_memory() -> Self {
        Self {
            remember_conversations: false,
            ..Default::default()
        }
    }
}

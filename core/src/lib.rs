// Aide Core Library
// Intent routing, cognitive loop and action dispatch for a personal assistant

pub mod cognitive;
pub mod confirm;
pub mod embedding;
pub mod llm;
pub mod memory;
pub mod tools;

// Export core types
pub use cognitive::{
    CognitiveConfig, CognitiveLoop, ConversationContext, FastThinker, IntentCategory,
    IntentClassification, IntentRouter, Phase, RouterConfig, RuntimeStatus, Session,
    SessionHandle, Turn, TurnOutcome, Utterance,
};
pub use confirm::{
    Authorization, ChannelConfirmer, ConfirmationCallback, ConfirmationGate,
    ConfirmationResponse, GateConfig, SensitivityPolicy,
};
pub use embedding::{Embedder, EmbeddingError};
pub use llm::{LanguageModel, LlmError, ModelSelector, ModelStatus, ResponseParser};
pub use memory::{
    InMemoryStore, MemoryCategory, MemoryError, MemoryRecord, MemoryStats, MemoryStore,
};
pub use tools::{ActionResult, ActionStatus, Tool, ToolCall, ToolDispatcher, ToolRegistry};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AideError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Language model error: {0}")]
    Llm(#[from] LlmError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, AideError>;

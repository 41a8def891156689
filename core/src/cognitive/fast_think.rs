use super::context::Turn;
use super::turn::Utterance;
use crate::llm::{
    ChatMessage, Completion, CompletionOptions, LanguageModel, LlmError, ModelSelector, Role,
    DEFAULT_PERSONA,
};
use std::sync::Arc;
use tracing::debug;

/// Stateless single-question completions outside the session loop.
///
/// Never touches a conversation context; callers may pass a snapshot for
/// background.
#[derive(Clone)]
pub struct FastThinker {
    model: Arc<dyn LanguageModel>,
    selector: ModelSelector,
    persona: String,
    max_output_tokens: u32,
}

impl FastThinker {
    pub fn new(model: Arc<dyn LanguageModel>, selector: ModelSelector) -> Self {
        Self {
            model,
            selector,
            persona: DEFAULT_PERSONA.to_string(),
            max_output_tokens: 512,
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    /// Answer one utterance. `background` turns (system turns excluded) are
    /// sent ahead of it.
    pub async fn think(
        &self,
        utterance: &Utterance,
        background: Option<&[Turn]>,
    ) -> Result<Completion, LlmError> {
        let variant = self.selector.fast(utterance.image.is_some());
        debug!(target: "cognitive.fast", model = %variant, "Fast completion");

        let mut messages = vec![ChatMessage::system(self.persona.clone())];
        if let Some(turns) = background {
            messages.extend(turns.iter().filter(|t| t.role != Role::System).cloned());
        }
        messages.push(ChatMessage::user(utterance.text.clone()));

        let mut options = CompletionOptions::new(variant);
        options.image = utterance.image.clone();
        options.max_output_tokens = self.max_output_tokens;
        self.model.complete(&messages, &options).await
    }
}

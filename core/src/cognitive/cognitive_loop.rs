//! The Think → Decide → Remember → Act → Respond state machine.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::confirm::{Authorization, ConfirmationGate, DenialReason};
use crate::llm::{
    build_system_prompt, ChatMessage, Completion, CompletionOptions, LanguageModel, LlmError,
    ModelSelector, ModelVariant, ResponseParser, TaskKind,
};
use crate::memory::{infer_category, MemoryRecord, MemoryStats, MemoryStore};
use crate::tools::{ActionResult, ToolCall, ToolDispatcher, ToolRegistry};

use super::config::CognitiveConfig;
use super::context::{ConversationContext, Turn};
use super::intent::IntentCategory;
use super::router::IntentRouter;
use super::turn::{Phase, RuntimeStatus, TurnOutcome, Utterance};

/// Exchanges shorter than this are not stored as conversation memories
const MIN_SALIENT_WORDS: usize = 3;

/// Per-session cognitive loop.
///
/// Owns the conversation context; every other collaborator is shared.
/// One call to [`process`](CognitiveLoop::process) is one turn.
pub struct CognitiveLoop {
    config: CognitiveConfig,
    router: Arc<IntentRouter>,
    model: Arc<dyn LanguageModel>,
    selector: ModelSelector,
    parser: ResponseParser,
    gate: Arc<ConfirmationGate>,
    dispatcher: Arc<dyn ToolDispatcher>,
    memory: Arc<dyn MemoryStore>,
    context: ConversationContext,
    tool_schemas: Vec<Value>,
}

impl CognitiveLoop {
    /// Create a loop with a default gate, selector and tool-unaware parser
    pub fn new(
        config: CognitiveConfig,
        router: Arc<IntentRouter>,
        model: Arc<dyn LanguageModel>,
        dispatcher: Arc<dyn ToolDispatcher>,
        memory: Arc<dyn MemoryStore>,
    ) -> Self {
        let context =
            ConversationContext::with_system_prompt(config.context_capacity, config.persona.clone());
        Self {
            config,
            router,
            model,
            selector: ModelSelector::default(),
            parser: ResponseParser::new(),
            gate: Arc::new(ConfirmationGate::default()),
            dispatcher,
            memory,
            context,
            tool_schemas: Vec::new(),
        }
    }

    pub fn with_selector(mut self, selector: ModelSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_gate(mut self, gate: Arc<ConfirmationGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_parser(mut self, parser: ResponseParser) -> Self {
        self.parser = parser;
        self
    }

    /// Teach the loop about registered tools: parser signatures and the
    /// tool section of the system prompt
    pub fn with_tools(mut self, registry: &ToolRegistry) -> Self {
        self.parser = ResponseParser::with_tools(registry.signatures());
        self.context
            .set_system_prompt(build_system_prompt(&self.config.persona, &registry.describe()));
        self
    }

    /// Offer function schemas to backends with native tool calling
    pub fn with_tool_schemas(mut self, schemas: Vec<Value>) -> Self {
        self.tool_schemas = schemas;
        self
    }

    pub fn config(&self) -> &CognitiveConfig {
        &self.config
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn router(&self) -> &IntentRouter {
        &self.router
    }

    /// Forget the conversation, keeping the system prompt
    pub fn clear_history(&mut self) {
        self.context.clear();
        info!(target: "cognitive", "Conversation history cleared");
    }

    pub async fn memory_stats(&self) -> MemoryStats {
        match self.memory.count().await {
            Ok(total) => MemoryStats {
                available: true,
                total,
            },
            Err(e) => {
                warn!(target: "cognitive", error = %e, "Memory store unavailable");
                MemoryStats::default()
            }
        }
    }

    /// Model availability, memory size and routing mode
    pub async fn status(&self) -> RuntimeStatus {
        let model = self.model.status().await;
        if !model.available {
            warn!(target: "cognitive", "Language model service unavailable");
        }
        RuntimeStatus {
            model,
            memory: self.memory_stats().await,
            keyword_routing: self.router.is_degraded(),
        }
    }

    /// Run one turn
    pub async fn process(&mut self, utterance: Utterance) -> TurnOutcome {
        let mut turn = TurnState::default();

        // THINK
        turn.phases.push(Phase::Think);
        self.context.push_user(utterance.text.clone());
        let classification = self.router.classify(&utterance.text).await;
        info!(
            target: "cognitive.think",
            category = %classification.category,
            confidence = classification.confidence,
            method = ?classification.method,
            "Classified utterance"
        );

        // DECIDE
        turn.phases.push(Phase::Decide);
        let response = match classification.category {
            IntentCategory::Remember => self.remember(&utterance, &mut turn).await,
            IntentCategory::Recall => self.recall(&utterance, &mut turn).await,
            category => self.generate(category, &utterance, &mut turn).await,
        };

        // RESPOND
        turn.phases.push(Phase::Respond);
        self.context.push_assistant(response.clone());

        if turn.model_backed
            && turn.degraded.is_none()
            && turn.actions.is_empty()
            && classification.category != IntentCategory::Recall
        {
            self.auto_remember(&utterance.text, &response).await;
        }

        TurnOutcome {
            response,
            classification,
            actions: turn.actions,
            phases: turn.phases,
            model: turn.model,
            degraded: turn.degraded,
        }
    }

    async fn remember(&self, utterance: &Utterance, turn: &mut TurnState) -> String {
        turn.phases.push(Phase::Remember);
        let text = utterance.text.trim();
        let record = MemoryRecord::new(text, infer_category(text));
        let category = record.category;
        match self.memory.insert(record).await {
            Ok(id) => {
                info!(target: "cognitive.remember", %id, %category, "Stored memory");
                format!("Got it, I'll remember that: {}", text)
            }
            Err(e) => {
                warn!(target: "cognitive.remember", error = %e, "Could not store memory");
                turn.degraded = Some(e.to_string());
                "I couldn't save that to memory right now.".to_string()
            }
        }
    }

    async fn recall(&self, utterance: &Utterance, turn: &mut TurnState) -> String {
        turn.phases.push(Phase::Remember);
        let memories = match self
            .memory
            .query(&utterance.text, self.config.recall_top_k, None)
            .await
        {
            Ok(m) => m,
            Err(e) => {
                warn!(target: "cognitive.remember", error = %e, "Memory query failed");
                turn.degraded = Some(e.to_string());
                return "I can't check my memory right now.".to_string();
            }
        };
        debug!(target: "cognitive.remember", hits = memories.len(), "Recalled memories");

        if memories.is_empty() {
            return "I don't have anything saved about that yet.".to_string();
        }

        let variant = self.selector.select(
            IntentCategory::Recall,
            &utterance.text,
            utterance.image.is_some(),
        );
        let notes = recall_note(&memories);
        match self.complete(&variant, Some(notes), utterance, turn).await {
            Ok(completion) => {
                let spoken = self.parser.parse_detailed(&completion.text).spoken;
                if spoken.is_empty() {
                    completion.text.trim().to_string()
                } else {
                    spoken
                }
            }
            Err(e) => {
                turn.degraded = Some(e.to_string());
                let listing = memories
                    .iter()
                    .map(|m| format!("• {}", m.text))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("I remember:\n{}", listing)
            }
        }
    }

    async fn generate(
        &mut self,
        category: IntentCategory,
        utterance: &Utterance,
        turn: &mut TurnState,
    ) -> String {
        let notes = self.context_note(&utterance.text).await;
        let variant = self
            .selector
            .select(category, &utterance.text, utterance.image.is_some());

        let completion = match self.complete(&variant, notes, utterance, turn).await {
            Ok(c) => c,
            Err(e) => {
                turn.degraded = Some(e.to_string());
                return format!("Sorry, {}. Please try again in a moment.", e.user_message());
            }
        };

        if !category.uses_tools() {
            return completion.text;
        }

        let (calls, spoken) = if completion.structured_calls.is_empty() {
            let parsed = self.parser.parse_detailed(&completion.text);
            debug!(target: "cognitive.act", strategy = ?parsed.strategy, calls = parsed.calls.len(), "Parsed completion");
            (parsed.calls, parsed.spoken)
        } else {
            let spoken = completion.text.trim().to_string();
            (completion.structured_calls, spoken)
        };

        if calls.is_empty() {
            return if spoken.is_empty() {
                completion.text.trim().to_string()
            } else {
                spoken
            };
        }

        turn.phases.push(Phase::Act);
        for call in calls {
            let result = self.act(&call).await;
            self.context.push_tool(result.summary());
            turn.actions.push(result);
        }

        let mut lines: Vec<String> = Vec::new();
        if !spoken.is_empty() {
            lines.push(spoken);
        }
        lines.extend(turn.actions.iter().map(ActionResult::summary));
        lines.join("\n")
    }

    /// Gate then dispatch one call
    async fn act(&self, call: &ToolCall) -> ActionResult {
        match self.gate.authorize_and_wait(call).await {
            Authorization::Approved => {
                info!(target: "cognitive.act", tool = %call.name, "Dispatching tool call");
                let result = self
                    .dispatcher
                    .dispatch(&call.name, call.arguments_value())
                    .await;
                if !result.is_ok() {
                    warn!(target: "cognitive.act", tool = %call.name, detail = ?result.detail, "Tool call failed");
                }
                result
            }
            Authorization::Denied(reason) => {
                info!(target: "cognitive.act", tool = %call.name, %reason, "Tool call denied");
                ActionResult::denied(&call.name, reason.to_string())
            }
            // authorize_and_wait resolves pending confirmations
            Authorization::Pending(_) => {
                ActionResult::denied(&call.name, DenialReason::Declined.to_string())
            }
        }
    }

    async fn complete(
        &self,
        variant: &ModelVariant,
        notes: Option<String>,
        utterance: &Utterance,
        turn: &mut TurnState,
    ) -> Result<Completion, LlmError> {
        turn.model_backed = true;
        turn.model = Some(variant.clone());

        let messages = with_notes(self.context.snapshot(), notes);
        // text-only variants never receive image parts
        let image = utterance
            .image
            .clone()
            .filter(|_| variant.task == TaskKind::Vision);
        if image.is_none() && utterance.image.is_some() {
            debug!(target: "cognitive.think", model = %variant, "Dropping image for a text-only model");
        }
        let options = CompletionOptions {
            model: variant.clone(),
            max_context_turns: self.config.context_capacity,
            image,
            temperature: self.config.temperature,
            max_output_tokens: self.config.max_output_tokens,
            tools: self.tool_schemas.clone(),
        };

        debug!(target: "cognitive.think", model = %variant, messages = messages.len(), "Requesting completion");
        self.model.complete(&messages, &options).await.map_err(|e| {
            warn!(target: "cognitive.think", model = %variant, error = %e, "Completion failed; degrading");
            e
        })
    }

    /// Relevant memories as a system note; store failures only cost context
    async fn context_note(&self, text: &str) -> Option<String> {
        if self.config.recall_top_k == 0 {
            return None;
        }
        match self.memory.query(text, self.config.recall_top_k, None).await {
            Ok(memories) if !memories.is_empty() => Some(format!(
                "Things you remember that may be relevant:\n{}",
                bullet_list(&memories)
            )),
            Ok(_) => None,
            Err(e) => {
                warn!(target: "cognitive.remember", error = %e, "Context recall failed; continuing without memories");
                None
            }
        }
    }

    async fn auto_remember(&self, user: &str, assistant: &str) {
        if !self.config.remember_conversations
            || user.split_whitespace().count() < MIN_SALIENT_WORDS
            || assistant.trim().is_empty()
        {
            return;
        }
        if let Err(e) = self
            .memory
            .insert(MemoryRecord::conversation(user.trim(), assistant.trim()))
            .await
        {
            warn!(target: "cognitive.remember", error = %e, "Could not store conversation memory");
        }
    }
}

#[derive(Default)]
struct TurnState {
    phases: Vec<Phase>,
    actions: Vec<ActionResult>,
    model: Option<ModelVariant>,
    degraded: Option<String>,
    model_backed: bool,
}

fn bullet_list(memories: &[MemoryRecord]) -> String {
    memories
        .iter()
        .map(|m| format!("- {}", m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn recall_note(memories: &[MemoryRecord]) -> String {
    format!(
        "The user is asking about something they told you before. Answer briefly using only these memories:\n{}",
        bullet_list(memories)
    )
}

/// Insert a system note after the leading system prompt
fn with_notes(mut messages: Vec<Turn>, notes: Option<String>) -> Vec<Turn> {
    if let Some(note) = notes {
        let at = messages
            .iter()
            .take_while(|m| m.role == crate::llm::Role::System)
            .count();
        messages.insert(at, ChatMessage::system(note));
    }
    messages
}

impl std::fmt::Debug for CognitiveLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CognitiveLoop")
            .field("config", &self.config)
            .field("context_len", &self.context.len())
            .finish()
    }
}

//! End-to-end turns through the cognitive loop with fake services.

mod common;

use aide_core::confirm::{ConfirmationGate, GateConfig, SensitivityPolicy};
use aide_core::llm::{encode_tool_call, LlmError, Role, TaskKind};
use aide_core::memory::{InMemoryStore, MemoryCategory, MemoryStore};
use aide_core::tools::{ActionStatus, ToolCall};
use aide_core::{
    CognitiveConfig, CognitiveLoop, IntentCategory, IntentRouter, Phase, RouterConfig, Utterance,
};
use common::{CountingStore, FailingEmbedder, RecordingDispatcher, ScriptedModel};
use serde_json::{json, Map, Value};
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

struct Harness {
    model: Arc<ScriptedModel>,
    dispatcher: Arc<RecordingDispatcher>,
    memory: Arc<CountingStore>,
    cognitive: CognitiveLoop,
}

fn harness(model: ScriptedModel) -> Harness {
    harness_with(model, CountingStore::new(), CognitiveConfig::default())
}

fn harness_with(model: ScriptedModel, memory: CountingStore, config: CognitiveConfig) -> Harness {
    let model = Arc::new(model);
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let memory = Arc::new(memory);
    let cognitive = CognitiveLoop::new(
        config,
        Arc::new(IntentRouter::keyword_only()),
        model.clone(),
        dispatcher.clone(),
        memory.clone(),
    );
    Harness {
        model,
        dispatcher,
        memory,
        cognitive,
    }
}

fn call(name: &str, args: Value) -> ToolCall {
    let arguments: Map<String, Value> = args.as_object().cloned().unwrap_or_default();
    ToolCall::new(name, arguments)
}

// ============================================================================
// REMEMBER / RECALL
// ============================================================================

#[tokio::test]
async fn remember_stores_once_without_model_or_tools() {
    let mut h = harness(ScriptedModel::new());

    let outcome = h
        .cognitive
        .process(Utterance::new("Remember that my project is Alpha"))
        .await;

    assert_eq!(outcome.classification.category, IntentCategory::Remember);
    assert_eq!(h.memory.insert_count(), 1);
    let records = h.memory.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, MemoryCategory::Fact);
    assert!(records[0].text.contains("Alpha"));
    assert!(outcome.response.contains("remember"));
    assert!(outcome.phases.contains(&Phase::Remember));
    assert!(outcome.actions.is_empty());
    assert_eq!(h.dispatcher.count(), 0);
    assert_eq!(h.model.request_count(), 0);
}

#[tokio::test]
async fn preferences_are_stored_as_preferences() {
    let mut h = harness(ScriptedModel::new());
    h.cognitive
        .process(Utterance::new("I like my coffee black"))
        .await;

    let records = h.memory.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, MemoryCategory::Preference);
}

#[tokio::test]
async fn recall_answers_from_stored_memories() {
    let mut h = harness(ScriptedModel::new().reply("Your project is Alpha."));

    h.cognitive
        .process(Utterance::new("Remember that my project is Alpha"))
        .await;
    let outcome = h
        .cognitive
        .process(Utterance::new("What is my project called?"))
        .await;

    assert_eq!(outcome.classification.category, IntentCategory::Recall);
    assert_eq!(outcome.response, "Your project is Alpha.");
    assert_eq!(h.model.request_count(), 1);

    let (messages, _) = h.model.last_request().unwrap();
    let notes: Vec<_> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.clone())
        .collect();
    assert!(notes.iter().any(|n| n.contains("my project is Alpha")));
    // recall turns are not written back as conversation memories
    assert_eq!(h.memory.insert_count(), 1);
}

#[tokio::test]
async fn recall_with_no_memories_skips_the_model() {
    let mut h = harness(ScriptedModel::new());
    let outcome = h
        .cognitive
        .process(Utterance::new("Do you remember my birthday?"))
        .await;

    assert_eq!(outcome.classification.category, IntentCategory::Recall);
    assert!(outcome.response.contains("don't have anything saved"));
    assert_eq!(h.model.request_count(), 0);
}

#[tokio::test]
async fn recall_lists_memories_when_the_model_fails() {
    let mut h = harness(ScriptedModel::new().fail(LlmError::Timeout));
    h.cognitive
        .process(Utterance::new("Remember that my project is Alpha"))
        .await;

    let outcome = h
        .cognitive
        .process(Utterance::new("What is my project?"))
        .await;

    assert!(outcome.is_degraded());
    assert!(outcome.response.starts_with("I remember:"));
    assert!(outcome.response.contains("Alpha"));
}

#[tokio::test]
async fn broken_memory_store_degrades_remember() {
    let mut h = harness_with(
        ScriptedModel::new(),
        CountingStore::broken(),
        CognitiveConfig::default(),
    );
    let outcome = h
        .cognitive
        .process(Utterance::new("Remember that my project is Alpha"))
        .await;

    assert!(outcome.is_degraded());
    assert!(outcome.response.contains("couldn't save"));
}

// ============================================================================
// ACT
// ============================================================================

#[tokio::test]
async fn open_notepad_dispatches_exactly_once() {
    let reply = encode_tool_call(&call("open_app", json!({"app_name": "notepad"})));
    let mut h = harness(ScriptedModel::new().reply(&reply));

    let outcome = h.cognitive.process(Utterance::new("Open notepad")).await;

    assert_eq!(outcome.classification.category, IntentCategory::Act);
    assert_eq!(h.dispatcher.names(), vec!["open_app".to_string()]);
    let (_, args) = h.dispatcher.calls.lock().unwrap()[0].clone();
    assert_eq!(args, json!({"app_name": "notepad"}));
    assert_eq!(outcome.actions.len(), 1);
    assert_eq!(outcome.actions[0].status, ActionStatus::Ok);
    assert!(outcome.phases.contains(&Phase::Act));
    assert_eq!(outcome.model.as_ref().map(|m| m.task), Some(TaskKind::System));
}

#[tokio::test]
async fn tool_results_are_added_to_context() {
    let reply = encode_tool_call(&call("open_app", json!({"app_name": "notepad"})));
    let mut h = harness(ScriptedModel::new().reply(&reply));

    h.cognitive.process(Utterance::new("Open notepad")).await;

    let roles: Vec<Role> = h.cognitive.context().turns().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Tool, Role::Assistant]
    );
}

#[tokio::test]
async fn delete_all_files_is_denied_without_confirmation() {
    let reply = encode_tool_call(&call("delete_file", json!({"path": "."})));
    let mut h = harness(ScriptedModel::new().reply(&reply));

    let outcome = h
        .cognitive
        .process(Utterance::new("Delete all my files"))
        .await;

    assert_eq!(outcome.classification.category, IntentCategory::Act);
    assert_eq!(h.dispatcher.count(), 0);
    assert_eq!(outcome.actions.len(), 1);
    assert_eq!(outcome.actions[0].status, ActionStatus::Denied);
    assert!(outcome.response.contains("Cancelled"));
}

#[tokio::test]
async fn mixed_calls_run_safe_ones_and_deny_sensitive_ones() {
    let reply = "On it.\nTOOL_CALL: list_directory(path=\"docs\")\nTOOL_CALL: delete_file(path=\"docs/old.txt\")";
    let mut h = harness(ScriptedModel::new().reply(reply));
    let gate = ConfirmationGate::new(SensitivityPolicy::default(), GateConfig::default());
    h.cognitive = h.cognitive.with_gate(Arc::new(gate));

    let outcome = h
        .cognitive
        .process(Utterance::new("List my files and remove the old one"))
        .await;

    assert_eq!(h.dispatcher.names(), vec!["list_directory".to_string()]);
    let statuses: Vec<_> = outcome.actions.iter().map(|a| a.status).collect();
    assert_eq!(statuses, vec![ActionStatus::Ok, ActionStatus::Denied]);
    assert!(outcome.response.starts_with("On it."));
}

#[tokio::test]
async fn act_reply_without_calls_is_spoken_as_is() {
    let mut h = harness(ScriptedModel::new().reply("I can't find that application."));
    let outcome = h.cognitive.process(Utterance::new("Launch the flux capacitor")).await;

    assert_eq!(outcome.response, "I can't find that application.");
    assert!(outcome.actions.is_empty());
    assert!(!outcome.phases.contains(&Phase::Act));
}

#[tokio::test]
async fn code_answer_with_plain_json_is_not_dispatched() {
    let reply = "Here is your package.json:\n```json\n{\"name\": \"my-app\", \"version\": \"1.0.0\"}\n```";
    let mut h = harness(ScriptedModel::new().reply(reply));

    let outcome = h
        .cognitive
        .process(Utterance::new("Write a python script config for me"))
        .await;

    assert_eq!(outcome.classification.category, IntentCategory::Code);
    assert_eq!(h.dispatcher.count(), 0);
    assert!(outcome.actions.is_empty());
    assert_eq!(outcome.response, reply);
}

#[tokio::test]
async fn images_only_reach_vision_models() {
    let image = "data:image/png;base64,AAAA";
    let mut h = harness(ScriptedModel::new().reply("A cat.").reply("Done."));

    h.cognitive
        .process(Utterance::new("What do you see in this picture?").with_image(image))
        .await;
    let (_, options) = h.model.last_request().unwrap();
    assert_eq!(options.model.task, TaskKind::Vision);
    assert!(options.image.is_some());

    h.cognitive
        .process(Utterance::new("Open notepad").with_image(image))
        .await;
    let (_, options) = h.model.last_request().unwrap();
    assert_eq!(options.model.task, TaskKind::System);
    assert!(options.image.is_none());
}

// ============================================================================
// CHAT and degradation
// ============================================================================

#[tokio::test]
async fn chat_returns_completion_verbatim() {
    let text = "Here is how a call looks: {\"tool\": \"open_app\"}";
    let mut h = harness(ScriptedModel::new().reply(text));

    let outcome = h.cognitive.process(Utterance::new("How are you today?")).await;

    assert_eq!(outcome.classification.category, IntentCategory::Chat);
    assert_eq!(outcome.response, text);
    assert_eq!(h.dispatcher.count(), 0);
}

#[tokio::test]
async fn chat_exchange_is_remembered_as_conversation() {
    let mut h = harness(ScriptedModel::new().reply("I'm doing well, thanks!"));
    h.cognitive.process(Utterance::new("How are you today?")).await;

    let records = h.memory.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, MemoryCategory::Conversation);
}

#[tokio::test]
async fn auto_memory_can_be_disabled() {
    let mut h = harness_with(
        ScriptedModel::new().reply("Fine."),
        CountingStore::new(),
        CognitiveConfig::without_auto_memory(),
    );
    h.cognitive.process(Utterance::new("How are you today?")).await;
    assert_eq!(h.memory.insert_count(), 0);
}

#[tokio::test]
async fn model_failure_yields_apology_and_degraded_turn() {
    let mut h = harness(ScriptedModel::new().fail(LlmError::Unreachable("refused".into())));

    let outcome = h.cognitive.process(Utterance::new("Tell me a joke")).await;

    assert!(outcome.is_degraded());
    assert!(outcome.response.starts_with("Sorry"));
    assert_eq!(h.memory.insert_count(), 0);
    // the conversation still records the apology
    assert_eq!(h.cognitive.context().last().map(|t| t.role), Some(Role::Assistant));
}

#[tokio::test]
async fn embedder_outage_falls_back_to_keywords_without_retry_storm() {
    let embedder = Arc::new(FailingEmbedder::unavailable());
    let router = Arc::new(IntentRouter::new(embedder.clone(), RouterConfig::default()));
    let store = Arc::new(InMemoryStore::with_embedder(embedder.clone()));
    let reply = encode_tool_call(&call("open_app", json!({"app_name": "notepad"})));
    let model = Arc::new(ScriptedModel::new().reply(&reply).reply(&reply));
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let mut cognitive = CognitiveLoop::new(
        CognitiveConfig::default(),
        router.clone(),
        model,
        dispatcher.clone(),
        store.clone(),
    );

    let first = cognitive.process(Utterance::new("Open notepad")).await;
    let after_first = embedder.count();
    let second = cognitive.process(Utterance::new("Open notepad")).await;
    for _ in 0..3 {
        cognitive.process(Utterance::new("How are you today?")).await;
    }

    assert_eq!(first.classification.category, IntentCategory::Act);
    assert_eq!(second.classification.category, IntentCategory::Act);
    assert!(router.is_degraded());
    assert!(store.is_degraded());
    // one failed call from the router, one from the store
    assert_eq!(after_first, 2);
    assert_eq!(embedder.count(), after_first);
    assert_eq!(dispatcher.count(), 2);
    // conversation memories are still stored lexically
    assert_eq!(store.count().await.unwrap(), 3);
}

#[tokio::test]
async fn context_stays_bounded_over_many_turns() {
    let mut model = ScriptedModel::new();
    for _ in 0..10 {
        model = model.reply("Sure.");
    }
    let config = CognitiveConfig {
        context_capacity: 5,
        remember_conversations: false,
        ..Default::default()
    };
    let mut h = harness_with(model, CountingStore::new(), config);

    for i in 0..10 {
        h.cognitive
            .process(Utterance::new(format!("Tell me a joke number {}", i)))
            .await;
    }

    assert_eq!(h.cognitive.context().len(), 5);
    assert_eq!(
        h.cognitive.context().turns().next().map(|t| t.role),
        Some(Role::System)
    );
}

//! Shared fakes for integration tests.
#![allow(dead_code)]

use aide_core::embedding::{Embedder, EmbeddingError};
use aide_core::llm::{
    ChatMessage, Completion, CompletionOptions, LanguageModel, LlmError, ModelStatus,
};
use aide_core::memory::{MemoryCategory, MemoryError, MemoryRecord, MemoryStore};
use aide_core::tools::{ActionResult, ToolDispatcher};
use aide_core::InMemoryStore;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Embedders
// ============================================================================

/// Returns a fixed vector per known text, `fallback` otherwise
pub struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
    pub calls: AtomicUsize,
}

impl TableEmbedder {
    pub fn new(fallback: Vec<f32>) -> Self {
        Self {
            table: HashMap::new(),
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.table.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl Embedder for TableEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .table
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

/// Always fails with the given error, counting attempts
pub struct FailingEmbedder {
    error: EmbeddingError,
    pub calls: AtomicUsize,
}

impl FailingEmbedder {
    pub fn unavailable() -> Self {
        Self {
            error: EmbeddingError::ServiceUnavailable("connection refused".into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn malformed() -> Self {
        Self {
            error: EmbeddingError::MalformedResponse("no embedding field".into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

// ============================================================================
// Language model
// ============================================================================

/// Replays scripted completions in order and records every request
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<Completion, LlmError>>>,
    pub requests: Mutex<Vec<(Vec<ChatMessage>, CompletionOptions)>>,
    offline: bool,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(Completion::text(text)));
        self
    }

    /// Status checks report the service as down
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn fail(self, error: LlmError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<(Vec<ChatMessage>, CompletionOptions)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        self.requests
            .lock()
            .unwrap()
            .push((messages.to_vec(), options.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Completion::text("OK")))
    }

    async fn status(&self) -> ModelStatus {
        if self.offline {
            ModelStatus::unavailable()
        } else {
            ModelStatus {
                available: true,
                models: vec!["scripted".into()],
            }
        }
    }
}

// ============================================================================
// Tools
// ============================================================================

/// Records dispatched calls and answers each with a success
#[derive(Default)]
pub struct RecordingDispatcher {
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }
}

#[async_trait]
impl ToolDispatcher for RecordingDispatcher {
    async fn dispatch(&self, name: &str, arguments: Value) -> ActionResult {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        ActionResult::ok(name, json!({ "message": format!("{} done", name) }), 1)
    }
}

// ============================================================================
// Memory
// ============================================================================

/// In-memory store that counts operations, or fails them all
pub struct CountingStore {
    inner: InMemoryStore,
    fail: bool,
    pub inserts: AtomicUsize,
    pub queries: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            fail: false,
            inserts: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn broken() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<MemoryRecord> {
        self.inner.records()
    }
}

#[async_trait]
impl MemoryStore for CountingStore {
    async fn insert(&self, record: MemoryRecord) -> Result<String, MemoryError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MemoryError::Unavailable("store offline".into()));
        }
        self.inner.insert(record).await
    }

    async fn query(
        &self,
        text: &str,
        top_k: usize,
        category: Option<MemoryCategory>,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MemoryError::Unavailable("store offline".into()));
        }
        self.inner.query(text, top_k, category).await
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        if self.fail {
            return Err(MemoryError::Unavailable("store offline".into()));
        }
        self.inner.count().await
    }

    async fn clear(&self) -> Result<usize, MemoryError> {
        if self.fail {
            return Err(MemoryError::Unavailable("store offline".into()));
        }
        self.inner.clear().await
    }
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}

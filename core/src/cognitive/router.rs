//! Hybrid intent router: embedding similarity first, keyword table second.

use super::intent::{IntentCategory, IntentClassification};
use super::keywords::KeywordTable;
use crate::embedding::{cosine_similarity, validate_embedding, Embedder, EmbeddingError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Minimum similarity for an embedding decision
    pub threshold: f32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { threshold: 0.35 }
    }
}

/// Exemplar phrases per category
#[derive(Debug, Clone)]
pub struct Prototypes {
    entries: Vec<(IntentCategory, Vec<String>)>,
}

impl Prototypes {
    pub fn new(entries: impl IntoIterator<Item = (IntentCategory, Vec<String>)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn entries(&self) -> &[(IntentCategory, Vec<String>)] {
        &self.entries
    }
}

impl Default for Prototypes {
    fn default() -> Self {
        let table: &[(IntentCategory, &[&str])] = &[
            (
                IntentCategory::Remember,
                &[
                    "remember that",
                    "store this information",
                    "save this to memory",
                    "don't forget that",
                    "keep a note of this",
                    "memorize this fact",
                    "I want you to know that",
                    "here is a new fact",
                    "my name is",
                ],
            ),
            (
                IntentCategory::Recall,
                &[
                    "what do you know about",
                    "search your memory for",
                    "do you remember",
                    "what did I tell you about",
                    "have we talked about",
                    "retrieve notes on",
                ],
            ),
            (
                IntentCategory::Act,
                &[
                    "open the application",
                    "close the program",
                    "launch chrome",
                    "run this app",
                    "delete this file",
                    "create a folder",
                    "list the files in my documents",
                    "turn up volume",
                    "set a timer",
                ],
            ),
            (
                IntentCategory::Code,
                &[
                    "write a python script",
                    "generate code for",
                    "debug this function",
                    "implement a class",
                    "fix this error",
                    "refactor this code",
                    "programming help",
                ],
            ),
            (
                IntentCategory::See,
                &[
                    "what is on my screen",
                    "look at this image",
                    "describe this picture",
                    "read the text on screen",
                    "what do you see",
                ],
            ),
            (
                IntentCategory::Web,
                &[
                    "search google for",
                    "go to website",
                    "open browser and search",
                    "look this up online",
                    "find on the internet",
                ],
            ),
            (
                IntentCategory::Convert,
                &[
                    "convert this image to png",
                    "convert the document to pdf",
                    "extract text from this pdf",
                    "export the slides as images",
                ],
            ),
            (
                IntentCategory::Chat,
                &[
                    "how are you",
                    "tell me a joke",
                    "what do you think about",
                    "let's talk",
                    "thank you",
                ],
            ),
        ];
        Self::new(
            table
                .iter()
                .map(|(c, phrases)| (*c, phrases.iter().map(|p| p.to_string()).collect())),
        )
    }
}

/// Embedded prototypes, computed once per router
#[derive(Debug)]
struct PrototypeTable {
    /// In tie-break priority order
    vectors: Vec<(IntentCategory, Vec<Vec<f32>>)>,
    dim: usize,
}

/// Classifies utterances into [`IntentCategory`].
///
/// Prototype embeddings are computed on first use (or by [`warm_up`]) and
/// kept for the router's lifetime. Once the embedder reports
/// `ServiceUnavailable` the router stays on keyword matching and never calls
/// the embedder again.
///
/// [`warm_up`]: IntentRouter::warm_up
pub struct IntentRouter {
    embedder: Option<Arc<dyn Embedder>>,
    prototypes: Prototypes,
    keywords: KeywordTable,
    config: RouterConfig,
    table: OnceCell<PrototypeTable>,
    degraded: AtomicBool,
}

impl IntentRouter {
    pub fn new(embedder: Arc<dyn Embedder>, config: RouterConfig) -> Self {
        Self {
            embedder: Some(embedder),
            prototypes: Prototypes::default(),
            keywords: KeywordTable::default(),
            config,
            table: OnceCell::new(),
            degraded: AtomicBool::new(false),
        }
    }

    /// Router without an embedding service
    pub fn keyword_only() -> Self {
        Self {
            embedder: None,
            prototypes: Prototypes::default(),
            keywords: KeywordTable::default(),
            config: RouterConfig::default(),
            table: OnceCell::new(),
            degraded: AtomicBool::new(false),
        }
    }

    pub fn with_prototypes(mut self, prototypes: Prototypes) -> Self {
        self.prototypes = prototypes;
        self
    }

    pub fn with_keywords(mut self, keywords: KeywordTable) -> Self {
        self.keywords = keywords;
        self
    }

    /// True once routing has fallen back to keywords for the session
    pub fn is_degraded(&self) -> bool {
        self.embedder.is_none() || self.degraded.load(Ordering::Relaxed)
    }

    /// Precompute prototype embeddings. Returns whether embedding routing is available.
    pub async fn warm_up(&self) -> bool {
        if self.is_degraded() {
            return false;
        }
        match self.prototype_table().await {
            Ok(_) => true,
            Err(e) => {
                self.degrade(&e);
                false
            }
        }
    }

    pub async fn classify(&self, text: &str) -> IntentClassification {
        if text.trim().is_empty() {
            return IntentClassification::chat_default();
        }
        if let Some(classification) = self.classify_by_embedding(text).await {
            return classification;
        }
        self.classify_by_keyword(text)
    }

    /// Keyword-table decision, CHAT when nothing matches
    pub fn classify_by_keyword(&self, text: &str) -> IntentClassification {
        let classification = match self.keywords.classify(text) {
            Some(category) => IntentClassification::keyword(category),
            None => IntentClassification::chat_default(),
        };
        debug!(target: "intent_router", category = %classification.category, "Keyword route");
        classification
    }

    async fn classify_by_embedding(&self, text: &str) -> Option<IntentClassification> {
        let embedder = self.embedder.as_ref()?;
        if self.is_degraded() {
            return None;
        }

        let table = match self.prototype_table().await {
            Ok(table) => table,
            Err(e) => {
                self.degrade(&e);
                return None;
            }
        };

        let query = match embedder.embed(text).await {
            Ok(v) => v,
            Err(e @ EmbeddingError::ServiceUnavailable(_)) => {
                self.degrade(&e);
                return None;
            }
            Err(e) => {
                warn!(target: "intent_router", error = %e, "Malformed utterance embedding; keyword fallback for this utterance");
                return None;
            }
        };
        if let Err(e) = validate_embedding(&query, Some(table.dim)) {
            warn!(target: "intent_router", error = %e, "Unusable utterance embedding; keyword fallback for this utterance");
            return None;
        }

        // strict `>` keeps the earlier (higher priority) category on ties
        let mut best: Option<(IntentCategory, f32)> = None;
        for (category, vectors) in &table.vectors {
            let score = vectors
                .iter()
                .map(|v| cosine_similarity(&query, v))
                .fold(f32::NEG_INFINITY, f32::max);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((*category, score));
            }
        }

        let (category, score) = best?;
        debug!(target: "intent_router", category = %category, score, "Best prototype match");
        if score >= self.config.threshold {
            Some(IntentClassification::embedding(category, score))
        } else {
            None
        }
    }

    async fn prototype_table(&self) -> Result<&PrototypeTable, EmbeddingError> {
        self.table
            .get_or_try_init(|| async { self.compute_table().await })
            .await
    }

    async fn compute_table(&self) -> Result<PrototypeTable, EmbeddingError> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or_else(|| EmbeddingError::ServiceUnavailable("no embedder configured".into()))?;

        let mut ordered: Vec<&(IntentCategory, Vec<String>)> =
            self.prototypes.entries().iter().collect();
        ordered.sort_by_key(|(category, _)| category.priority());

        let mut dim: Option<usize> = None;
        let mut vectors = Vec::with_capacity(ordered.len());
        for (category, phrases) in ordered {
            let mut embedded = Vec::with_capacity(phrases.len());
            for phrase in phrases {
                match embedder.embed(phrase).await {
                    Ok(v) => match validate_embedding(&v, dim) {
                        Ok(()) => {
                            dim.get_or_insert(v.len());
                            embedded.push(v);
                        }
                        Err(e) => {
                            warn!(target: "intent_router", %category, phrase = %phrase, error = %e, "Skipping prototype")
                        }
                    },
                    Err(e @ EmbeddingError::ServiceUnavailable(_)) => return Err(e),
                    Err(e) => {
                        warn!(target: "intent_router", %category, phrase = %phrase, error = %e, "Skipping prototype")
                    }
                }
            }
            if !embedded.is_empty() {
                vectors.push((*category, embedded));
            }
        }

        let dim = dim.ok_or_else(|| {
            EmbeddingError::MalformedResponse("no usable prototype embeddings".into())
        })?;
        info!(
            target: "intent_router",
            categories = vectors.len(),
            dim,
            "Prototype embeddings ready"
        );
        Ok(PrototypeTable { vectors, dim })
    }

    fn degrade(&self, error: &EmbeddingError) {
        if !self.degraded.swap(true, Ordering::Relaxed) {
            warn!(
                target: "intent_router",
                error = %error,
                "Embedding routing unavailable; using keyword matching for the rest of the session"
            );
        }
    }
}

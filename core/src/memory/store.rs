//! In-memory implementation of [`MemoryStore`].

use super::{MemoryCategory, MemoryError, MemoryRecord, MemoryStore};
use crate::embedding::{cosine_similarity, Embedder, EmbeddingError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// DashMap-backed store.
///
/// Ranks by cosine similarity when both the query and a record have an
/// embedding, otherwise by token overlap. Without an embedder every query
/// is lexical, and once the embedder reports itself unavailable it is not
/// called again.
pub struct InMemoryStore {
    records: DashMap<String, MemoryRecord>,
    embedder: Option<Arc<dyn Embedder>>,
    degraded: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            embedder: None,
            degraded: AtomicBool::new(false),
        }
    }

    pub fn with_embedder(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            records: DashMap::new(),
            embedder: Some(embedder),
            degraded: AtomicBool::new(false),
        }
    }

    /// All stored records, oldest first
    pub fn records(&self) -> Vec<MemoryRecord> {
        let mut all: Vec<MemoryRecord> = self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|r| r.created_at);
        all
    }

    /// True once the embedder has been given up on
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    async fn try_embed(&self, text: &str) -> Option<Vec<f32>> {
        let embedder = self.embedder.as_ref()?;
        if self.is_degraded() {
            return None;
        }
        match embedder.embed(text).await {
            Ok(v) => Some(v),
            Err(e @ EmbeddingError::ServiceUnavailable(_)) => {
                if !self.degraded.swap(true, Ordering::Relaxed) {
                    warn!(
                        target: "memory_store",
                        error = %e,
                        "Embedder unavailable; lexical ranking for the rest of the session"
                    );
                }
                None
            }
            Err(e) => {
                warn!(target: "memory_store", error = %e, "Embedding failed; using lexical ranking");
                None
            }
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(|t| t.to_lowercase())
        .collect()
}

/// Share of query tokens found in the record
fn lexical_overlap(query: &HashSet<String>, text: &str) -> f32 {
    if query.is_empty() {
        return 0.0;
    }
    let record = tokens(text);
    let hits = query.iter().filter(|t| record.contains(*t)).count();
    hits as f32 / query.len() as f32
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn insert(&self, mut record: MemoryRecord) -> Result<String, MemoryError> {
        if record.embedding.is_empty() {
            if let Some(v) = self.try_embed(&record.text).await {
                record.embedding = v;
            }
        }
        trace!(
            target: "memory_store",
            id = %record.id,
            category = %record.category,
            embedded = !record.embedding.is_empty(),
            "Storing memory"
        );
        let id = record.id.clone();
        self.records.insert(id.clone(), record);
        Ok(id)
    }

    async fn query(
        &self,
        text: &str,
        top_k: usize,
        category: Option<MemoryCategory>,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.try_embed(text).await;
        let query_tokens = tokens(text);

        let mut scored: Vec<(f32, MemoryRecord)> = self
            .records
            .iter()
            .filter(|r| category.map_or(true, |c| r.category == c))
            .filter_map(|r| {
                let record = r.value();
                match &query_embedding {
                    Some(q) if !record.embedding.is_empty() => {
                        Some((cosine_similarity(q, &record.embedding), record.clone()))
                    }
                    _ => {
                        let score = lexical_overlap(&query_tokens, &record.text);
                        (score > 0.0).then(|| (score, record.clone()))
                    }
                }
            })
            .collect();

        // newest first among equal scores
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.created_at.cmp(&a.1.created_at))
        });
        scored.truncate(top_k);

        debug!(target: "memory_store", query = %text, hits = scored.len(), "Memory query");
        Ok(scored.into_iter().map(|(_, r)| r).collect())
    }

    async fn count(&self) -> Result<usize, MemoryError> {
        Ok(self.records.len())
    }

    async fn clear(&self) -> Result<usize, MemoryError> {
        let removed = self.records.len();
        self.records.clear();
        debug!(target: "memory_store", removed, "Cleared all memories");
        Ok(removed)
    }
}

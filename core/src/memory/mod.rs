//! Long-term memory seam.
//!
//! Records are owned by the [`MemoryStore`]; the cognitive loop only issues
//! insert and query requests. [`InMemoryStore`] is the DashMap-backed
//! reference implementation.

pub mod store;

pub use store::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryError {
    #[error("Memory store unavailable: {0}")]
    Unavailable(String),

    #[error("Memory query failed: {0}")]
    QueryFailed(String),
}

/// Kind of a stored memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    Fact,
    Preference,
    Conversation,
}

impl fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemoryCategory::Fact => "fact",
            MemoryCategory::Preference => "preference",
            MemoryCategory::Conversation => "conversation",
        };
        f.write_str(s)
    }
}

/// A single long-term memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub text: String,
    pub category: MemoryCategory,

    /// Filled in by the store on insert when an embedder is reachable
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,

    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    pub fn new(text: impl Into<String>, category: MemoryCategory) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            category,
            embedding: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// A record for a user/assistant exchange
    pub fn conversation(user: &str, assistant: &str) -> Self {
        Self::new(
            format!("User: {}\nAssistant: {}", user, assistant),
            MemoryCategory::Conversation,
        )
    }
}

/// Size and availability of a store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub available: bool,
    pub total: usize,
}

#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Store a record, returning its id
    async fn insert(&self, record: MemoryRecord) -> Result<String, MemoryError>;

    /// Up to `top_k` records most similar to `text`, in descending similarity
    async fn query(
        &self,
        text: &str,
        top_k: usize,
        category: Option<MemoryCategory>,
    ) -> Result<Vec<MemoryRecord>, MemoryError>;

    /// Number of stored records
    async fn count(&self) -> Result<usize, MemoryError>;

    /// Forget every record, returning how many were removed
    async fn clear(&self) -> Result<usize, MemoryError>;
}

const PREFERENCE_MARKERS: &[&str] = &[
    "i like",
    "i love",
    "i prefer",
    "i hate",
    "i don't like",
    "i dont like",
    "i enjoy",
    "my favorite",
    "my favourite",
];

/// Preference when the utterance is phrased as a like/dislike, Fact otherwise
pub fn infer_category(text: &str) -> MemoryCategory {
    let lower = text.to_lowercase();
    if PREFERENCE_MARKERS.iter().any(|m| lower.contains(m)) {
        MemoryCategory::Preference
    } else {
        MemoryCategory::Fact
    }
}

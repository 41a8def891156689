use super::intent::IntentClassification;
use crate::llm::{ModelStatus, ModelVariant};
use crate::memory::MemoryStats;
use crate::tools::ActionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user input, consumed by exactly one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub timestamp: DateTime<Utc>,

    /// Image attachment as a URL or `data:` URI
    pub image: Option<String>,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

impl From<&str> for Utterance {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Phases of a cognitive turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Think,
    Decide,
    Remember,
    Act,
    Respond,
}

/// Everything a turn produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Text for the user
    pub response: String,

    pub classification: IntentClassification,

    /// One entry per tool call, in call order
    pub actions: Vec<ActionResult>,

    /// Phases visited, in order
    pub phases: Vec<Phase>,

    /// Model used, when the turn called one
    pub model: Option<ModelVariant>,

    /// Why the turn fell back to a degraded reply
    pub degraded: Option<String>,
}

impl TurnOutcome {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Health of the services a session depends on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeStatus {
    pub model: ModelStatus,
    pub memory: MemoryStats,

    /// Routing has fallen back to keywords for the session
    pub keyword_routing: bool,
}

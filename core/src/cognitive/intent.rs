use serde::{Deserialize, Serialize};
use std::fmt;

/// Cognitive action an utterance is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    /// Store a fact or preference
    Remember,
    /// Look something up in long-term memory
    Recall,
    /// Operate the computer through tools
    Act,
    /// Coding specialist
    Code,
    /// Vision specialist
    See,
    /// Browser and web lookups
    Web,
    /// File and media conversion
    Convert,
    /// Plain conversation
    Chat,
}

impl IntentCategory {
    /// Tie-break order: earlier wins on equal similarity
    pub const PRIORITY: [IntentCategory; 8] = [
        IntentCategory::Act,
        IntentCategory::Recall,
        IntentCategory::Remember,
        IntentCategory::Code,
        IntentCategory::See,
        IntentCategory::Web,
        IntentCategory::Convert,
        IntentCategory::Chat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::Remember => "remember",
            IntentCategory::Recall => "recall",
            IntentCategory::Act => "act",
            IntentCategory::Code => "code",
            IntentCategory::See => "see",
            IntentCategory::Web => "web",
            IntentCategory::Convert => "convert",
            IntentCategory::Chat => "chat",
        }
    }

    /// Position in [`Self::PRIORITY`]
    pub fn priority(&self) -> usize {
        Self::PRIORITY
            .iter()
            .position(|c| c == self)
            .unwrap_or(Self::PRIORITY.len())
    }

    /// Categories whose turns go through the parser and the gate
    pub fn uses_tools(&self) -> bool {
        matches!(
            self,
            IntentCategory::Act
                | IntentCategory::Code
                | IntentCategory::See
                | IntentCategory::Web
                | IntentCategory::Convert
        )
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    Embedding,
    Keyword,
}

/// Routing decision for one utterance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub category: IntentCategory,

    /// Similarity for embedding hits, 1.0 for a keyword hit, 0.0 for the
    /// conversational default
    pub confidence: f32,

    pub method: ClassificationMethod,
}

impl IntentClassification {
    pub fn embedding(category: IntentCategory, similarity: f32) -> Self {
        Self {
            category,
            confidence: similarity.clamp(0.0, 1.0),
            method: ClassificationMethod::Embedding,
        }
    }

    pub fn keyword(category: IntentCategory) -> Self {
        Self {
            category,
            confidence: 1.0,
            method: ClassificationMethod::Keyword,
        }
    }

    pub fn chat_default() -> Self {
        Self {
            category: IntentCategory::Chat,
            confidence: 0.0,
            method: ClassificationMethod::Keyword,
        }
    }
}

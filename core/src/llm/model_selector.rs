//! Single authority for choosing which model variant serves a request.

use crate::cognitive::keywords::normalize;
use crate::cognitive::IntentCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Specialist families a request can be routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Coding,
    Vision,
    Reasoning,
    General,
    System,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::Coding => "coding",
            TaskKind::Vision => "vision",
            TaskKind::Reasoning => "reasoning",
            TaskKind::General => "general",
            TaskKind::System => "system",
        };
        f.write_str(s)
    }
}

/// Hardware profile used to pick default model names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardwarePreset {
    HighVram,
    #[default]
    MediumVram,
    LowVram,
    CpuOnly,
}

impl HardwarePreset {
    pub fn model_for(&self, task: TaskKind) -> &'static str {
        use HardwarePreset::*;
        use TaskKind::*;
        match (self, task) {
            (HighVram, Coding) => "qwen2.5-coder:14b",
            (HighVram, Vision) => "llava:13b",
            (HighVram, Reasoning) => "deepseek-r1:14b",
            (HighVram, General) => "gemma3:12b",
            (HighVram, System) => "qwen2.5:7b",

            (MediumVram, Coding) => "qwen2.5-coder:7b",
            (MediumVram, Reasoning) => "deepseek-r1:8b",

            (LowVram, Coding) => "qwen2.5-coder:3b",
            (LowVram, Reasoning) => "qwen2.5:3b",

            (CpuOnly, Coding) => "qwen2.5-coder:1.5b",
            (CpuOnly, Reasoning) => "qwen2.5:1.5b",

            (_, Vision) => "moondream",
            (_, General) => "gemma3",
            (_, System) => "llama3.2",
        }
    }
}

/// The model chosen for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVariant {
    pub task: TaskKind,
    pub name: String,
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.task)
    }
}

const REASONING_KEYWORDS: &[&str] = &[
    "math",
    "calculate",
    "solve",
    "equation",
    "formula",
    "logic",
    "puzzle",
    "riddle",
    "reason",
    "why",
    "explain how",
    "step by step",
    "proof",
    "theorem",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSelectorConfig {
    pub preset: HardwarePreset,

    /// Per-task model names that replace the preset's choice
    #[serde(default)]
    pub overrides: HashMap<TaskKind, String>,
}

/// Maps intent categories onto model variants.
///
/// Every component that needs a model name asks the selector; nothing else
/// hardcodes one.
#[derive(Debug, Clone, Default)]
pub struct ModelSelector {
    config: ModelSelectorConfig,
}

impl ModelSelector {
    pub fn new(config: ModelSelectorConfig) -> Self {
        Self { config }
    }

    pub fn with_preset(preset: HardwarePreset) -> Self {
        Self::new(ModelSelectorConfig {
            preset,
            overrides: HashMap::new(),
        })
    }

    /// Replace the model used for a task
    pub fn with_override(mut self, task: TaskKind, name: impl Into<String>) -> Self {
        self.config.overrides.insert(task, name.into());
        self
    }

    pub fn variant(&self, task: TaskKind) -> ModelVariant {
        let name = self
            .config
            .overrides
            .get(&task)
            .cloned()
            .unwrap_or_else(|| self.config.preset.model_for(task).to_string());
        ModelVariant { task, name }
    }

    /// Choose the model for a routed utterance
    pub fn select(&self, category: IntentCategory, text: &str, has_image: bool) -> ModelVariant {
        let task = match category {
            IntentCategory::Code => TaskKind::Coding,
            IntentCategory::See if has_image => TaskKind::Vision,
            IntentCategory::Act | IntentCategory::Web | IntentCategory::Convert => {
                TaskKind::System
            }
            _ if has_image => TaskKind::Vision,
            _ if is_reasoning(text) => TaskKind::Reasoning,
            _ => TaskKind::General,
        };
        self.variant(task)
    }

    /// Model for the stateless fast path
    pub fn fast(&self, has_image: bool) -> ModelVariant {
        if has_image {
            self.variant(TaskKind::Vision)
        } else {
            self.variant(TaskKind::General)
        }
    }
}

/// Whole-word match, so "reasonable" does not count as "reason"
fn is_reasoning(text: &str) -> bool {
    let padded = normalize(text);
    REASONING_KEYWORDS
        .iter()
        .any(|k| padded.contains(&format!(" {} ", k)))
}

use std::fs;
use std::path::{Path, PathBuf};

use aide_core::confirm::GateConfig;
use aide_core::llm::{HardwarePreset, ModelSelectorConfig, RetryConfig, TaskKind};
use aide_core::tools::native::DEFAULT_ALLOWED_APPS;
use aide_core::{CognitiveConfig, RouterConfig};

/// High-level configuration for the terminal assistant
#[derive(Clone, Debug)]
pub struct AssistantConfig {
    pub cognitive: CognitiveConfig,
    pub router: RouterConfig,
    pub models: ModelSelectorConfig,
    pub retry: RetryConfig,
    pub gate: GateConfig,
    /// Root directory the file tools may touch
    pub workspace_root: PathBuf,
    /// Applications `open_application` may launch; empty launches nothing
    pub allowed_apps: Vec<String>,
    /// Route by keywords only, skipping the embedding service
    pub keyword_only: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        let workspace_root = std::env::var("AIDE_WORKSPACE")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let preset = std::env::var("AIDE_HARDWARE_PRESET")
            .ok()
            .and_then(|v| parse_preset(&v))
            .unwrap_or_default();

        Self {
            cognitive: CognitiveConfig::default(),
            router: RouterConfig::default(),
            models: ModelSelectorConfig {
                preset,
                ..Default::default()
            },
            retry: RetryConfig::default(),
            gate: GateConfig::default(),
            workspace_root,
            allowed_apps: DEFAULT_ALLOWED_APPS.iter().map(|a| a.to_string()).collect(),
            keyword_only: std::env::var("AIDE_KEYWORD_ONLY")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

fn parse_preset(v: &str) -> Option<HardwarePreset> {
    match v.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "high_vram" => Some(HardwarePreset::HighVram),
        "medium_vram" => Some(HardwarePreset::MediumVram),
        "low_vram" => Some(HardwarePreset::LowVram),
        "cpu_only" | "cpu" => Some(HardwarePreset::CpuOnly),
        _ => None,
    }
}

impl AssistantConfig {
    /// Load configuration from a TOML file (path via AIDE_CONFIG or ./aide.toml),
    /// overlaying values onto defaults and env-driven defaults.
    pub fn load() -> Self {
        let default = Self::default();
        let path = std::env::var("AIDE_CONFIG").unwrap_or_else(|_| "aide.toml".into());
        let p = Path::new(&path);
        if !p.exists() {
            tracing::info!(target: "aide_assistant", path = %path, "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match Self::from_toml_str(&s, default.clone()) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!(target: "aide_assistant", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target: "aide_assistant", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }

    fn from_toml_str(s: &str, base: Self) -> Result<Self, toml::de::Error> {
        toml::from_str::<AssistantToml>(s).map(|t| t.overlay(base))
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct AssistantToml {
    pub workspace_root: Option<PathBuf>,
    pub allowed_apps: Option<Vec<String>>,
    pub keyword_only: Option<bool>,
    pub cognitive: Option<CognitiveToml>,
    pub router: Option<RouterToml>,
    pub models: Option<ModelsToml>,
    pub llm: Option<LlmToml>,
    pub confirmation: Option<ConfirmationToml>,
}

impl AssistantToml {
    fn overlay(self, mut base: AssistantConfig) -> AssistantConfig {
        if let Some(x) = self.workspace_root {
            base.workspace_root = x;
        }
        if let Some(x) = self.allowed_apps {
            base.allowed_apps = x;
        }
        if let Some(x) = self.keyword_only {
            base.keyword_only = x;
        }
        if let Some(c) = self.cognitive {
            c.apply(&mut base.cognitive);
        }
        if let Some(r) = self.router {
            r.apply(&mut base.router);
        }
        if let Some(m) = self.models {
            m.apply(&mut base.models);
        }
        if let Some(l) = self.llm {
            l.apply(&mut base.retry);
        }
        if let Some(c) = self.confirmation {
            c.apply(&mut base.gate);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct CognitiveToml {
    pub context_capacity: Option<usize>,
    pub recall_top_k: Option<usize>,
    pub remember_conversations: Option<bool>,
    pub persona: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}
impl CognitiveToml {
    fn apply(self, c: &mut CognitiveConfig) {
        if let Some(x) = self.context_capacity {
            c.context_capacity = x;
        }
        if let Some(x) = self.recall_top_k {
            c.recall_top_k = x;
        }
        if let Some(x) = self.remember_conversations {
            c.remember_conversations = x;
        }
        if let Some(x) = self.persona {
            c.persona = x;
        }
        if let Some(x) = self.temperature {
            c.temperature = x;
        }
        if let Some(x) = self.max_output_tokens {
            c.max_output_tokens = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct RouterToml {
    pub threshold: Option<f32>,
}
impl RouterToml {
    fn apply(self, r: &mut RouterConfig) {
        if let Some(x) = self.threshold {
            r.threshold = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct ModelsToml {
    pub preset: Option<String>,
    pub coding: Option<String>,
    pub vision: Option<String>,
    pub reasoning: Option<String>,
    pub general: Option<String>,
    pub system: Option<String>,
}
impl ModelsToml {
    fn apply(self, m: &mut ModelSelectorConfig) {
        if let Some(p) = self.preset.as_deref().and_then(parse_preset) {
            m.preset = p;
        }
        let overrides = [
            (TaskKind::Coding, self.coding),
            (TaskKind::Vision, self.vision),
            (TaskKind::Reasoning, self.reasoning),
            (TaskKind::General, self.general),
            (TaskKind::System, self.system),
        ];
        for (task, name) in overrides {
            if let Some(name) = name.filter(|n| !n.is_empty()) {
                m.overrides.insert(task, name);
            }
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct LlmToml {
    pub max_retries: Option<u32>,
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}
impl LlmToml {
    fn apply(self, r: &mut RetryConfig) {
        if let Some(x) = self.max_retries {
            r.max_retries = x;
        }
        if let Some(x) = self.initial_delay_ms {
            r.initial_delay_ms = x;
        }
        if let Some(x) = self.max_delay_ms {
            r.max_delay_ms = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct ConfirmationToml {
    pub timeout_ms: Option<u64>,
}
impl ConfirmationToml {
    fn apply(self, g: &mut GateConfig) {
        if let Some(x) = self.timeout_ms {
            g.timeout_ms = x;
        }
    }
}

use super::error::LlmError;
use super::message::{ChatMessage, Role};
use super::model_selector::{ModelVariant, TaskKind};
use crate::tools::{Arguments, ToolCall};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Per-request generation options
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub model: ModelVariant,

    /// Most recent non-system messages to send; 0 sends everything
    pub max_context_turns: usize,

    /// Image attachment as a URL or `data:` URI
    pub image: Option<String>,

    pub temperature: f32,
    pub max_output_tokens: u32,

    /// Function schemas offered for native tool calling
    pub tools: Vec<Value>,
}

impl CompletionOptions {
    pub fn new(model: ModelVariant) -> Self {
        Self {
            model,
            max_context_turns: 0,
            image: None,
            temperature: 0.7,
            max_output_tokens: 1024,
            tools: Vec::new(),
        }
    }
}

/// Text of a completion plus any tool calls the service returned natively
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,

    #[serde(default)]
    pub structured_calls: Vec<ToolCall>,

    pub model: Option<String>,
}

impl Completion {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Reachability of the model service and the models it serves
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub available: bool,
    pub models: Vec<String>,
}

impl ModelStatus {
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// Language-model service
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError>;

    /// Check the service; never fails, an unreachable service is reported
    /// as unavailable
    async fn status(&self) -> ModelStatus;
}

/// Upper bound for the status check
const STATUS_TIMEOUT_MS: u64 = 5_000;

/// Configuration for LlmClient loaded from environment variables
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub base_url: String, // e.g., http://localhost:11434/v1
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("AIDE_LLM_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "http://localhost:11434/v1".to_string()),
            api_key: std::env::var("AIDE_LLM_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            request_timeout_ms: std::env::var("AIDE_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60_000),
        }
    }
}

/// HTTP client for OpenAI-compatible Chat Completions backends
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    cfg: LlmClientConfig,
}

impl LlmClient {
    pub fn new(cfg: LlmClientConfig) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| LlmError::Unreachable(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, cfg })
    }

    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(LlmClientConfig::default())
    }

    pub fn config(&self) -> &LlmClientConfig {
        &self.cfg
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.cfg.base_url.trim_end_matches('/')
        );
        debug!(target: "llm_client", url = %url, model = %options.model, "POST via Chat Completions");

        let mut body = json!({
            "model": options.model.name,
            "messages": build_messages(messages, options),
            "max_tokens": options.max_output_tokens,
            "temperature": options.temperature,
        });
        if !options.tools.is_empty() {
            body["tools"] = Value::Array(options.tools.clone());
        }

        let mut req = self
            .http
            .post(&url)
            .header("content-type", "application/json");
        if let Some(key) = &self.cfg.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                warn!(target: "llm_client", "Chat Completions request timed out");
                LlmError::Timeout
            } else {
                warn!(target: "llm_client", error = %e, "Chat Completions request failed");
                LlmError::Unreachable(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!(target: "llm_client", %status, body = %text, "Chat Completions error");
            return Err(classify_status(status, text));
        }

        let val: Value = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::MalformedResponse(format!("Failed to parse Chat Completions JSON: {e}"))
            }
        })?;

        let structured_calls = parse_native_tool_calls(&val);
        let text = extract_text_from_chat_completions(&val);
        if text.is_none() && structured_calls.is_empty() {
            return Err(LlmError::MalformedResponse(
                "Missing choices[0].message.content in chat completions".into(),
            ));
        }

        Ok(Completion {
            text: text.unwrap_or_default(),
            structured_calls,
            model: val
                .get("model")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        })
    }

    async fn status(&self) -> ModelStatus {
        let url = format!("{}/models", self.cfg.base_url.trim_end_matches('/'));
        let mut req = self
            .http
            .get(&url)
            .timeout(Duration::from_millis(STATUS_TIMEOUT_MS.min(self.cfg.request_timeout_ms)));
        if let Some(key) = &self.cfg.api_key {
            req = req.bearer_auth(key);
        }

        match req.send().await {
            Ok(resp) if resp.status().is_success() => {
                let models = resp
                    .json::<Value>()
                    .await
                    .map(|v| model_names(&v))
                    .unwrap_or_default();
                debug!(target: "llm_client", models = models.len(), "Model service reachable");
                ModelStatus {
                    available: true,
                    models,
                }
            }
            Ok(resp) => {
                warn!(target: "llm_client", status = %resp.status(), "Model service status check failed");
                ModelStatus::unavailable()
            }
            Err(e) => {
                warn!(target: "llm_client", error = %e, "Model service unreachable");
                ModelStatus::unavailable()
            }
        }
    }
}

/// Model ids from an OpenAI `/models` list or an Ollama `/api/tags` listing
fn model_names(v: &Value) -> Vec<String> {
    let (list, key) = match (v.get("data"), v.get("models")) {
        (Some(Value::Array(items)), _) => (items, "id"),
        (_, Some(Value::Array(items))) => (items, "name"),
        _ => return Vec::new(),
    };
    list.iter()
        .filter_map(|m| m.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

fn classify_status(status: StatusCode, body: String) -> LlmError {
    if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        LlmError::Timeout
    } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        LlmError::Unreachable(format!("status={} body={}", status, body))
    } else {
        LlmError::Rejected {
            status: status.as_u16(),
            body,
        }
    }
}

/// Chat Completions payload: keeps system messages, trims the rest to the
/// configured window and attaches the image to the last user message.
fn build_messages(messages: &[ChatMessage], options: &CompletionOptions) -> Vec<Value> {
    let (system, rest): (Vec<&ChatMessage>, Vec<&ChatMessage>) =
        messages.iter().partition(|m| m.role == Role::System);
    let skip = if options.max_context_turns > 0 {
        rest.len().saturating_sub(options.max_context_turns)
    } else {
        0
    };
    let window: Vec<&ChatMessage> = system
        .into_iter()
        .chain(rest.into_iter().skip(skip))
        .collect();

    let last_user = window.iter().rposition(|m| m.role == Role::User);

    window
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let (role, content) = match m.role {
                Role::System => ("system", m.content.clone()),
                Role::User => ("user", m.content.clone()),
                Role::Assistant => ("assistant", m.content.clone()),
                // no tool_call_id to pair with, so tool output travels as user text
                Role::Tool => ("user", format!("Tool result:\n{}", m.content)),
            };
            match (&options.image, Some(i) == last_user) {
                (Some(image), true) => json!({
                    "role": role,
                    "content": [
                        { "type": "text", "text": content },
                        { "type": "image_url", "image_url": { "url": image } }
                    ]
                }),
                _ => json!({ "role": role, "content": content }),
            }
        })
        .collect()
}

fn extract_text_from_chat_completions(v: &Value) -> Option<String> {
    v.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.to_string())
}

/// `choices[0].message.tool_calls[*].function` as ToolCalls
pub(crate) fn parse_native_tool_calls(v: &Value) -> Vec<ToolCall> {
    let Some(tc_arr) = v
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|first| first.get("message"))
        .and_then(|m| m.get("tool_calls"))
        .and_then(|x| x.as_array())
    else {
        return Vec::new();
    };

    tc_arr
        .iter()
        .filter_map(|tc| {
            let func = tc.get("function")?;
            let name = func.get("name").and_then(|n| n.as_str())?;
            if name.is_empty() {
                return None;
            }
            let args = match func.get("arguments") {
                Some(Value::String(s)) => serde_json::from_str::<Value>(s).unwrap_or(json!({})),
                Some(v) => v.clone(),
                None => json!({}),
            };
            let arguments = match args {
                Value::Object(map) => map,
                _ => Arguments::new(),
            };
            Some(ToolCall::new(name, arguments).with_source(func.to_string()))
        })
        .collect()
}

/// Function-calling schema for a tool, as sent in `tools`
pub fn function_schema(name: &str, description: &str, parameters: &Value) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": parameters
        }
    })
}

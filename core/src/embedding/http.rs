use super::{validate_embedding, Embedder, EmbeddingError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Wire dialect of the embedding endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingApi {
    /// `POST {base}/api/embeddings` with `{model, prompt}` → `{embedding}`
    Ollama,
    /// `POST {base}/embeddings` with `{model, input}` → `{data: [{embedding}]}`
    OpenAi,
}

impl EmbeddingApi {
    fn from_env_value(v: &str) -> Option<Self> {
        match v.trim().to_ascii_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" | "open_ai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

/// Configuration for HttpEmbedder loaded from environment variables
#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    pub base_url: String, // e.g., http://localhost:11434
    pub model: String,
    pub api: EmbeddingApi,
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for HttpEmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("AIDE_EMBED_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
            model: std::env::var("AIDE_EMBED_MODEL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "nomic-embed-text".to_string()),
            api: std::env::var("AIDE_EMBED_API")
                .ok()
                .and_then(|v| EmbeddingApi::from_env_value(&v))
                .unwrap_or(EmbeddingApi::Ollama),
            api_key: std::env::var("AIDE_LLM_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            request_timeout_ms: std::env::var("AIDE_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10_000),
        }
    }
}

/// Embedding client for Ollama or OpenAI-compatible servers
#[derive(Clone)]
pub struct HttpEmbedder {
    http: Client,
    cfg: HttpEmbedderConfig,
}

impl HttpEmbedder {
    pub fn new(cfg: HttpEmbedderConfig) -> Result<Self, EmbeddingError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| {
                EmbeddingError::ServiceUnavailable(format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self { http, cfg })
    }

    pub fn from_env() -> Result<Self, EmbeddingError> {
        Self::new(HttpEmbedderConfig::default())
    }

    pub fn config(&self) -> &HttpEmbedderConfig {
        &self.cfg
    }

    fn request(&self, text: &str) -> (String, Value) {
        let base = self.cfg.base_url.trim_end_matches('/');
        match self.cfg.api {
            EmbeddingApi::Ollama => (
                format!("{}/api/embeddings", base),
                json!({ "model": self.cfg.model, "prompt": text }),
            ),
            EmbeddingApi::OpenAi => (
                format!("{}/embeddings", base),
                json!({ "model": self.cfg.model, "input": text }),
            ),
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let (url, body) = self.request(text);
        debug!(target: "embedding", url = %url, chars = text.len(), "Requesting embedding");

        let mut req = self.http.post(&url).json(&body);
        if let Some(key) = &self.cfg.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| {
            warn!(target: "embedding", error = %e, "Embedding request failed");
            EmbeddingError::ServiceUnavailable(e.to_string())
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            warn!(target: "embedding", %status, body = %text, "Embedding endpoint error");
            return Err(EmbeddingError::ServiceUnavailable(format!(
                "status={} body={}",
                status, text
            )));
        }

        let val: Value = resp
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;
        let vector = extract_embedding(&val, self.cfg.api).ok_or_else(|| {
            EmbeddingError::MalformedResponse("missing embedding field".to_string())
        })?;
        validate_embedding(&vector, None)?;
        Ok(vector)
    }
}

fn extract_embedding(v: &Value, api: EmbeddingApi) -> Option<Vec<f32>> {
    let arr = match api {
        EmbeddingApi::Ollama => v.get("embedding")?,
        EmbeddingApi::OpenAi => v.get("data")?.get(0)?.get("embedding")?,
    }
    .as_array()?;
    arr.iter().map(|x| x.as_f64().map(|f| f as f32)).collect()
}

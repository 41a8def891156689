use super::client::{Completion, CompletionOptions, LanguageModel, ModelStatus};
use super::error::LlmError;
use super::message::ChatMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Bounded exponential backoff; `max_retries = 0` disables retrying
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let ms = if base.is_finite() { base as u64 } else { u64::MAX };
        Duration::from_millis(ms.min(self.max_delay_ms))
    }
}

/// Wraps a model and retries transient failures of completion generation
pub struct RetryingModel<M: LanguageModel> {
    inner: M,
    config: RetryConfig,
}

impl<M: LanguageModel> RetryingModel<M> {
    pub fn new(inner: M, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

#[async_trait]
impl<M: LanguageModel> LanguageModel for RetryingModel<M> {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(messages, options).await {
                Ok(completion) => return Ok(completion),
                Err(e) if attempt < self.config.max_retries && e.is_transient() => {
                    let delay = self.config.delay_for(attempt);
                    warn!(
                        target: "llm_client",
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying completion"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn status(&self) -> ModelStatus {
        self.inner.status().await
    }
}

use super::policy::SensitivityPolicy;
use crate::tools::ToolCall;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The user's answer to a confirmation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationResponse {
    Approved,
    Denied,
}

/// Asks the user whether a sensitive call may run.
///
/// Implementations return `Approved` only for an explicit affirmative.
#[async_trait]
pub trait ConfirmationCallback: Send + Sync {
    async fn confirm(&self, call: &ToolCall) -> ConfirmationResponse;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// The user answered with anything but an affirmative
    Declined,
    /// No answer before the deadline
    Timeout,
    /// Sensitive call with no way to ask
    NoCallback,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DenialReason::Declined => "declined by user",
            DenialReason::Timeout => "confirmation timed out",
            DenialReason::NoCallback => "no confirmation channel available",
        };
        f.write_str(s)
    }
}

/// A sensitive call waiting for the user's answer
pub struct PendingConfirmation {
    call: ToolCall,
    callback: Arc<dyn ConfirmationCallback>,
    timeout: Duration,
}

impl fmt::Debug for PendingConfirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingConfirmation")
            .field("call", &self.call.name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PendingConfirmation {
    pub fn call(&self) -> &ToolCall {
        &self.call
    }

    /// Ask the callback, bounded by the gate timeout
    pub async fn resolve(self) -> Authorization {
        match tokio::time::timeout(self.timeout, self.callback.confirm(&self.call)).await {
            Ok(ConfirmationResponse::Approved) => {
                info!(target: "confirmation", tool = %self.call.name, "Confirmed by user");
                Authorization::Approved
            }
            Ok(ConfirmationResponse::Denied) => {
                info!(target: "confirmation", tool = %self.call.name, "Declined by user");
                Authorization::Denied(DenialReason::Declined)
            }
            Err(_) => {
                warn!(
                    target: "confirmation",
                    tool = %self.call.name,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Confirmation timed out"
                );
                Authorization::Denied(DenialReason::Timeout)
            }
        }
    }
}

#[derive(Debug)]
pub enum Authorization {
    Approved,
    Denied(DenialReason),
    Pending(PendingConfirmation),
}

impl Authorization {
    pub fn is_approved(&self) -> bool {
        matches!(self, Authorization::Approved)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// How long to wait for the user before denying
    pub timeout_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

/// Checks every tool call before dispatch.
///
/// Safe calls pass straight through. Sensitive calls become
/// [`Authorization::Pending`] and are approved only by the callback.
pub struct ConfirmationGate {
    policy: SensitivityPolicy,
    callback: Option<Arc<dyn ConfirmationCallback>>,
    config: GateConfig,
}

impl ConfirmationGate {
    pub fn new(policy: SensitivityPolicy, config: GateConfig) -> Self {
        Self {
            policy,
            callback: None,
            config,
        }
    }

    pub fn with_callback(mut self, callback: Arc<dyn ConfirmationCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn policy(&self) -> &SensitivityPolicy {
        &self.policy
    }

    pub fn is_sensitive(&self, call: &ToolCall) -> bool {
        self.policy.is_sensitive(&call.name)
    }

    /// Classify a call without waiting on the user
    pub fn authorize(&self, call: &ToolCall) -> Authorization {
        if !self.is_sensitive(call) {
            debug!(target: "confirmation", tool = %call.name, "Safe tool; approved");
            return Authorization::Approved;
        }
        match &self.callback {
            Some(callback) => {
                info!(target: "confirmation", tool = %call.name, "Sensitive tool; awaiting confirmation");
                Authorization::Pending(PendingConfirmation {
                    call: call.clone(),
                    callback: Arc::clone(callback),
                    timeout: Duration::from_millis(self.config.timeout_ms),
                })
            }
            None => {
                warn!(target: "confirmation", tool = %call.name, "Sensitive tool with no confirmation callback");
                Authorization::Denied(DenialReason::NoCallback)
            }
        }
    }

    /// Classify and, for sensitive calls, wait for the answer.
    /// Never returns `Pending`.
    pub async fn authorize_and_wait(&self, call: &ToolCall) -> Authorization {
        match self.authorize(call) {
            Authorization::Pending(pending) => pending.resolve().await,
            resolved => resolved,
        }
    }
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new(SensitivityPolicy::default(), GateConfig::default())
    }
}

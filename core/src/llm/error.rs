use thiserror::Error;

/// Failures of a language-model call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Language model timed out")]
    Timeout,

    #[error("Language model unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed language model response: {0}")]
    MalformedResponse(String),

    #[error("Language model rejected the request: status={status} body={body}")]
    Rejected { status: u16, body: String },
}

impl LlmError {
    /// Timeouts and connectivity failures may succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Timeout | LlmError::Unreachable(_))
    }

    /// Short plain-language description for user-facing replies
    pub fn user_message(&self) -> &'static str {
        match self {
            LlmError::Timeout => "the language model took too long to answer",
            LlmError::Unreachable(_) => "I couldn't reach the language model",
            LlmError::MalformedResponse(_) => "the language model sent a reply I couldn't read",
            LlmError::Rejected { .. } => "the language model refused the request",
        }
    }
}

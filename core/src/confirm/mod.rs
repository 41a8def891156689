//! Confirmation gate between parsed tool calls and the dispatcher.
//!
//! ```text
//! ToolCall ──► SensitivityPolicy ──safe──────────────► Approved
//!                     │
//!                 sensitive ──► ConfirmationCallback ──yes──► Approved
//!                                       │
//!                              no / timeout / dropped ──► Denied
//! ```

mod channel;
mod gate;
mod policy;

pub use channel::{is_affirmative, ChannelConfirmer, ConfirmationRequest};
pub use gate::{
    Authorization, ConfirmationCallback, ConfirmationGate, ConfirmationResponse, DenialReason,
    GateConfig, PendingConfirmation,
};
pub use policy::{SensitivityPolicy, DEFAULT_SENSITIVE_PATTERNS};

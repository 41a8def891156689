//! Cognitive runtime: intent routing and the per-session loop
//!
//! ```text
//! Utterance ─► IntentRouter ─► CognitiveLoop
//!                                 │
//!        REMEMBER / RECALL ◄──────┼──────► ACT / CODE / SEE / WEB / CONVERT
//!              │                  │                 │
//!         MemoryStore            CHAT        LanguageModel ─► ResponseParser
//!                                 │                 │
//!                           LanguageModel    ConfirmationGate ─► ToolDispatcher
//! ```
//!
//! A [`Session`] serializes turns for one conversation; [`FastThinker`]
//! answers one-off questions without touching session state.

mod cognitive_loop;
mod config;
mod context;
mod fast_think;
mod intent;
pub mod keywords;
mod router;
mod session;
mod turn;

pub use cognitive_loop::CognitiveLoop;
pub use config::CognitiveConfig;
pub use context::{ConversationContext, Turn};
pub use fast_think::FastThinker;
pub use intent::{ClassificationMethod, IntentCategory, IntentClassification};
pub use keywords::KeywordTable;
pub use router::{IntentRouter, Prototypes, RouterConfig};
pub use session::{Session, SessionHandle};
pub use turn::{Phase, RuntimeStatus, TurnOutcome, Utterance};

//! Bounded conversation history.

use crate::llm::{ChatMessage, Role};
use std::collections::VecDeque;

/// One conversation turn
pub type Turn = ChatMessage;

/// Ordered conversation turns, bounded to a fixed capacity.
///
/// When a push exceeds the capacity the oldest non-system turn is dropped,
/// so the system prompt survives pruning. The newest turn is never the one
/// dropped; if only system turns remain as candidates the oldest of those
/// goes instead.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    capacity: usize,
    turns: VecDeque<Turn>,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(20)
    }
}

impl ConversationContext {
    /// Create a context holding at most `capacity` turns (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            turns: VecDeque::with_capacity(capacity),
        }
    }

    pub fn with_system_prompt(capacity: usize, prompt: impl Into<String>) -> Self {
        let mut ctx = Self::new(capacity);
        ctx.set_system_prompt(prompt);
        ctx
    }

    /// Replace the leading system turn, or insert one
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        let turn = ChatMessage::system(prompt);
        match self.turns.front_mut() {
            Some(first) if first.role == Role::System => *first = turn,
            _ => {
                self.turns.push_front(turn);
                self.prune();
            }
        }
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.turns
            .front()
            .filter(|t| t.role == Role::System)
            .map(|t| t.content.as_str())
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        self.prune();
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }

    pub fn push_tool(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::tool(content));
    }

    fn prune(&mut self) {
        while self.turns.len() > self.capacity {
            let newest = self.turns.len() - 1;
            let victim = self
                .turns
                .iter()
                .enumerate()
                .position(|(i, t)| i != newest && t.role != Role::System)
                .unwrap_or(0);
            self.turns.remove(victim);
        }
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Owned copy of the turns, oldest first
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.back()
    }

    /// Drop every turn except the system prompt
    pub fn clear(&mut self) {
        self.turns.retain(|t| t.role == Role::System);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render as `Role: content` lines
    pub fn to_context_string(&self) -> String {
        self.turns
            .iter()
            .map(|t| {
                let prefix = match t.role {
                    Role::System => "System",
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                    Role::Tool => "Tool",
                };
                format!("{}: {}", prefix, t.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

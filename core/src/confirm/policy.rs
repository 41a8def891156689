use crate::tools::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Name segments that mark a tool as sensitive
pub const DEFAULT_SENSITIVE_PATTERNS: &[&str] = &[
    "delete",
    "remove",
    "uninstall",
    "format",
    "send",
    "purchase",
    "buy",
    "pay",
    "transfer",
    "call",
    "shutdown",
    "kill",
];

/// Static classification of tools as safe or sensitive.
///
/// A tool is sensitive when its name is listed explicitly, or when one of
/// its name segments (split on `_`, `-`, `.`, `:`) equals a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityPolicy {
    #[serde(default)]
    names: BTreeSet<String>,
    #[serde(default)]
    patterns: BTreeSet<String>,
}

impl Default for SensitivityPolicy {
    fn default() -> Self {
        Self {
            names: BTreeSet::new(),
            patterns: DEFAULT_SENSITIVE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl SensitivityPolicy {
    /// Policy that treats nothing as sensitive
    pub fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
            patterns: BTreeSet::new(),
        }
    }

    /// Default patterns plus every tool the registry tags as sensitive
    pub fn from_registry(registry: &ToolRegistry) -> Self {
        registry
            .sensitive_tools()
            .into_iter()
            .fold(Self::default(), |policy, name| policy.with_name(name))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.patterns.insert(pattern.into().to_lowercase());
        self
    }

    pub fn is_sensitive(&self, tool_name: &str) -> bool {
        if self.names.contains(tool_name) {
            return true;
        }
        let lower = tool_name.to_lowercase();
        lower
            .split(|c: char| c == '_' || c == '-' || c == '.' || c == ':')
            .any(|segment| self.patterns.contains(segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_match_patterns() {
        let policy = SensitivityPolicy::default();
        assert!(policy.is_sensitive("delete_file"));
        assert!(policy.is_sensitive("fs:remove"));
        assert!(policy.is_sensitive("Uninstall-App"));
        assert!(!policy.is_sensitive("open_app"));
        assert!(!policy.is_sensitive("recall_memory"));
        assert!(!policy.is_sensitive("formatting_help"));
    }

    #[test]
    fn explicit_names_are_sensitive() {
        let policy = SensitivityPolicy::empty().with_name("close_application");
        assert!(policy.is_sensitive("close_application"));
        assert!(!policy.is_sensitive("delete_file"));
    }
}

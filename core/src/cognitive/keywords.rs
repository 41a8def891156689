//! Ordered keyword table used when embeddings are unavailable or inconclusive.

use super::intent::IntentCategory;

/// `(category, trigger phrases)` in match order; the first hit wins
pub const DEFAULT_KEYWORDS: &[(IntentCategory, &[&str])] = &[
    (
        IntentCategory::Remember,
        &[
            "my name is",
            "i am",
            "remember that",
            "remember this",
            "my favorite",
            "my favourite",
            "i like",
            "i prefer",
            "my project is",
            "my id is",
            "i work",
            "my email",
            "my number",
            "save this",
            "note that",
            "keep in mind",
        ],
    ),
    (
        IntentCategory::Recall,
        &[
            "what is my",
            "what's my",
            "whats my",
            "do you remember",
            "what did i",
            "my name",
            "my project",
            "what was",
            "tell me about my",
            "remind me",
        ],
    ),
    (
        IntentCategory::See,
        &[
            "look at",
            "on my screen",
            "on screen",
            "screenshot",
            "this image",
            "this picture",
            "this photo",
            "what do you see",
        ],
    ),
    (
        IntentCategory::Web,
        &[
            "search the web",
            "search online",
            "google",
            "browse to",
            "go to website",
            "open website",
            "look up online",
        ],
    ),
    (
        IntentCategory::Convert,
        &["convert", "to pdf", "extract text", "export slides"],
    ),
    (
        IntentCategory::Act,
        &[
            "open", "close", "run", "start", "launch", "folder", "folders", "file", "files",
            "app", "application", "process", "delete", "remove", "list", "create",
        ],
    ),
    (
        IntentCategory::Code,
        &[
            "code",
            "program",
            "script",
            "function",
            "debug",
            "python",
            "javascript",
            "java",
            "rust",
            "fix bug",
            "write",
        ],
    ),
];

/// Lowercase alphanumeric tokens joined by single spaces, padded at both
/// ends so phrases match on word boundaries.
pub(crate) fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    for token in text
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
    {
        out.push_str(token);
        out.push(' ');
    }
    out
}

/// Keyword table with phrases pre-normalized
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<(IntentCategory, Vec<String>)>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_KEYWORDS
                .iter()
                .map(|(c, phrases)| (*c, phrases.iter().map(|p| p.to_string()).collect())),
        )
    }
}

impl KeywordTable {
    pub fn new(entries: impl IntoIterator<Item = (IntentCategory, Vec<String>)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(category, phrases)| {
                    let phrases = phrases
                        .iter()
                        .map(|p| normalize(p))
                        .filter(|p| !p.trim().is_empty())
                        .collect();
                    (category, phrases)
                })
                .collect(),
        }
    }

    /// First category with a phrase present in `text`
    pub fn classify(&self, text: &str) -> Option<IntentCategory> {
        let haystack = normalize(text);
        self.entries
            .iter()
            .find(|(_, phrases)| phrases.iter().any(|p| haystack.contains(p.as_str())))
            .map(|(category, _)| *category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrases_match_on_word_boundaries() {
        let table = KeywordTable::default();
        // "i am" must not fire inside "miami"
        assert_eq!(table.classify("fly to miami"), None);
        assert_eq!(table.classify("I am a Rust developer"), Some(IntentCategory::Remember));
    }

    #[test]
    fn earlier_entries_win() {
        let table = KeywordTable::default();
        // contains both "remember that" and "file"
        assert_eq!(
            table.classify("remember that the file is on the desktop"),
            Some(IntentCategory::Remember)
        );
        assert_eq!(table.classify("Open notepad"), Some(IntentCategory::Act));
        assert_eq!(table.classify("Delete all my files"), Some(IntentCategory::Act));
        assert_eq!(table.classify("What's my project called?"), Some(IntentCategory::Recall));
        assert_eq!(table.classify("how are you today"), None);
    }
}

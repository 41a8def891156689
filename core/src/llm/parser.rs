//! Extraction of tool calls from model completions.
//!
//! Two passes:
//!
//! 1. **Strict**: the completion holds exactly one fenced ```` ```json ```` block,
//!    or is itself a single JSON object, in one of the accepted shapes.
//! 2. **Fallback**: scans the text in order for brace-balanced JSON objects
//!    (salvaging broken ones key by key) and `TOOL_CALL: name(k="v")` lines.
//!    If that finds nothing, `known_tool(...)` mentions of registered tools
//!    are accepted.
//!
//! Accepted object shapes:
//!
//! ```text
//! {"tool": "open_application", "args": {"app_name": "notepad"}}
//! {"name": "...", "arguments" | "input" | "parameters": {...}}
//! {"action": "...", "arguments": {...}}
//! {"tools": [{"name": "...", "args": {...}}, ...]}
//! {"tool_calls": [{"function": {"name": "...", "arguments": "{...}"}}, ...]}
//! ```
//!
//! Parsing never fails; the worst case is an empty call list.

use crate::tools::{Arguments, ToolCall, ToolSignature};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```json\s*(.*?)```").expect("valid regex"));

/// Argument list of `name(...)`; quoted values may contain parentheses
const ARG_LIST: &str = r#"\(((?:"[^"]*"|'[^']*'|[^)"'])*)\)"#;

static TOOL_CALL_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"TOOL_CALL:\s*(\w+)\s*{}", ARG_LIST)).expect("valid regex")
});

static NAMED_ARG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\w+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^,\s)"']+))"#).expect("valid regex")
});

static SALVAGE_TOOL_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(?:tool|action)"\s*:\s*"([^"\\]+)""#).expect("valid regex"));

static SALVAGE_NAME_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""name"\s*:\s*"([^"\\]+)""#).expect("valid regex"));

static SALVAGE_ARG_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:args|arguments|input|parameters)"\s*:"#).expect("valid regex")
});

static SALVAGE_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(\w+)"\s*:\s*(?:"((?:[^"\\]|\\.)*)"|(-?\d+(?:\.\d+)?|true|false|null))"#)
        .expect("valid regex")
});

/// Keys that name a tool on their own
const TOOL_KEYS: &[&str] = &["tool", "action"];
const ARG_KEYS: &[&str] = &["args", "arguments", "input", "parameters"];
const RESERVED_KEYS: &[&str] = &[
    "tool",
    "action",
    "args",
    "arguments",
    "input",
    "parameters",
    "response",
    "tools",
    "tool_calls",
    "id",
    "type",
];

/// Which pass produced the calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    Structured,
    Pattern,
    None,
}

/// Calls found in a completion and the text meant for the user
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCompletion {
    pub calls: Vec<ToolCall>,
    pub strategy: ParseStrategy,
    pub spoken: String,
}

#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    tools: Vec<ToolSignature>,
    loose: Option<Regex>,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser aware of registered tools, enabling loose matches and
    /// positional argument mapping
    pub fn with_tools(tools: Vec<ToolSignature>) -> Self {
        let loose = if tools.is_empty() {
            None
        } else {
            let alternatives = tools
                .iter()
                .map(|t| regex::escape(&t.name))
                .collect::<Vec<_>>()
                .join("|");
            match Regex::new(&format!(r"\b({})\s*{}", alternatives, ARG_LIST)) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(target: "response_parser", error = %e, "Could not build loose tool pattern");
                    None
                }
            }
        };
        Self { tools, loose }
    }

    pub fn tools(&self) -> &[ToolSignature] {
        &self.tools
    }

    /// Tool calls in the completion, in textual order
    pub fn parse(&self, completion: &str) -> Vec<ToolCall> {
        self.parse_detailed(completion).calls
    }

    pub fn parse_detailed(&self, completion: &str) -> ParsedCompletion {
        if let Some(parsed) = self.parse_strict(completion) {
            debug!(target: "response_parser", calls = parsed.calls.len(), "Structured parse");
            return parsed;
        }
        let parsed = self.parse_fallback(completion);
        debug!(
            target: "response_parser",
            calls = parsed.calls.len(),
            strategy = ?parsed.strategy,
            "Fallback parse"
        );
        parsed
    }

    fn parse_strict(&self, text: &str) -> Option<ParsedCompletion> {
        let fenced: Vec<_> = FENCED_JSON.captures_iter(text).collect();
        let (value, span, raw) = if fenced.len() == 1 {
            let whole = fenced[0].get(0)?;
            let body = fenced[0].get(1)?.as_str().trim();
            let value = serde_json::from_str::<Value>(body).ok()?;
            (value, (whole.start(), whole.end()), body)
        } else if fenced.is_empty() {
            let trimmed = text.trim();
            if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
                return None;
            }
            let value = serde_json::from_str::<Value>(trimmed).ok()?;
            (value, (0, text.len()), trimmed)
        } else {
            return None;
        };

        let object = value.as_object()?;
        let calls = self.calls_from_value(&value, raw);
        let response = object.get("response").and_then(Value::as_str);
        if calls.is_empty() && response.is_none() {
            return None;
        }

        let spoken = match response {
            Some(r) => r.trim().to_string(),
            None => remove_spans(text, &[span]),
        };
        Some(ParsedCompletion {
            calls,
            strategy: ParseStrategy::Structured,
            spoken,
        })
    }

    fn parse_fallback(&self, text: &str) -> ParsedCompletion {
        let mut found: Vec<(usize, Vec<ToolCall>)> = Vec::new();
        let mut consumed: Vec<(usize, usize)> = Vec::new();
        let mut response: Option<String> = None;

        let spans = json_spans(text);
        for &(start, end) in &spans {
            let raw = &text[start..end];
            let calls = match serde_json::from_str::<Value>(raw) {
                Ok(value) => {
                    if response.is_none() {
                        response = value
                            .get("response")
                            .and_then(Value::as_str)
                            .map(|s| s.trim().to_string());
                    }
                    self.calls_from_value(&value, raw)
                }
                Err(_) => self.salvage(raw),
            };
            if !calls.is_empty() {
                consumed.push((start, end));
                found.push((start, calls));
            }
        }

        for caps in TOOL_CALL_LINE.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            if spans.iter().any(|&(s, e)| whole.start() >= s && whole.start() < e) {
                continue;
            }
            let name = caps.get(1).map_or("", |m| m.as_str());
            let args = caps.get(2).map_or("", |m| m.as_str());
            consumed.push((whole.start(), whole.end()));
            found.push((whole.start(), vec![self.call_from_args(name, args, whole.as_str())]));
        }

        if found.is_empty() {
            if let Some(loose) = &self.loose {
                for caps in loose.captures_iter(text) {
                    let Some(whole) = caps.get(0) else { continue };
                    let name = caps.get(1).map_or("", |m| m.as_str());
                    let args = caps.get(2).map_or("", |m| m.as_str());
                    consumed.push((whole.start(), whole.end()));
                    found.push((whole.start(), vec![self.call_from_args(name, args, whole.as_str())]));
                }
            }
        }
        if found.is_empty() {
            return ParsedCompletion {
                calls: Vec::new(),
                strategy: ParseStrategy::None,
                spoken: response.unwrap_or_else(|| text.trim().to_string()),
            };
        }

        found.sort_by_key(|(pos, _)| *pos);
        let calls: Vec<ToolCall> = found.into_iter().flat_map(|(_, c)| c).collect();

        let spoken = response.unwrap_or_else(|| remove_spans(text, &consumed));

        ParsedCompletion {
            calls,
            strategy: ParseStrategy::Pattern,
            spoken,
        }
    }

    fn calls_from_value(&self, value: &Value, raw: &str) -> Vec<ToolCall> {
        match value {
            Value::Array(items) => items
                .iter()
                .flat_map(|v| self.calls_from_value(v, raw))
                .collect(),
            Value::Object(map) => {
                if let Some(items) = map.get("tool_calls").and_then(Value::as_array) {
                    return items
                        .iter()
                        .filter_map(|item| {
                            let target = item.get("function").unwrap_or(item);
                            target
                                .as_object()
                                .and_then(|m| self.call_from_object(m, raw, true))
                        })
                        .collect();
                }
                if let Some(items) = map.get("tools").and_then(Value::as_array) {
                    return items
                        .iter()
                        .filter_map(|item| {
                            item.as_object()
                                .and_then(|m| self.call_from_object(m, raw, true))
                        })
                        .collect();
                }
                self.call_from_object(map, raw, false).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    /// A call described by one object. Outside a `tools`/`tool_calls` list a
    /// bare `"name"` only counts next to an argument key.
    fn call_from_object(
        &self,
        map: &Map<String, Value>,
        raw: &str,
        listed: bool,
    ) -> Option<ToolCall> {
        let args = ARG_KEYS.iter().find_map(|k| map.get(*k));
        let name_counts = listed || args.is_some();
        let name = TOOL_KEYS
            .iter()
            .chain(name_counts.then_some(&"name"))
            .filter_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())?;

        let arguments = match args {
            Some(Value::Object(args)) => args.clone(),
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(args)) => args,
                _ => self.positional(name, s),
            },
            Some(Value::Null) | None => Arguments::new(),
            Some(other) => self.positional(name, &other.to_string()),
        };

        Some(ToolCall::new(name, arguments).with_source(raw))
    }

    /// Recover calls from an object that is not valid JSON
    fn salvage(&self, raw: &str) -> Vec<ToolCall> {
        let heads_for = |re: &Regex| -> Vec<(usize, usize, &str)> {
            re.captures_iter(raw)
                .filter_map(|c| Some((c.get(0)?, c.get(1)?.as_str())))
                .map(|(m, name)| (m.start(), m.end(), name))
                .collect()
        };
        // "name" only heads a call when no "tool"/"action" key exists and
        // some argument key does
        let mut heads = heads_for(&SALVAGE_TOOL_KEY);
        let name_is_head = heads.is_empty() && SALVAGE_ARG_KEY.is_match(raw);
        if name_is_head {
            heads = heads_for(&SALVAGE_NAME_KEY);
        }

        let mut calls = Vec::new();
        for (i, &(start, end, name)) in heads.iter().enumerate() {
            let segment_end = heads.get(i + 1).map_or(raw.len(), |h| h.0);
            let mut arguments = Arguments::new();
            // pairs before the head belong to this call when it is the first one
            let before = if i == 0 { &raw[..start] } else { "" };
            for segment in [before, &raw[end..segment_end]] {
                for caps in SALVAGE_PAIR.captures_iter(segment) {
                    let Some(key) = caps.get(1).map(|m| m.as_str()) else { continue };
                    if RESERVED_KEYS.contains(&key) || (name_is_head && key == "name") {
                        continue;
                    }
                    let value = if let Some(s) = caps.get(2) {
                        unescape(s.as_str())
                    } else if let Some(lit) = caps.get(3) {
                        serde_json::from_str(lit.as_str()).unwrap_or(Value::Null)
                    } else {
                        continue;
                    };
                    arguments.insert(key.to_string(), value);
                }
            }
            calls.push(ToolCall::new(name.trim(), arguments).with_source(raw));
        }
        if !calls.is_empty() {
            debug!(target: "response_parser", calls = calls.len(), "Salvaged calls from malformed JSON");
        }
        calls
    }

    fn call_from_args(&self, name: &str, args: &str, raw: &str) -> ToolCall {
        let mut arguments = Arguments::new();
        for caps in NAMED_ARG.captures_iter(args) {
            let Some(key) = caps.get(1).map(|m| m.as_str()) else { continue };
            let value = if let Some(q) = caps.get(2).or_else(|| caps.get(3)) {
                Value::String(q.as_str().to_string())
            } else if let Some(bare) = caps.get(4) {
                serde_json::from_str(bare.as_str())
                    .unwrap_or_else(|_| Value::String(bare.as_str().to_string()))
            } else {
                continue;
            };
            arguments.insert(key.to_string(), value);
        }
        if arguments.is_empty() && !args.trim().is_empty() {
            arguments = self.positional(name, args);
        }
        ToolCall::new(name, arguments).with_source(raw)
    }

    /// A single unnamed value maps onto the tool's sole required parameter
    fn positional(&self, name: &str, value: &str) -> Arguments {
        let mut arguments = Arguments::new();
        let clean = value.trim().trim_matches(|c| c == '"' || c == '\'');
        if clean.is_empty() {
            return arguments;
        }
        if let Some(sig) = self.tools.iter().find(|t| t.name == name) {
            if let [only] = sig.required.as_slice() {
                arguments.insert(only.clone(), Value::String(clean.to_string()));
            }
        }
        arguments
    }
}

/// Serialize a call in the structured form accepted by the strict pass
pub fn encode_tool_call(call: &ToolCall) -> String {
    let body = json!({
        "tool": call.name,
        "args": Value::Object(call.arguments.clone()),
    });
    format!("```json\n{:#}\n```", body)
}

/// Byte spans of top-level `{...}` objects, quote aware. An object still
/// open at end of text runs to the end.
fn json_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        spans.push((s, i + 1));
                    }
                }
            }
            _ => {}
        }
    }
    if depth > 0 {
        if let Some(s) = start {
            spans.push((s, text.len()));
        }
    }
    spans
}

fn unescape(s: &str) -> Value {
    serde_json::from_str::<String>(&format!("\"{}\"", s))
        .map(Value::String)
        .unwrap_or_else(|_| Value::String(s.to_string()))
}

/// Text with the given spans cut out, blank lines collapsed
fn remove_spans(text: &str, spans: &[(usize, usize)]) -> String {
    let mut sorted = spans.to_vec();
    sorted.sort_unstable();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (start, end) in sorted {
        if start < cursor || end > text.len() {
            continue;
        }
        out.push_str(&text[cursor..start]);
        cursor = end;
    }
    out.push_str(&text[cursor..]);

    out.lines()
        .map(str::trim_end)
        .filter(|l| {
            let t = l.trim();
            !t.is_empty() && t != "```" && !t.eq_ignore_ascii_case("```json")
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

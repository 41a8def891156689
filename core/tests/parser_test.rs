use aide_core::llm::{encode_tool_call, ParseStrategy, ResponseParser};
use aide_core::tools::{ToolCall, ToolSignature};
use serde_json::{json, Map, Value};

fn parser() -> ResponseParser {
    ResponseParser::with_tools(vec![
        ToolSignature {
            name: "open_application".into(),
            required: vec!["app_name".into()],
        },
        ToolSignature {
            name: "read_file".into(),
            required: vec!["path".into()],
        },
        ToolSignature {
            name: "get_time".into(),
            required: vec![],
        },
    ])
}

fn call(name: &str, args: Value) -> ToolCall {
    let arguments: Map<String, Value> = args.as_object().cloned().unwrap_or_default();
    ToolCall::new(name, arguments)
}

#[test]
fn encoded_calls_parse_back_structurally() {
    let original = call(
        "write_file",
        json!({"path": "notes/today.md", "content": "line one\n\"quoted\" {braces}", "count": 3}),
    );
    let parsed = parser().parse_detailed(&encode_tool_call(&original));

    assert_eq!(parsed.strategy, ParseStrategy::Structured);
    assert_eq!(parsed.calls.len(), 1);
    assert_eq!(parsed.calls[0].name, original.name);
    assert_eq!(parsed.calls[0].arguments, original.arguments);
    assert!(parsed.spoken.is_empty());
}

#[test]
fn strict_single_object_with_response() {
    let text = r#"{"response": "Opening it now.", "tool": "open_application", "args": {"app_name": "notepad"}}"#;
    let parsed = parser().parse_detailed(text);

    assert_eq!(parsed.strategy, ParseStrategy::Structured);
    assert_eq!(parsed.spoken, "Opening it now.");
    assert_eq!(parsed.calls[0].arg_str("app_name"), Some("notepad"));
}

#[test]
fn response_only_object_is_spoken_without_calls() {
    let parsed = parser().parse_detailed(r#"{"response": "Nothing to do."}"#);
    assert!(parsed.calls.is_empty());
    assert_eq!(parsed.spoken, "Nothing to do.");
}

#[test]
fn tool_calls_array_with_string_arguments() {
    let text = r#"{"tool_calls": [
        {"id": "1", "type": "function", "function": {"name": "read_file", "arguments": "{\"path\": \"a.txt\"}"}},
        {"function": {"name": "get_time", "arguments": "{}"}}
    ]}"#;
    let calls = parser().parse(text);

    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].name, "read_file");
    assert_eq!(calls[0].arg_str("path"), Some("a.txt"));
    assert_eq!(calls[1].name, "get_time");
    assert!(calls[1].arguments.is_empty());
}

#[test]
fn tools_array_keeps_order() {
    let text = r#"```json
{"tools": [{"name": "get_time"}, {"name": "open_application", "input": {"app_name": "calc"}}]}
```"#;
    let calls = parser().parse(text);
    let names: Vec<_> = calls.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["get_time", "open_application"]);
    assert_eq!(calls[1].arg_str("app_name"), Some("calc"));
}

#[test]
fn embedded_objects_in_prose_fall_back_in_order() {
    let text = r#"First I'll check the clock {"tool": "get_time"} and then open
{"action": "open_application", "arguments": {"app_name": "notepad"}} for you."#;
    let parsed = parser().parse_detailed(text);

    assert_eq!(parsed.strategy, ParseStrategy::Pattern);
    let names: Vec<_> = parsed.calls.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["get_time", "open_application"]);
    assert!(parsed.spoken.starts_with("First I'll check the clock"));
    assert!(!parsed.spoken.contains('{'));
}

#[test]
fn two_fenced_blocks_use_the_fallback() {
    let text = "```json\n{\"tool\": \"get_time\"}\n```\nthen\n```json\n{\"tool\": \"read_file\", \"args\": {\"path\": \"x\"}}\n```";
    let parsed = parser().parse_detailed(text);

    assert_eq!(parsed.strategy, ParseStrategy::Pattern);
    assert_eq!(parsed.calls.len(), 2);
    assert_eq!(parsed.spoken, "then");
}

#[test]
fn tool_call_lines_with_named_arguments() {
    let text = "Sure!\nTOOL_CALL: open_application(app_name=\"notepad\")\nTOOL_CALL: read_file(path='docs/a.txt')";
    let parsed = parser().parse_detailed(text);

    assert_eq!(parsed.calls.len(), 2);
    assert_eq!(parsed.calls[0].arg_str("app_name"), Some("notepad"));
    assert_eq!(parsed.calls[1].arg_str("path"), Some("docs/a.txt"));
    assert_eq!(parsed.spoken, "Sure!");
}

#[test]
fn positional_argument_maps_to_sole_required_parameter() {
    let calls = parser().parse("TOOL_CALL: open_application(\"spotify\")");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].arg_str("app_name"), Some("spotify"));
}

#[test]
fn loose_mentions_of_known_tools_are_accepted() {
    let parsed = parser().parse_detailed("I will run open_application(notepad) for you.");
    assert_eq!(parsed.calls.len(), 1);
    assert_eq!(parsed.calls[0].name, "open_application");
    assert_eq!(parsed.calls[0].arg_str("app_name"), Some("notepad"));
}

#[test]
fn loose_matches_need_a_registered_tool() {
    let calls = ResponseParser::new().parse("I will run open_application(notepad) for you.");
    assert!(calls.is_empty());
}

#[test]
fn truncated_json_is_salvaged() {
    let text = r#"Opening: {"tool": "open_application", "args": {"app_name": "notepad""#;
    let calls = parser().parse(text);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "open_application");
    assert_eq!(calls[0].arg_str("app_name"), Some("notepad"));
}

#[test]
fn trailing_comma_object_is_salvaged() {
    let text = r#"{"name": "read_file", "arguments": {"path": "a.txt",},}"#;
    let calls = parser().parse(text);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "read_file");
    assert_eq!(calls[0].arg_str("path"), Some("a.txt"));
}

#[test]
fn ordinary_json_with_a_name_field_is_not_a_call() {
    let text = "Here is your package.json:\n```json\n{\"name\": \"my-app\", \"version\": \"1.0.0\"}\n```";
    let parsed = parser().parse_detailed(text);

    assert!(parsed.calls.is_empty());
    assert_eq!(parsed.strategy, ParseStrategy::None);
    assert_eq!(parsed.spoken, text);
}

#[test]
fn broken_json_with_only_a_name_is_not_salvaged() {
    let calls = parser().parse(r#"Config: {"name": "my-app", "version": "1.0"#);
    assert!(calls.is_empty());
}

#[test]
fn name_with_arguments_is_a_call() {
    let calls = parser().parse(r#"{"name": "read_file", "arguments": {"path": "a.txt"}}"#);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "read_file");
    assert_eq!(calls[0].arg_str("path"), Some("a.txt"));
}

#[test]
fn quoted_arguments_may_contain_parentheses() {
    let text = "TOOL_CALL: write_file(path=\"math.txt\", content=\"f(x) = g(x) + 1\")";
    let calls = parser().parse(text);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].arg_str("path"), Some("math.txt"));
    assert_eq!(calls[0].arg_str("content"), Some("f(x) = g(x) + 1"));

    let loose = parser().parse("I'll run open_application('paint (classic)') now");
    assert_eq!(loose.len(), 1);
    assert_eq!(loose[0].arg_str("app_name"), Some("paint (classic)"));
}

#[test]
fn unknown_tool_names_are_kept_for_the_dispatcher() {
    let calls = parser().parse(r#"{"tool": "teleport", "args": {"to": "mars"}}"#);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "teleport");
}

#[test]
fn plain_text_has_no_calls() {
    let parsed = parser().parse_detailed("The weather looks fine today.");
    assert_eq!(parsed.strategy, ParseStrategy::None);
    assert!(parsed.calls.is_empty());
    assert_eq!(parsed.spoken, "The weather looks fine today.");
}

#[test]
fn arbitrary_input_never_panics() {
    let inputs = [
        "",
        "{",
        "}",
        "{{{{",
        "\"unterminated",
        "```json",
        "```json\n```",
        "```json\n{\"tool\": \n```",
        "TOOL_CALL:",
        "TOOL_CALL: x(",
        "TOOL_CALL: x(=,=)",
        "{\"tool\": 5}",
        "{\"tool_calls\": 7}",
        "{\"tools\": [1, null, \"x\"]}",
        "[{\"tool\": \"get_time\"}]",
        "{\"a\": \"\\u00e9\\\"}\"}",
        "ünïcödé {\"tool\": \"get_time\", \"args\": {\"z\": \"日本\"}} ✓",
        "\\\\\\{\"\"\"}",
        "open_application(",
    ];
    let p = parser();
    for input in inputs {
        let _ = p.parse_detailed(input);
    }
}

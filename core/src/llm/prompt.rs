//! System prompt assembly.

/// Persona and reply rules, without the tool section
pub const DEFAULT_PERSONA: &str = "You are Aide, a personal assistant running on the user's computer.

Speak concisely and warmly; replies are often read aloud, so keep them to one or two short sentences.
After completing a task, say what you did and offer at most one follow-up.
Never delete or remove anything without the user's explicit confirmation.";

/// Persona followed by the tool listing and the call format the parser expects.
///
/// `tool_listing` is one `- name(required): description` line per tool; when
/// empty the tool section is omitted.
pub fn build_system_prompt(persona: &str, tool_listing: &str) -> String {
    if tool_listing.trim().is_empty() {
        return persona.to_string();
    }
    format!(
        "{persona}\n\nAVAILABLE TOOLS:\n{tools}\n\nTO USE A TOOL reply with a single JSON block:\n```json\n{{\"tool\": \"tool_name\", \"args\": {{\"arg\": \"value\"}}, \"response\": \"what to say to the user\"}}\n```\nFor several tools use {{\"tools\": [{{\"name\": \"...\", \"args\": {{...}}}}], \"response\": \"...\"}}.\nIf no tool is needed, answer in plain text.",
        persona = persona,
        tools = tool_listing.trim_end()
    )
}

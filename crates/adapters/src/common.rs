//! Helpers shared by the stream and text adapters.

use serde_json::Value;

/// Semantic grouping of backend tool names. Backends disagree on naming, so
/// classification is by lowercase lookup over the conventional spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Shell,
    FileWrite,
    FileRead,
    Other,
}

pub fn classify_tool(name: &str) -> ToolKind {
    let lower = name.trim().to_ascii_lowercase();
    if matches!(
        lower.as_str(),
        "bash" | "shell" | "execute" | "exec" | "exec_command" | "run" | "run_terminal_cmd"
    ) {
        return ToolKind::Shell;
    }
    if matches!(
        lower.as_str(),
        "write"
            | "edit"
            | "patch"
            | "apply_patch"
            | "apply_diff"
            | "create"
            | "create_file"
            | "write_file"
            | "edit_file"
            | "str_replace_editor"
    ) {
        return ToolKind::FileWrite;
    }
    if matches!(
        lower.as_str(),
        "read" | "read_file" | "view" | "cat" | "open"
    ) {
        return ToolKind::FileRead;
    }
    ToolKind::Other
}

/// First present string among conventional parameter spellings.
pub fn first_str<'a>(params: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| params.get(key).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

/// Compact one-line rendering of tool parameters for generic log chunks.
pub fn compact_params(params: &Value) -> String {
    match params {
        Value::Null => String::new(),
        Value::Object(map) if map.is_empty() => String::new(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

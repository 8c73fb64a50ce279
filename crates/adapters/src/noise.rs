//! Boilerplate detection for console-text parsing.
//!
//! `is_noisy` is a pure predicate over a single line. It is deliberately
//! conservative: a noise line slipping through as a log chunk is acceptable,
//! dropping real content is not.

use regex::Regex;
use std::sync::LazyLock;

/// Punctuation-only or bare JSON-fragment lines (`{`, `},`, `"]`, ...).
static PUNCT_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[\s\[\]{}(),"':;`.\-=_]+$"#).unwrap());

/// Environment/version banners printed by backend CLIs on startup.
static BANNER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(openai codex|codex cli|claude code|gemini cli|aider)\b.*\bv?\d+\.\d+")
        .unwrap()
});

/// CLI preamble `key: value` headers (workdir/model/provider/... style).
static PREAMBLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(workdir|working directory|directory|cwd|model|provider|approval|sandbox|session id|session|reasoning effort|reasoning summaries|tokens used)\s*:\s*\S",
    )
    .unwrap()
});

/// Prompt-template scaffolding headers the host injects when it builds the
/// backend prompt (`## Instructions`, `# Context`, ...).
static SCAFFOLD_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^#{1,6}\s+(instructions|context|task|request|rules|output format)\b").unwrap()
});

/// Bullet instructions from the same injected prompt template.
static SCAFFOLD_BULLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*[-*]\s+(do not|don't|always|never|respond with|return only)\b").unwrap()
});

/// True when `line` is known non-substantive boilerplate.
pub fn is_noisy(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }
    PUNCT_ONLY_RE.is_match(trimmed)
        || BANNER_RE.is_match(trimmed)
        || PREAMBLE_RE.is_match(trimmed)
        || SCAFFOLD_HEADER_RE.is_match(trimmed)
        || SCAFFOLD_BULLET_RE.is_match(trimmed)
}

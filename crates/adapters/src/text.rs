//! Heuristic adapter for free-form console output.
//!
//! Backends without a structured output mode only give us their raw
//! stderr/stdout. A small line-oriented state machine picks out reasoning
//! headers, executed commands, and touched files; everything else that
//! survives the noise filter becomes a generic log chunk.

use crate::noise;
use regex::Regex;
use std::sync::LazyLock;
use turnline_core::{Chunk, ChunkFactory, ChunkPayload, LogStream};

/// Unified-diff file header; the `b/` side names the post-change file.
static DIFF_GIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^diff --git a/(\S+) b/(\S+)").unwrap());

/// Inline shell invocation echoed by the backend (`bash -lc '...'` style).
static SHELL_INVOKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\S*/)?(?:ba|z)?sh\s+-lc\b").unwrap());

/// Single-letter VCS status line (`M src/lib.rs`).
static VCS_STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([MAD])\s+(\S+)$").unwrap());

/// Internal apply-patch plumbing lines, swallowed entirely.
static APPLY_PATCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\*\*\* (begin|end) patch|\*\*\* (add|update|delete) file:|apply_patch\b|applying patch\b)")
        .unwrap()
});

/// Announces that a file changed without naming it. Swallowed: an Edit chunk
/// must always carry a real path, never a placeholder.
static UPDATE_WITHOUT_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^((updated|modified) \d+ file(\(s\)|s)?\.?|(updated|modified) file\.?|file updated\.?|success\. updated the file\.?)$")
        .unwrap()
});

const THINKING_MARKER: &str = "thinking";
const EXEC_MARKER: &str = "exec";

/// Known filler header duplicated later by the final result chunk.
const FILLER_THINKING: &str = "Preparing final message summary";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    Default,
    ExpectRun,
    ExpectThinkingBody,
}

/// Parse concatenated console output into chunks.
///
/// stderr is expected to precede stdout in `text`: early progress markers
/// land there before buffered stdout flushes. A marker left dangling at end
/// of input (a `thinking`/`exec` line with nothing after it) produces
/// nothing.
pub fn parse_console_text(text: &str, factory: &mut ChunkFactory) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut state = LineState::Default;

    for raw_line in text.lines() {
        let line = raw_line.trim();

        match state {
            LineState::ExpectThinkingBody => {
                if line.is_empty() {
                    continue;
                }
                state = LineState::Default;
                let title = strip_emphasis(line);
                if !is_filler_thinking(title) {
                    chunks.push(factory.stamp(ChunkPayload::Thinking {
                        text: title.to_string(),
                    }));
                }
                continue;
            }
            LineState::ExpectRun => {
                if line.is_empty() {
                    continue;
                }
                state = LineState::Default;
                chunks.push(factory.stamp(ChunkPayload::Run {
                    cmd: line.to_string(),
                    run_id: None,
                }));
                continue;
            }
            LineState::Default => {}
        }

        if line == THINKING_MARKER {
            state = LineState::ExpectThinkingBody;
            continue;
        }
        if line == EXEC_MARKER {
            state = LineState::ExpectRun;
            continue;
        }

        if let Some(caps) = DIFF_GIT_RE.captures(line) {
            chunks.push(factory.stamp(ChunkPayload::Edit {
                file: caps[2].to_string(),
            }));
            continue;
        }

        if SHELL_INVOKE_RE.is_match(line) {
            chunks.push(factory.stamp(ChunkPayload::Run {
                cmd: line.to_string(),
                run_id: None,
            }));
            continue;
        }

        if let Some(caps) = VCS_STATUS_RE.captures(line) {
            chunks.push(factory.stamp(ChunkPayload::Edit {
                file: caps[2].to_string(),
            }));
            continue;
        }

        if APPLY_PATCH_RE.is_match(line) || UPDATE_WITHOUT_TARGET_RE.is_match(line) {
            continue;
        }

        if noise::is_noisy(line) {
            continue;
        }

        chunks.push(factory.stamp(ChunkPayload::Log {
            stream: LogStream::Mixed,
            text: line.to_string(),
            run_id: None,
        }));
    }

    chunks
}

/// Parse a finished process's output, stderr first.
pub fn parse_console_output(stderr: &str, stdout: &str, factory: &mut ChunkFactory) -> Vec<Chunk> {
    let mut combined = String::with_capacity(stderr.len() + stdout.len() + 1);
    combined.push_str(stderr);
    if !stderr.is_empty() && !stderr.ends_with('\n') {
        combined.push('\n');
    }
    combined.push_str(stdout);
    parse_console_text(&combined, factory)
}

/// Strip one wrapping bold/emphasis marker pair, if present.
fn strip_emphasis(line: &str) -> &str {
    for marker in ["**", "__", "*", "_"] {
        if line.len() > marker.len() * 2
            && line.starts_with(marker)
            && line.ends_with(marker)
        {
            return &line[marker.len()..line.len() - marker.len()];
        }
    }
    line
}

fn is_filler_thinking(title: &str) -> bool {
    let title = title.trim_end_matches(['.', '…']).trim();
    title.eq_ignore_ascii_case(FILLER_THINKING)
}

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use turnline_core::{
    Chunk, ChunkPayload, EntryKind, EntryStatus, SummaryMeta, TestsStatus, TimelineEntry,
    TurnStatus, TurnSummary, TurnTiming,
};

/// Common test-runner invocations. A matching Run chunk becomes a Test entry
/// instead of a plain Command.
static TEST_CMD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:npm|pnpm|yarn|bun)(?:\s+run)?\s+test|pytest|go\s+test|cargo\s+(?:test|nextest)|jest|vitest|mocha|rspec|make\s+test|ctest|phpunit)\b",
    )
    .unwrap()
});

/// Redundant boilerplate in final-result bodies; file counts are already
/// conveyed by FileChange entries.
static UPDATED_FILES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)updated \d+ file(?:\(s\)|s)?\.?").unwrap());

const TITLE_MAX_CHARS: usize = 120;
const BULLET_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateOutput {
    pub summary: TurnSummary,
    pub timeline: Vec<TimelineEntry>,
}

/// Aggregate a chunk sequence into timeline entries and a turn summary.
///
/// Pure and idempotent over any prefix of the same sequence: entries whose
/// absorption window closed before a prefix boundary are identical on every
/// later call with a longer prefix. A partial sequence from an interrupted
/// turn is always valid input.
pub fn aggregate(chunks: &[Chunk], timing: Option<TurnTiming>) -> AggregateOutput {
    let mut timeline = Vec::new();
    let mut i = 0;

    while i < chunks.len() {
        let chunk = &chunks[i];
        match &chunk.payload {
            ChunkPayload::Thinking { text } => {
                if !text.trim().is_empty() {
                    timeline.push(entry(
                        EntryKind::Thinking,
                        EntryStatus::Done,
                        title_of(text),
                        body_beyond_title(text),
                        Vec::new(),
                        vec![chunk.seq],
                    ));
                }
                i += 1;
            }

            ChunkPayload::Run { cmd, run_id } => {
                let (next, entry) = absorb_run(chunks, i, cmd, run_id.as_deref());
                timeline.push(entry);
                i = next;
            }

            ChunkPayload::Edit { file } => {
                let mut files = vec![file.clone()];
                let mut source_seqs = vec![chunk.seq];
                let mut j = i + 1;
                while let Some(ChunkPayload::Edit { file }) = chunks.get(j).map(|c| &c.payload) {
                    if !files.contains(file) {
                        files.push(file.clone());
                    }
                    source_seqs.push(chunks[j].seq);
                    j += 1;
                }
                let title = if files.len() == 1 {
                    format!("Edited `{}`", files[0])
                } else {
                    format!("Edited {} files", files.len())
                };
                timeline.push(entry(
                    EntryKind::FileChange,
                    EntryStatus::Done,
                    title,
                    None,
                    files,
                    source_seqs,
                ));
                i = j;
            }

            ChunkPayload::Result {
                result_summary,
                text,
            } => {
                let raw = result_summary
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .or(text.as_deref())
                    .unwrap_or("");
                let body = strip_result_boilerplate(raw);
                let title = if body.is_empty() {
                    "Done".to_string()
                } else {
                    title_of(&body)
                };
                timeline.push(entry(
                    EntryKind::Final,
                    EntryStatus::Done,
                    title,
                    if body.is_empty() { None } else { Some(body) },
                    Vec::new(),
                    vec![chunk.seq],
                ));
                i += 1;
            }

            ChunkPayload::Error { text, .. } => {
                timeline.push(entry(
                    EntryKind::Error,
                    EntryStatus::Failed,
                    title_of(text),
                    Some(text.clone()),
                    Vec::new(),
                    vec![chunk.seq],
                ));
                i += 1;
            }

            // Standalone logs carry no entry of their own; they only matter
            // when absorbed into a preceding Run.
            ChunkPayload::Log { .. } => {
                i += 1;
            }
        }
    }

    let summary = derive_summary(&timeline, timing);
    AggregateOutput { summary, timeline }
}

/// Absorb the log span following a Run, plus an error tied to the same run.
/// Returns the scan index past the absorbed span.
fn absorb_run(
    chunks: &[Chunk],
    start: usize,
    cmd: &str,
    run_id: Option<&str>,
) -> (usize, TimelineEntry) {
    let mut source_seqs = vec![chunks[start].seq];
    let mut log_lines: Vec<&str> = Vec::new();
    let mut error_text: Option<String> = None;

    let mut j = start + 1;
    while j < chunks.len() {
        match &chunks[j].payload {
            ChunkPayload::Log { text, .. } => {
                log_lines.push(text);
                source_seqs.push(chunks[j].seq);
                j += 1;
            }
            ChunkPayload::Error {
                text,
                run_id: err_run_id,
            } if run_id.is_some() && err_run_id.as_deref() == run_id => {
                error_text = Some(text.clone());
                source_seqs.push(chunks[j].seq);
                j += 1;
            }
            _ => break,
        }
    }

    let kind = if TEST_CMD_RE.is_match(cmd) {
        EntryKind::Test
    } else {
        EntryKind::Command
    };
    let status = if error_text.is_some() {
        EntryStatus::Failed
    } else {
        EntryStatus::Done
    };

    let mut body_parts: Vec<&str> = Vec::new();
    if let Some(ref err) = error_text {
        body_parts.push(err);
    }
    body_parts.extend(log_lines);
    let body = if body_parts.is_empty() {
        None
    } else {
        Some(body_parts.join("\n"))
    };

    let title = if cmd.trim().is_empty() {
        "shell".to_string()
    } else {
        truncate_chars(cmd.trim(), TITLE_MAX_CHARS)
    };

    (j, entry(kind, status, title, body, Vec::new(), source_seqs))
}

fn derive_summary(timeline: &[TimelineEntry], timing: Option<TurnTiming>) -> TurnSummary {
    let any_failed = timeline
        .iter()
        .any(|e| e.status == EntryStatus::Failed || e.kind == EntryKind::Error);

    let test_entries: Vec<_> = timeline.iter().filter(|e| e.kind == EntryKind::Test).collect();
    let tests_status = if test_entries.is_empty() {
        None
    } else if test_entries.iter().any(|e| e.status == EntryStatus::Failed) {
        Some(TestsStatus::Failed)
    } else {
        Some(TestsStatus::Passed)
    };

    let bullets = timeline
        .iter()
        .rev()
        .find(|e| e.kind == EntryKind::Final)
        .and_then(|e| e.body.as_deref())
        .map(|body| vec![truncate_chars(body, BULLET_MAX_CHARS)])
        .unwrap_or_default();

    TurnSummary {
        status: if any_failed {
            TurnStatus::Failed
        } else {
            TurnStatus::Success
        },
        meta: SummaryMeta {
            duration_ms: timing.and_then(|t| t.duration_ms),
            tests_status,
        },
        bullets,
    }
}

fn entry(
    kind: EntryKind,
    status: EntryStatus,
    title: String,
    body: Option<String>,
    files: Vec<String>,
    source_seqs: Vec<u64>,
) -> TimelineEntry {
    let first_seq = source_seqs.first().copied().unwrap_or_default();
    TimelineEntry {
        id: format!("{}-{}", kind.label(), first_seq),
        kind,
        status,
        title,
        body,
        files,
        source_seqs,
    }
}

/// First line, length-bounded.
fn title_of(text: &str) -> String {
    let first_line = text.trim().lines().next().unwrap_or("").trim();
    truncate_chars(first_line, TITLE_MAX_CHARS)
}

/// Full text as body when it says more than the derived title does.
fn body_beyond_title(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || title_of(text) == trimmed {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn strip_result_boilerplate(text: &str) -> String {
    let stripped = UPDATED_FILES_RE.replace_all(text, "");
    stripped.trim().to_string()
}

/// Char-boundary-safe truncation with an ellipsis.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

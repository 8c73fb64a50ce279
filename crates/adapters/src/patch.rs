//! Extractor for the bespoke `*** Begin Patch` envelope some backends print
//! instead of a unified diff.
//!
//! Every envelope is split at per-file operation headers; add/remove/hunk
//! counts are recomputed per file by re-wrapping each sub-span in its own
//! envelope, so statistics never leak across files sharing an envelope.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use turnline_core::{FileChange, FileOp};

static ENVELOPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\*\*\* Begin Patch\s*\n(.*?)\*\*\* End Patch").unwrap()
});

static FILE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\*\*\* (Add|Update|Delete) File: (.+)$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Patch,
    Text,
}

/// Result of scanning one text blob for patch envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOutput {
    pub output_type: OutputType,
    /// Per-file changes in source order; empty for plain text.
    pub changes: Vec<FileChange>,
    pub title: String,
    pub description: String,
}

/// Extract every patch envelope from `text`. With no envelope present the
/// blob is treated as plain text and passed through as the title/description
/// fallback.
pub fn extract_patches(text: &str) -> PatchOutput {
    let mut changes = Vec::new();

    for envelope in ENVELOPE_RE.captures_iter(text) {
        let body = &envelope[1];
        split_envelope(body, &mut changes);
    }

    if changes.is_empty() && !ENVELOPE_RE.is_match(text) {
        let trimmed = text.trim().to_string();
        return PatchOutput {
            output_type: OutputType::Text,
            changes,
            title: trimmed.clone(),
            description: trimmed,
        };
    }

    let title = if changes.len() == 1 {
        format!("1 file changed: {}", changes[0].path)
    } else {
        format!("{} files changed", changes.len())
    };
    PatchOutput {
        output_type: OutputType::Patch,
        changes,
        title,
        description: text.trim().to_string(),
    }
}

fn split_envelope(body: &str, changes: &mut Vec<FileChange>) {
    let headers: Vec<_> = FILE_HEADER_RE.captures_iter(body).collect();
    let spans: Vec<_> = FILE_HEADER_RE.find_iter(body).collect();

    for (i, (header, span)) in headers.iter().zip(&spans).enumerate() {
        let end = spans
            .get(i + 1)
            .map(|next| next.start())
            .unwrap_or(body.len());
        let sub_span = body[span.start()..end].trim_end_matches('\n');

        let op = match &header[1] {
            "Add" => FileOp::Add,
            "Delete" => FileOp::Delete,
            _ => FileOp::Update,
        };
        let (added, removed, hunks) = count_stats(&rewrap(sub_span));

        changes.push(FileChange {
            path: header[2].trim().to_string(),
            op,
            patch: sub_span.to_string(),
            added,
            removed,
            hunks,
        });
    }
}

/// Wrap a sub-span back into its own envelope so counting sees exactly one
/// file's worth of lines.
fn rewrap(sub_span: &str) -> String {
    format!("*** Begin Patch\n{sub_span}\n*** End Patch")
}

fn count_stats(patch: &str) -> (usize, usize, usize) {
    let mut added = 0;
    let mut removed = 0;
    for line in patch.lines() {
        if line.starts_with('+') && !line.starts_with("++") {
            added += 1;
        } else if line.starts_with('-') && !line.starts_with("--") {
            removed += 1;
        }
    }
    let hunks = patch.matches("@@").count();
    (added, removed, hunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_update_envelope() {
        let text = "Here is the change:\n*** Begin Patch\n*** Update File: a.txt\n@@\n+one\n+two\n+three\n-old\n*** End Patch\nDone.";
        let out = extract_patches(text);
        assert_eq!(out.output_type, OutputType::Patch);
        assert_eq!(out.changes.len(), 1);
        let change = &out.changes[0];
        assert_eq!(change.path, "a.txt");
        assert_eq!(change.op, FileOp::Update);
        assert_eq!(change.added, 3);
        assert_eq!(change.removed, 1);
        assert_eq!(change.hunks, 1);
    }

    #[test]
    fn test_multiple_files_do_not_leak_counts() {
        let text = "*** Begin Patch\n*** Add File: new.rs\n+fn new() {}\n+fn other() {}\n*** Delete File: old.rs\n-fn old() {}\n*** End Patch";
        let out = extract_patches(text);
        assert_eq!(out.changes.len(), 2);
        assert_eq!(out.changes[0].path, "new.rs");
        assert_eq!(out.changes[0].op, FileOp::Add);
        assert_eq!(out.changes[0].added, 2);
        assert_eq!(out.changes[0].removed, 0);
        assert_eq!(out.changes[1].path, "old.rs");
        assert_eq!(out.changes[1].op, FileOp::Delete);
        assert_eq!(out.changes[1].added, 0);
        assert_eq!(out.changes[1].removed, 1);
    }

    #[test]
    fn test_multiple_envelopes_in_source_order() {
        let text = "*** Begin Patch\n*** Update File: a.rs\n+x\n*** End Patch\nchatter\n*** Begin Patch\n*** Update File: b.rs\n+y\n*** End Patch";
        let out = extract_patches(text);
        let paths: Vec<_> = out.changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["a.rs", "b.rs"]);
    }

    #[test]
    fn test_double_plus_and_minus_not_counted() {
        let text = "*** Begin Patch\n*** Update File: a.rs\n++not counted\n--not counted\n+counted\n*** End Patch";
        let out = extract_patches(text);
        assert_eq!(out.changes[0].added, 1);
        assert_eq!(out.changes[0].removed, 0);
    }

    #[test]
    fn test_plain_text_fallback() {
        let out = extract_patches("  All checks passed, nothing to change.  ");
        assert_eq!(out.output_type, OutputType::Text);
        assert!(out.changes.is_empty());
        assert_eq!(out.title, "All checks passed, nothing to change.");
        assert_eq!(out.description, out.title);
    }

    #[test]
    fn test_unterminated_envelope_is_ignored() {
        let out = extract_patches("*** Begin Patch\n*** Update File: a.rs\n+x\n");
        // No End Patch marker, so no envelope span matches.
        assert_eq!(out.output_type, OutputType::Text);
        assert!(out.changes.is_empty());
    }
}

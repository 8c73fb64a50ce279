use serde::{Deserialize, Serialize};

/// An aggregated, UI-ready unit built from one or more chunks. Derived data:
/// recomputed from the chunk sequence on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Derived from `(kind, first source seq)` so repeated aggregation of the
    /// same chunks yields the same id (stable render diffing).
    pub id: String,
    pub kind: EntryKind,
    pub status: EntryStatus,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    /// `seq` numbers of the chunks this entry was built from.
    pub source_seqs: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Thinking,
    Command,
    FileChange,
    Test,
    Final,
    Error,
}

impl EntryKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntryKind::Thinking => "thinking",
            EntryKind::Command => "command",
            EntryKind::FileChange => "file-change",
            EntryKind::Test => "test",
            EntryKind::Final => "final",
            EntryKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    Done,
    Failed,
}

/// Headline status and metadata for one execution turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    pub status: TurnStatus,
    pub meta: SummaryMeta,
    /// Zero or one excerpt of the final result body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests_status: Option<TestsStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestsStatus {
    Passed,
    Failed,
}

/// Wall-clock timing measured by the process-supervising collaborator and
/// passed through verbatim into the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnTiming {
    pub duration_ms: Option<u64>,
}

/// One file touched by a patch envelope, with line-count deltas. No semantic
/// diffing happens here: path plus add/remove/hunk counts only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub op: FileOp,
    /// Raw per-file patch text.
    pub patch: String,
    pub added: usize,
    pub removed: usize,
    pub hunks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOp {
    Add,
    Update,
    Delete,
}

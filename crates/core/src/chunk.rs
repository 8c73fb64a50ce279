use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized execution event, produced by an adapter from raw backend
/// output. Chunks are immutable and append-only: once emitted they are never
/// edited or removed, only consumed by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Backend-assigned identifier, when the source format carries one
    /// (e.g. a tool-call id). Absent for heuristically parsed console text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Strictly increasing within one turn; defines the total order.
    pub seq: u64,
    /// When the chunk was stamped.
    pub ts: DateTime<Utc>,
    /// What happened.
    pub payload: ChunkPayload,
}

/// The closed variant set of things a backend can report. Adapters map every
/// raw output shape into one of these; the aggregator's dispatch is
/// exhaustive over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ChunkPayload {
    /// Assistant reasoning text.
    Thinking { text: String },
    /// A shell command the backend ran.
    Run {
        cmd: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
    },
    /// A file the backend touched.
    Edit { file: String },
    /// One line of command or tool output.
    Log {
        stream: LogStream,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
    },
    /// The backend's final answer for the turn.
    Result {
        #[serde(skip_serializing_if = "Option::is_none")]
        result_summary: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    /// A failure reported by the backend, optionally tied to a run.
    Error {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        run_id: Option<String>,
    },
}

/// Which stream a log line came from. Console-text parsing sees stderr and
/// stdout pre-concatenated, hence `Mixed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
    Mixed,
}

/// Per-turn sequence/timestamp stamper.
///
/// One factory per execution turn, passed into each adapter call. Never share
/// a factory between turns: `seq` collisions between simultaneous turns would
/// break the total-order invariant.
#[derive(Debug)]
pub struct ChunkFactory {
    turn_id: String,
    next_seq: u64,
}

impl ChunkFactory {
    pub fn new() -> Self {
        Self {
            turn_id: uuid::Uuid::new_v4().to_string(),
            next_seq: 0,
        }
    }

    /// The turn this factory stamps for.
    pub fn turn_id(&self) -> &str {
        &self.turn_id
    }

    /// Sequence number the next stamped chunk will receive.
    pub fn peek_seq(&self) -> u64 {
        self.next_seq + 1
    }

    pub fn stamp(&mut self, payload: ChunkPayload) -> Chunk {
        self.stamp_with_id(None, payload)
    }

    pub fn stamp_with_id(&mut self, id: Option<String>, payload: ChunkPayload) -> Chunk {
        self.next_seq += 1;
        Chunk {
            id,
            seq: self.next_seq,
            ts: Utc::now(),
            payload,
        }
    }
}

impl Default for ChunkFactory {
    fn default() -> Self {
        Self::new()
    }
}

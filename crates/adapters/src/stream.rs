//! Adapter for backends running in structured-output mode.
//!
//! Input is a sequence of self-describing records, one per processing step,
//! already deserialized by the transport layer. Dispatch is on the `type`
//! discriminator plus tool-name classification. No record shape may cause a
//! panic; unrecognized records degrade to a generic log chunk or are dropped
//! with a debug trace.

use crate::common::{classify_tool, compact_params, first_str, ToolKind};
use serde::Deserialize;
use serde_json::Value;
use turnline_core::{Chunk, ChunkFactory, ChunkPayload, LogStream};

/// One structured record as emitted by a backend's event stream.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub id: Option<String>,
    /// Everything else the record carried, kept loose: field names vary by
    /// backend and are probed with conventional spellings at dispatch time.
    #[serde(flatten)]
    pub fields: Value,
}

/// Adapter output: the chunk sequence plus two side channels.
#[derive(Debug, Clone, Default)]
pub struct StreamOutput {
    pub chunks: Vec<Chunk>,
    /// Joined tool-result text, kept as a full-text fallback for hosts that
    /// want the raw output alongside the normalized chunks.
    pub aggregated_text: String,
    /// Final-result text, first-wins: later completion records never
    /// overwrite it.
    pub summary: Option<String>,
}

const MAX_RESULT_LOG_LINES: usize = 50;

const TEXT_KEYS: &[&str] = &["text", "message", "content"];
const CMD_KEYS: &[&str] = &["command", "cmd", "script", "input"];
const PATH_KEYS: &[&str] = &["path", "file_path", "file", "filename"];
const TOOL_KEYS: &[&str] = &["tool", "name", "tool_name"];
const VALUE_KEYS: &[&str] = &["value", "output", "content", "text"];
const FINAL_KEYS: &[&str] = &["result", "text", "message", "summary", "output"];

/// Convert a record sequence into chunks.
pub fn convert_records(records: &[StreamRecord], factory: &mut ChunkFactory) -> StreamOutput {
    let mut out = StreamOutput::default();
    for record in records {
        convert_record(record, factory, &mut out);
    }
    out
}

/// Parse newline-delimited JSON records and convert them. Blank and
/// malformed lines are skipped silently; truncated stream buffers are
/// expected, not exceptional.
pub fn parse_jsonl(text: &str, factory: &mut ChunkFactory) -> StreamOutput {
    let mut out = StreamOutput::default();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<StreamRecord>(line) {
            Ok(record) => convert_record(&record, factory, &mut out),
            Err(e) => {
                tracing::debug!("skipping unparseable stream record: {e}");
            }
        }
    }
    out
}

fn convert_record(record: &StreamRecord, factory: &mut ChunkFactory, out: &mut StreamOutput) {
    match record.record_type.as_str() {
        // Metadata only.
        "init" | "system" | "session" | "session_meta" => {}
        // The host's own prompt echoed back.
        "user" | "user_message" | "user_input" | "echo" => {}

        "assistant" | "assistant_message" | "agent_message" | "message" => {
            // Generic "message" records may still be echoed user input.
            if record.fields.get("role").and_then(Value::as_str) == Some("user") {
                return;
            }
            if let Some(text) = first_str(&record.fields, TEXT_KEYS) {
                out.chunks.push(factory.stamp(ChunkPayload::Thinking {
                    text: text.to_string(),
                }));
            }
        }

        "tool_call" | "tool_use" | "function_call" => convert_tool_call(record, factory, out),

        "tool_result" | "tool_output" | "function_call_output" => {
            convert_tool_result(record, factory, out)
        }

        "result" | "completion" | "done" | "final" => convert_completion(record, factory, out),

        "error" => {
            let text = first_str(&record.fields, &["message", "error", "text"])
                .unwrap_or("unknown error");
            out.chunks.push(factory.stamp(ChunkPayload::Error {
                text: text.to_string(),
                run_id: record.id.clone(),
            }));
        }

        other => {
            // Forward compatibility: keep anything that still carries text.
            if let Some(text) = first_str(&record.fields, &["text", "message", "value"]) {
                out.chunks.push(factory.stamp(ChunkPayload::Log {
                    stream: LogStream::Stdout,
                    text: format!("[{other}] {text}"),
                    run_id: None,
                }));
            } else {
                tracing::debug!("dropping unrecognized stream record type: {other}");
            }
        }
    }
}

fn convert_tool_call(record: &StreamRecord, factory: &mut ChunkFactory, out: &mut StreamOutput) {
    let name = first_str(&record.fields, TOOL_KEYS).unwrap_or("");
    // Parameters usually nest under one of these; fall back to the record
    // body itself, where flat formats put them.
    let params = record
        .fields
        .get("params")
        .or_else(|| record.fields.get("arguments"))
        .or_else(|| record.fields.get("input"))
        .filter(|v| v.is_object())
        .unwrap_or(&record.fields);

    match classify_tool(name) {
        ToolKind::Shell => {
            let cmd = first_str(params, CMD_KEYS)
                .or_else(|| first_str(&record.fields, CMD_KEYS))
                .unwrap_or("");
            out.chunks.push(factory.stamp_with_id(
                record.id.clone(),
                ChunkPayload::Run {
                    cmd: cmd.to_string(),
                    run_id: record.id.clone(),
                },
            ));
        }
        ToolKind::FileWrite => {
            let path = first_str(params, PATH_KEYS)
                .or_else(|| first_str(&record.fields, PATH_KEYS));
            match path {
                Some(path) => out.chunks.push(factory.stamp_with_id(
                    record.id.clone(),
                    ChunkPayload::Edit {
                        file: path.to_string(),
                    },
                )),
                // Never emit an Edit with an unresolved target.
                None => tracing::debug!("dropping {name} call without a path"),
            }
        }
        ToolKind::FileRead => {
            let path = first_str(params, PATH_KEYS)
                .or_else(|| first_str(&record.fields, PATH_KEYS));
            let text = match path {
                Some(path) => format!("[Read] {path}"),
                None => format!("[Read] {}", compact_params(params)),
            };
            out.chunks.push(factory.stamp(ChunkPayload::Log {
                stream: LogStream::Stdout,
                text,
                run_id: record.id.clone(),
            }));
        }
        ToolKind::Other => {
            let rendered = compact_params(params);
            let label = if name.is_empty() { "tool" } else { name };
            out.chunks.push(factory.stamp(ChunkPayload::Log {
                stream: LogStream::Stdout,
                text: format!("[{label}] {rendered}").trim_end().to_string(),
                run_id: record.id.clone(),
            }));
        }
    }
}

fn convert_tool_result(record: &StreamRecord, factory: &mut ChunkFactory, out: &mut StreamOutput) {
    let value = first_str(&record.fields, VALUE_KEYS)
        .map(str::to_string)
        .unwrap_or_else(|| {
            record
                .fields
                .get("value")
                .or_else(|| record.fields.get("output"))
                .map(compact_params)
                .unwrap_or_default()
        });

    if is_error_flagged(&record.fields) {
        out.chunks.push(factory.stamp(ChunkPayload::Error {
            text: value,
            run_id: record.id.clone(),
        }));
        return;
    }

    for line in value
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(MAX_RESULT_LOG_LINES)
    {
        out.chunks.push(factory.stamp(ChunkPayload::Log {
            stream: LogStream::Stdout,
            text: line.to_string(),
            run_id: record.id.clone(),
        }));
        out.aggregated_text.push_str(line);
        out.aggregated_text.push('\n');
    }
}

fn convert_completion(record: &StreamRecord, factory: &mut ChunkFactory, out: &mut StreamOutput) {
    let final_text = first_str(&record.fields, FINAL_KEYS).unwrap_or("").to_string();

    out.chunks.push(factory.stamp(ChunkPayload::Result {
        result_summary: Some(final_text.clone()),
        text: Some(final_text.clone()),
    }));
    if out.summary.is_none() && !final_text.is_empty() {
        out.summary = Some(final_text.clone());
    }

    // Some formats flag a failed turn on the completion record itself.
    if is_error_flagged(&record.fields) {
        let text = first_str(&record.fields, &["error", "message"])
            .map(str::to_string)
            .unwrap_or(final_text);
        out.chunks.push(factory.stamp(ChunkPayload::Error {
            text,
            run_id: None,
        }));
    }
}

fn is_error_flagged(fields: &Value) -> bool {
    ["is_error", "isError"]
        .iter()
        .any(|key| fields.get(key).and_then(Value::as_bool).unwrap_or(false))
        || fields.get("subtype").and_then(Value::as_str) == Some("error")
}

//! End-to-end pipeline tests: raw backend output through an adapter into the
//! aggregator, the way a host drives one execution turn.

use turnline_adapters::{stream, text};
use turnline_core::{ChunkFactory, EntryKind, EntryStatus, TestsStatus, TurnStatus, TurnTiming};
use turnline_timeline::{aggregate, MemoizedAggregator};

#[test]
fn console_text_turn() {
    let stderr = "OpenAI Codex v0.42.0\nworkdir: /tmp/project\nthinking\n**Tracking down the panic**\n";
    let stdout = "exec\ncargo test\ndiff --git a/src/lib.rs b/src/lib.rs\nM src/lib.rs\n";

    let mut factory = ChunkFactory::new();
    let chunks = text::parse_console_output(stderr, stdout, &mut factory);
    let out = aggregate(&chunks, Some(TurnTiming { duration_ms: Some(900) }));

    let kinds: Vec<_> = out.timeline.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        [EntryKind::Thinking, EntryKind::Test, EntryKind::FileChange]
    );
    assert_eq!(out.timeline[0].title, "Tracking down the panic");
    // diff header and VCS status named the same file; one entry, one path.
    assert_eq!(out.timeline[2].files, ["src/lib.rs"]);
    assert_eq!(out.summary.status, TurnStatus::Success);
    assert_eq!(out.summary.meta.duration_ms, Some(900));
}

#[test]
fn structured_stream_turn_with_failing_tests() {
    let jsonl = concat!(
        "{\"type\":\"init\",\"session_id\":\"s-1\"}\n",
        "{\"type\":\"assistant\",\"text\":\"Running the suite first\"}\n",
        "{\"type\":\"tool_call\",\"id\":\"1\",\"tool\":\"execute\",\"command\":\"npm test\"}\n",
        "{\"type\":\"tool_result\",\"id\":\"1\",\"isError\":true,\"value\":\"2 failing\"}\n",
        "{\"type\":\"result\",\"result\":\"Could not fix the failures this turn.\"}\n",
    );

    let mut factory = ChunkFactory::new();
    let out = stream::parse_jsonl(jsonl, &mut factory);
    assert_eq!(out.summary.as_deref(), Some("Could not fix the failures this turn."));

    let agg = aggregate(&out.chunks, None);
    let test_entries: Vec<_> = agg
        .timeline
        .iter()
        .filter(|e| e.kind == EntryKind::Test)
        .collect();
    assert_eq!(test_entries.len(), 1);
    assert_eq!(test_entries[0].status, EntryStatus::Failed);
    assert!(test_entries[0].body.as_deref().unwrap().contains("2 failing"));
    assert_eq!(agg.summary.status, TurnStatus::Failed);
    assert_eq!(agg.summary.meta.tests_status, Some(TestsStatus::Failed));
    assert_eq!(agg.summary.bullets, ["Could not fix the failures this turn."]);
}

#[test]
fn streaming_prefixes_stay_stable() {
    let jsonl = concat!(
        "{\"type\":\"assistant\",\"text\":\"Checking the build\"}\n",
        "{\"type\":\"tool_call\",\"id\":\"1\",\"tool\":\"execute\",\"command\":\"cargo build\"}\n",
        "{\"type\":\"tool_result\",\"id\":\"1\",\"value\":\"Finished dev profile\"}\n",
        "{\"type\":\"tool_call\",\"id\":\"2\",\"tool\":\"edit\",\"path\":\"src/main.rs\"}\n",
        "{\"type\":\"result\",\"result\":\"Build fixed.\"}\n",
    );
    let mut factory = ChunkFactory::new();
    let full = stream::parse_jsonl(jsonl, &mut factory);

    // Re-aggregate on every growing prefix, as the live-render path does.
    let mut memo = MemoizedAggregator::new();
    let mut previous_len: usize = 0;
    for k in 0..=full.chunks.len() {
        let out = memo.aggregate(&full.chunks[..k], None);
        assert!(out.timeline.len() >= previous_len.saturating_sub(1));
        previous_len = out.timeline.len();
    }

    let final_out = memo.aggregate(&full.chunks, None);
    let kinds: Vec<_> = final_out.timeline.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        [
            EntryKind::Thinking,
            EntryKind::Command,
            EntryKind::FileChange,
            EntryKind::Final
        ]
    );
}

#[test]
fn interrupted_stream_still_aggregates() {
    // Transport cut the stream mid-tool-call; the prefix must stay usable.
    let jsonl = concat!(
        "{\"type\":\"assistant\",\"text\":\"Starting a long refactor\"}\n",
        "{\"type\":\"tool_call\",\"id\":\"1\",\"tool\":\"execute\",\"command\":\"pytest\"}\n",
        "{\"type\":\"tool_result\",\"id\":"
    );
    let mut factory = ChunkFactory::new();
    let out = stream::parse_jsonl(jsonl, &mut factory);
    assert_eq!(out.chunks.len(), 2);

    let agg = aggregate(&out.chunks, None);
    assert_eq!(agg.timeline.len(), 2);
    assert_eq!(agg.timeline[1].kind, EntryKind::Test);
    // No result arrived, so no failure is implied either.
    assert_eq!(agg.summary.status, TurnStatus::Success);
    assert_eq!(agg.summary.meta.tests_status, Some(TestsStatus::Passed));
    assert!(agg.summary.bullets.is_empty());
}

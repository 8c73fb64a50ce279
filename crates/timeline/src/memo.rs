use crate::aggregate::{aggregate, AggregateOutput};
use turnline_core::{Chunk, TurnTiming};

/// Rescan cache for the streaming path.
///
/// The chunk array is append-only within a turn, so `(len, last seq)` fully
/// identifies its contents; when the key is unchanged the previous output is
/// returned without rescanning. One memo per turn, like the factory.
#[derive(Debug, Default)]
pub struct MemoizedAggregator {
    key: Option<(usize, Option<u64>)>,
    cached: Option<AggregateOutput>,
}

impl MemoizedAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(&mut self, chunks: &[Chunk], timing: Option<TurnTiming>) -> AggregateOutput {
        let key = (chunks.len(), chunks.last().map(|c| c.seq));
        if self.key == Some(key) {
            if let Some(ref cached) = self.cached {
                return cached.clone();
            }
        }
        let out = aggregate(chunks, timing);
        self.key = Some(key);
        self.cached = Some(out.clone());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnline_core::{ChunkFactory, ChunkPayload};

    #[test]
    fn test_memo_matches_direct_aggregation() {
        let mut factory = ChunkFactory::new();
        let mut chunks = vec![factory.stamp(ChunkPayload::Thinking {
            text: "step one".to_string(),
        })];

        let mut memo = MemoizedAggregator::new();
        assert_eq!(memo.aggregate(&chunks, None), aggregate(&chunks, None));
        // Repeat call with the same prefix hits the cache path.
        assert_eq!(memo.aggregate(&chunks, None), aggregate(&chunks, None));

        chunks.push(factory.stamp(ChunkPayload::Run {
            cmd: "cargo test".to_string(),
            run_id: None,
        }));
        assert_eq!(memo.aggregate(&chunks, None), aggregate(&chunks, None));
    }

    #[test]
    fn test_memo_handles_empty_input() {
        let mut memo = MemoizedAggregator::new();
        let out = memo.aggregate(&[], None);
        assert!(out.timeline.is_empty());
        assert_eq!(memo.aggregate(&[], None), out);
    }
}

use crate::chunk::Chunk;
use std::collections::HashSet;
use thiserror::Error;

/// Diagnostic check of the per-turn chunk invariants. The aggregator never
/// requires this to have passed; it exists for transport and storage layers
/// that want to assert sequence integrity at a boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SequenceError {
    #[error("seq not strictly increasing at index {index}: {prev} then {seq}")]
    OutOfOrder { index: usize, prev: u64, seq: u64 },
    #[error("duplicate chunk id: {id}")]
    DuplicateId { id: String },
}

/// Validate that `seq` is strictly increasing and backend-assigned ids are
/// unique. Returns every violation found, not just the first.
pub fn validate_sequence(chunks: &[Chunk]) -> Result<(), Vec<SequenceError>> {
    let mut errors = Vec::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    let mut prev: Option<u64> = None;
    for (index, chunk) in chunks.iter().enumerate() {
        if let Some(prev_seq) = prev {
            if chunk.seq <= prev_seq {
                errors.push(SequenceError::OutOfOrder {
                    index,
                    prev: prev_seq,
                    seq: chunk.seq,
                });
            }
        }
        prev = Some(chunk.seq);

        if let Some(ref id) = chunk.id {
            if !id.is_empty() && !seen_ids.insert(id.as_str()) {
                errors.push(SequenceError::DuplicateId { id: id.clone() });
            }
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkFactory, ChunkPayload};

    fn thinking(factory: &mut ChunkFactory, text: &str) -> Chunk {
        factory.stamp(ChunkPayload::Thinking {
            text: text.to_string(),
        })
    }

    #[test]
    fn test_valid_sequence_passes() {
        let mut factory = ChunkFactory::new();
        let chunks = vec![thinking(&mut factory, "a"), thinking(&mut factory, "b")];
        assert!(validate_sequence(&chunks).is_ok());
    }

    #[test]
    fn test_out_of_order_detected() {
        let mut factory = ChunkFactory::new();
        let a = thinking(&mut factory, "a");
        let b = thinking(&mut factory, "b");
        let errors = validate_sequence(&[b, a]).unwrap_err();
        assert!(matches!(
            errors[0],
            SequenceError::OutOfOrder { index: 1, .. }
        ));
    }

    #[test]
    fn test_duplicate_ids_detected() {
        let mut factory = ChunkFactory::new();
        let a = factory.stamp_with_id(
            Some("x".to_string()),
            ChunkPayload::Edit {
                file: "a.rs".to_string(),
            },
        );
        let b = factory.stamp_with_id(
            Some("x".to_string()),
            ChunkPayload::Edit {
                file: "b.rs".to_string(),
            },
        );
        let errors = validate_sequence(&[a, b]).unwrap_err();
        assert!(matches!(errors[0], SequenceError::DuplicateId { .. }));
    }

    #[test]
    fn test_empty_sequence_is_valid() {
        assert!(validate_sequence(&[]).is_ok());
    }
}

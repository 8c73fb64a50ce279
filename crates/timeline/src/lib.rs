//! Turns a chunk sequence into user-facing timeline entries plus a turn
//! summary. One shared pure function serves both the live-render path (called
//! on every growing prefix while streaming) and the authoritative
//! post-completion path, so a mid-stream timeline and the final timeline
//! never diverge.

pub mod aggregate;
pub mod memo;

pub use aggregate::{aggregate, AggregateOutput};
pub use memo::MemoizedAggregator;

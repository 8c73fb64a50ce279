//! Format-specific adapters that translate raw coding-agent backend output
//! into the canonical [`turnline_core::Chunk`] model.
//!
//! Each backend speaks a different dialect: free-form console text, a
//! structured self-describing event stream, or a bespoke patch envelope.
//! Every adapter here is a total function over its input — no shape of raw
//! output may cause a panic; malformed pieces degrade to a generic log chunk
//! or are dropped.

pub mod noise;
pub mod patch;
pub mod stream;
pub mod text;

pub(crate) mod common;

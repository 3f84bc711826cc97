//! Trace sampling.
//!
//! # Design Decisions
//! - Decision depends only on the trace ID's lower 64 bits and the ratio
//! - Ratio and cut point are one immutable value swapped atomically
//! - Out-of-range ratios are rejected, never clamped

pub mod sampler;
pub mod trace_id;

pub use sampler::{DynamicSampler, SamplingDecision};
pub use trace_id::TraceId;

//! Trace-ID-ratio sampler with a runtime-mutable ratio.

use std::fmt;
use arc_swap::ArcSwap;
use crate::error::{DialError, DialResult};
use crate::sampling::trace_id::TraceId;

/// 2^63 as `f64`.
const ID_SPACE: f64 = 9_223_372_036_854_775_808.0;

/// Outcome of a sampling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingDecision {
    Drop,
    RecordAndSample,
}

impl SamplingDecision {
    pub fn is_sampled(&self) -> bool {
        matches!(self, SamplingDecision::RecordAndSample)
    }
}

/// Ratio and its derived cut point, always published together.
#[derive(Debug)]
struct RatioState {
    ratio: f64,
    id_upper_bound: i64,
}

impl RatioState {
    fn new(ratio: f64) -> DialResult<Self> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(DialError::InvalidArgument { ratio });
        }
        Ok(Self {
            ratio,
            id_upper_bound: id_upper_bound(ratio),
        })
    }

    fn admits(&self, magnitude: i64) -> bool {
        self.id_upper_bound == i64::MAX || magnitude < self.id_upper_bound
    }
}

fn decide(state: &RatioState, trace_id: &TraceId) -> SamplingDecision {
    let magnitude = trace_id.random_part().wrapping_abs();
    if state.admits(magnitude) {
        SamplingDecision::RecordAndSample
    } else {
        SamplingDecision::Drop
    }
}

fn id_upper_bound(ratio: f64) -> i64 {
    if ratio == 0.0 {
        i64::MIN
    } else if ratio == 1.0 {
        i64::MAX
    } else {
        // Saturating cast; rounding near 1.0 cannot exceed i64::MAX.
        (ratio * ID_SPACE).round() as i64
    }
}

/// Keeps `ratio` of all traces, deciding from the trace ID alone.
///
/// The decision for a given trace ID and ratio is stable, so every service
/// in a trace that shares the ratio agrees on it.
pub struct DynamicSampler {
    state: ArcSwap<RatioState>,
}

impl DynamicSampler {
    /// Create a sampler, failing with `InvalidArgument` outside `[0.0, 1.0]`.
    pub fn new(ratio: f64) -> DialResult<Self> {
        Ok(Self {
            state: ArcSwap::from_pointee(RatioState::new(ratio)?),
        })
    }

    /// Replace the ratio. On error the previous ratio stays in effect.
    pub fn set_ratio(&self, ratio: f64) -> DialResult<()> {
        let state = RatioState::new(ratio)?;
        self.state.store(std::sync::Arc::new(state));
        Ok(())
    }

    pub fn ratio(&self) -> f64 {
        self.state.load().ratio
    }

    /// Cut point compared against the trace ID magnitude.
    pub fn id_upper_bound(&self) -> i64 {
        self.state.load().id_upper_bound
    }

    pub fn should_sample(&self, trace_id: &TraceId) -> SamplingDecision {
        decide(&self.state.load(), trace_id)
    }

    /// `TraceIdRatioBased{0.250000}`, always with `.` as separator.
    pub fn description(&self) -> String {
        format!("TraceIdRatioBased{{{:.6}}}", self.ratio())
    }
}

impl PartialEq for DynamicSampler {
    fn eq(&self, other: &Self) -> bool {
        self.id_upper_bound() == other.id_upper_bound()
    }
}

impl fmt::Display for DynamicSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

impl fmt::Debug for DynamicSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.load();
        f.debug_struct("DynamicSampler")
            .field("ratio", &state.ratio)
            .field("id_upper_bound", &state.id_upper_bound)
            .finish()
    }
}

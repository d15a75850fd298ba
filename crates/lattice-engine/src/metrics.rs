//! Per-bar performance metrics for the propagation engine.
//!
//! [`BarReport`] captures timing and sizing data for a single `new_bar`
//! call, enabling callers to profile propagation cost without
//! instrumenting the engine themselves.

/// Timing and sizing metrics collected during a single bar's propagation.
///
/// All durations are in microseconds. The engine populates these fields
/// once propagation for a bar completes; `new_bar` returns the report
/// alongside the bar's result.
#[derive(Clone, Debug, Default)]
pub struct BarReport {
    /// The bar index this report describes (0-based, per [`RingBuffer::bars_completed`](crate::ring::RingBuffer::bars_completed) after the call).
    pub bar_index: u64,
    /// Wall-clock time for the entire bar, in microseconds.
    pub total_us: u64,
    /// Time spent validating the DAG, in microseconds. Non-zero only on
    /// the first `new_bar` call.
    pub validation_us: u64,
    /// Number of genesis fields injected this bar.
    pub fields_injected: usize,
    /// Number of derived fields that fired (window or cross-sectional)
    /// this bar.
    pub fields_fired: usize,
    /// Total number of `(asset, field)` cells written this bar, across
    /// injection and derived fields.
    pub cells_written: usize,
}

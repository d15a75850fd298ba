//! Simple moving average: a [`WindowOp`] reference implementation.

use lattice_core::Value;

use crate::ops::WindowOp;

/// Simple moving average over the window's values.
///
/// `op(v) = sum(v) / len(v)`. Partial windows (warm-up) return the missing
/// sentinel rather than an average over fewer bars than requested.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sma;

impl Sma {
    /// Construct a new SMA operation.
    pub fn new() -> Self {
        Self
    }
}

impl WindowOp for Sma {
    fn name(&self) -> &str {
        "sma"
    }

    fn op(&self, values: &[Value]) -> Value {
        let sum: f64 = values.iter().map(Value::raw).sum();
        Value::new(sum / values.len() as f64)
    }
}

//! Cross-sectional z-score: a [`CrossSectionalOp`] reference implementation.

use indexmap::IndexMap;
use lattice_core::{AssetId, Value};

use crate::ops::CrossSectionalOp;

/// Per-asset z-score relative to the cross-section's sample mean and
/// sample standard deviation.
///
/// `op(v) = (v - mean(v)) / stddev(v)`, where `stddev` uses the sample
/// variance (divisor `N - 1`). If fewer than 2 assets are present, sample
/// standard deviation is undefined and every asset receives the missing
/// sentinel.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZScore;

impl ZScore {
    /// Construct a new z-score operation.
    pub fn new() -> Self {
        Self
    }
}

impl CrossSectionalOp for ZScore {
    fn name(&self) -> &str {
        "z_score"
    }

    fn op(&self, cross_section: &IndexMap<AssetId, Value>) -> IndexMap<AssetId, Value> {
        let n = cross_section.len();
        if n < 2 {
            return cross_section
                .keys()
                .map(|asset| (asset.clone(), Value::MISSING))
                .collect();
        }

        let sum: f64 = cross_section.values().map(Value::raw).sum();
        let mean = sum / n as f64;
        let variance: f64 = cross_section
            .values()
            .map(|v| {
                let d = v.raw() - mean;
                d * d
            })
            .sum::<f64>()
            / (n - 1) as f64;
        let stddev = variance.sqrt();

        cross_section
            .iter()
            .map(|(asset, v)| (asset.clone(), Value::new((v.raw() - mean) / stddev)))
            .collect()
    }
}

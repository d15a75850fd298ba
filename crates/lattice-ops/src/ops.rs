//! The [`WindowOp`] and [`CrossSectionalOp`] traits.
//!
//! Operations are modular, stateless reducers invoked by the propagation
//! engine. They declare no dependencies themselves — the `dependent_field_id`
//! and (for window operations) `window_len` live on the
//! [`FieldDecl`](crate::field::FieldDecl) that registers them. The engine
//! gathers the input values per the protocol in the design notes and hands
//! the operation only the already-gathered slice or map; this keeps
//! operations trivially testable in isolation.

use indexmap::IndexMap;
use lattice_core::{AssetId, Value};

/// A per-asset reduction over the most recent `window_len` bars of a
/// single upstream field.
///
/// # Contract
///
/// - `op` and `partial_op` MUST be deterministic: same inputs produce
///   identical outputs.
/// - `&self` — window operations are stateless; any configuration (e.g. the
///   window length) is supplied at construction time, not derived at call
///   time.
///
/// # Object safety
///
/// This trait is object-safe; the field registry stores window operations
/// as `Box<dyn WindowOp>`.
pub trait WindowOp: Send + Sync + 'static {
    /// Human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// Reduce a full window of values, oldest-to-newest is NOT guaranteed;
    /// callers receive `values[0]` as the value just injected this bar and
    /// `values[k]` as the value `k` bars ago.
    ///
    /// Called only when `values.len() == window_len`.
    fn op(&self, values: &[Value]) -> Value;

    /// Reduce a partial window (warm-up period, `values.len() < window_len`).
    ///
    /// Default: the missing sentinel, regardless of partial content.
    fn partial_op(&self, _values: &[Value]) -> Value {
        Value::MISSING
    }
}

/// A per-bar reduction across all assets of a single upstream field.
///
/// # Contract
///
/// - `op` MUST return a value for every key present in its input map —
///   the engine assumes total coverage of the asset set (see the design
///   notes' open question on partial cross-sections).
/// - `op` MUST be deterministic.
///
/// # Object safety
///
/// This trait is object-safe; the field registry stores cross-sectional
/// operations as `Box<dyn CrossSectionalOp>`.
pub trait CrossSectionalOp: Send + Sync + 'static {
    /// Human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// Reduce the current bar's cross-section for the upstream field into
    /// a same-keyset mapping of per-asset results.
    fn op(&self, cross_section: &IndexMap<AssetId, Value>) -> IndexMap<AssetId, Value>;
}

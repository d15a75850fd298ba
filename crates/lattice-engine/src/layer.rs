//! [`BarLayer`]: key-value storage for a single bar.

use lattice_core::Value;

/// A dense row-major table of `(asset, field) -> value` for one bar.
///
/// Cells are addressed by precomputed integer indices rather than
/// [`AssetId`](lattice_core::AssetId)/[`FieldId`](lattice_core::FieldId)
/// directly; the owning [`RingBuffer`](crate::ring::RingBuffer) and
/// [`Lattice`](crate::engine::Lattice) translate identifiers to indices
/// once the asset and field sets are frozen at the first bar. This keeps
/// lookup O(1) and avoids per-cell hashing on the propagation hot path.
///
/// A layer never has two entries for the same cell within a bar: a
/// second [`insert`](Self::insert) for the same `(asset_idx, field_idx)`
/// is a bug and panics in debug builds.
#[derive(Debug)]
pub struct BarLayer {
    num_fields: usize,
    cells: Vec<Option<Value>>,
}

impl BarLayer {
    /// Create an empty layer sized for `num_assets` assets and
    /// `num_fields` fields.
    pub fn new(num_assets: usize, num_fields: usize) -> Self {
        Self {
            num_fields,
            cells: vec![None; num_assets * num_fields],
        }
    }

    fn index(&self, asset_idx: usize, field_idx: usize) -> usize {
        asset_idx * self.num_fields + field_idx
    }

    /// Idempotent-within-bar write. Writing the same cell twice in one
    /// bar's propagation is a bug: panics in debug builds, silently
    /// overwrites in release.
    pub fn insert(&mut self, asset_idx: usize, field_idx: usize, value: Value) {
        let idx = self.index(asset_idx, field_idx);
        debug_assert!(
            self.cells[idx].is_none(),
            "duplicate insert for cell (asset {asset_idx}, field {field_idx}) within one bar"
        );
        self.cells[idx] = Some(value);
    }

    /// Read a cell. Returns `None` if absent from this layer.
    pub fn get(&self, asset_idx: usize, field_idx: usize) -> Option<Value> {
        self.cells[self.index(asset_idx, field_idx)]
    }

    /// The cross-section for one field: `asset_idx -> value` for every
    /// asset present in this layer for that field.
    pub fn field_slice(&self, num_assets: usize, field_idx: usize) -> Vec<(usize, Value)> {
        (0..num_assets)
            .filter_map(|asset_idx| self.get(asset_idx, field_idx).map(|v| (asset_idx, v)))
            .collect()
    }
}

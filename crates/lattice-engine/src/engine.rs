//! [`Lattice`]: the propagation engine that drives field operations to
//! completion, bar by bar.

use std::time::Instant;

use indexmap::IndexMap;
use lattice_core::{AssetId, FieldId, LatticeError, Value};
use lattice_ops::{FieldDecl, FieldKind};

use crate::layer::BarLayer;
use crate::metrics::BarReport;
use crate::registry::FieldRegistry;
use crate::ring::RingBuffer;

/// A single bar's input: genesis field values per asset.
pub type BarData = IndexMap<AssetId, IndexMap<FieldId, Value>>;

/// The calculation lattice.
///
/// Holds a fixed asset set, a field registry, and a bounded ring of
/// historical [`BarLayer`]s. Field registration
/// ([`add_field`](Self::add_field)) is open until the first
/// [`new_bar`](Self::new_bar) call, which validates the dependency graph
/// exactly once and freezes it for the lattice's remaining lifetime.
pub struct Lattice {
    registry: FieldRegistry,
    ring: RingBuffer,
    assets: IndexMap<AssetId, usize>,
    assets_completed: Vec<usize>,
    cells_written_this_bar: usize,
    fired_mask_this_bar: Vec<bool>,
}

impl Lattice {
    /// Construct an empty lattice over a fixed asset set with the given
    /// ring capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0` or `assets` is empty.
    pub fn new(capacity: usize, assets: impl IntoIterator<Item = AssetId>) -> Self {
        let assets: IndexMap<AssetId, usize> = assets
            .into_iter()
            .enumerate()
            .map(|(idx, asset_id)| (asset_id, idx))
            .collect();
        assert!(!assets.is_empty(), "Lattice requires at least one asset");
        Self {
            registry: FieldRegistry::new(),
            ring: RingBuffer::new(capacity),
            assets,
            assets_completed: Vec::new(),
            cells_written_this_bar: 0,
            fired_mask_this_bar: Vec::new(),
        }
    }

    /// Register a field. See [`FieldRegistry::add_field`].
    pub fn add_field(&mut self, decl: FieldDecl) -> Result<(), LatticeError> {
        self.registry.add_field(decl)
    }

    /// Number of assets configured for this lattice.
    pub fn num_assets(&self) -> usize {
        self.assets.len()
    }

    /// Number of bars completed so far.
    pub fn bars_completed(&self) -> u64 {
        self.ring.bars_completed()
    }

    /// Inject one bar of genesis data and propagate it through every
    /// registered derived field.
    ///
    /// On the first call, locks the registry and validates the
    /// dependency graph; subsequent calls skip validation.
    ///
    /// # Errors
    ///
    /// [`LatticeError::BadDag`] or [`LatticeError::UnknownDependency`] on
    /// the first call if the graph is invalid; [`LatticeError::InconsistentGenesisFields`]
    /// if `data`'s per-asset field sets disagree;
    /// [`LatticeError::UnregisteredGenesisField`] if `data` names a field
    /// never registered via [`add_field`](Self::add_field).
    pub fn new_bar(&mut self, data: &BarData) -> Result<BarReport, LatticeError> {
        let start = Instant::now();

        let validation_us = if !self.registry.is_locked() {
            let validation_start = Instant::now();
            self.registry.lock()?;
            validation_start.elapsed().as_micros() as u64
        } else {
            0
        };

        let num_fields = self.registry.len();
        self.ring.advance(BarLayer::new(self.assets.len(), num_fields));
        self.assets_completed = vec![0; num_fields];
        self.cells_written_this_bar = 0;
        self.fired_mask_this_bar = vec![false; num_fields];

        let genesis_field_ids = self.install_genesis_cells(data)?;

        for field_id in &genesis_field_ids {
            let g_idx = self
                .registry
                .index_of(field_id)
                .expect("genesis field was just installed");

            for w_idx in self.registry.window_dependents(g_idx).to_vec() {
                for asset_idx in 0..self.assets.len() {
                    self.propagate(asset_idx, w_idx, None)?;
                }
            }

            for c_idx in self.registry.cross_dependents(g_idx).to_vec() {
                self.fire_cross_sectional(g_idx, c_idx);
            }
        }

        Ok(BarReport {
            bar_index: self.ring.bars_completed() - 1,
            total_us: start.elapsed().as_micros() as u64,
            validation_us,
            fields_injected: genesis_field_ids.len(),
            fields_fired: self.fired_mask_this_bar.iter().filter(|f| **f).count(),
            cells_written: self.cells_written_this_bar,
        })
    }

    /// Install `data`'s genesis cells into the freshly advanced current
    /// layer, validating that every asset carries the same field set as
    /// the first.
    fn install_genesis_cells(&mut self, data: &BarData) -> Result<Vec<FieldId>, LatticeError> {
        let mut genesis_field_ids: Option<Vec<&FieldId>> = None;

        for (asset_id, fields) in data {
            let mut keys: Vec<&FieldId> = fields.keys().collect();
            keys.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            match &genesis_field_ids {
                None => genesis_field_ids = Some(keys),
                Some(expected) => {
                    if &keys != expected {
                        return Err(LatticeError::InconsistentGenesisFields {
                            asset_id: asset_id.clone(),
                        });
                    }
                }
            }
        }

        for (asset_id, fields) in data {
            let Some(&asset_idx) = self.assets.get(asset_id) else {
                continue;
            };
            for (field_id, value) in fields {
                let field_idx = self.registry.index_of(field_id).ok_or_else(|| {
                    LatticeError::UnregisteredGenesisField {
                        field_id: field_id.clone(),
                    }
                })?;
                self.ring
                    .current_layer_mut()
                    .insert(asset_idx, field_idx, *value);
                self.cells_written_this_bar += 1;
            }
        }

        Ok(genesis_field_ids
            .unwrap_or_default()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Execute a cross-sectional field's op once, using the cross-section
    /// of its genesis upstream, then fan the result out to every asset.
    ///
    /// Used only for genesis-dependent cross-sectional fields: their
    /// upstream is already fully populated by [`install_genesis_cells`](Self::install_genesis_cells),
    /// so no `assets_completed` barrier is needed.
    fn fire_cross_sectional(&mut self, upstream_idx: usize, c_idx: usize) {
        let cross_section = self.gather_cross_section(upstream_idx);
        let result = self.run_cross_sectional_op(c_idx, &cross_section);
        for asset_idx in 0..self.assets.len() {
            let asset_id = self.assets.get_index(asset_idx).unwrap().0;
            let value = result.get(asset_id).copied().unwrap_or(Value::MISSING);
            // cs_value is always populated here, so propagate cannot fail.
            self.propagate(asset_idx, c_idx, Some(value))
                .expect("cross-sectional propagation with a prefetched value cannot fail");
        }
    }

    fn run_cross_sectional_op(
        &self,
        field_idx: usize,
        cross_section: &IndexMap<AssetId, Value>,
    ) -> IndexMap<AssetId, Value> {
        match self
            .registry
            .kind_at(field_idx)
            .expect("field index is registered")
        {
            FieldKind::CrossSectional { op, .. } => op.op(cross_section),
            _ => unreachable!("cross adjacency only points at CrossSectional fields"),
        }
    }

    fn gather_cross_section(&self, field_idx: usize) -> IndexMap<AssetId, Value> {
        let layer = self
            .ring
            .layer_ago(0)
            .expect("current layer exists once a bar has been advanced");
        self.assets
            .iter()
            .filter_map(|(asset_id, &asset_idx)| {
                layer
                    .get(asset_idx, field_idx)
                    .map(|value| (asset_id.clone(), value))
            })
            .collect()
    }

    /// Compute, insert, and recursively propagate one `(asset, field)`
    /// cell.
    ///
    /// `cs_value` is the prefetched cross-sectional result for this
    /// asset; required (and only used) when `field_idx` names a
    /// `CrossSectional` field.
    fn propagate(
        &mut self,
        asset_idx: usize,
        field_idx: usize,
        cs_value: Option<Value>,
    ) -> Result<(), LatticeError> {
        let produced = self.compute(asset_idx, field_idx, cs_value)?;

        let Some(value) = produced else {
            return Ok(());
        };

        // Unconditional insert: a value equal to the missing sentinel is
        // stored like any other, never skipped.
        self.ring
            .current_layer_mut()
            .insert(asset_idx, field_idx, value);
        self.cells_written_this_bar += 1;
        self.fired_mask_this_bar[field_idx] = true;

        for w_idx in self.registry.window_dependents(field_idx).to_vec() {
            self.propagate(asset_idx, w_idx, None)?;
        }

        self.assets_completed[field_idx] += 1;
        if self.assets_completed[field_idx] == self.assets.len() {
            for c_idx in self.registry.cross_dependents(field_idx).to_vec() {
                self.fire_cross_sectional(field_idx, c_idx);
            }
        }

        Ok(())
    }

    fn compute(
        &self,
        asset_idx: usize,
        field_idx: usize,
        cs_value: Option<Value>,
    ) -> Result<Option<Value>, LatticeError> {
        match self
            .registry
            .kind_at(field_idx)
            .expect("field index is registered")
        {
            FieldKind::Injection => Ok(None),
            FieldKind::CrossSectional { .. } => Ok(Some(
                cs_value.expect("cross-sectional propagate always receives a prefetched value"),
            )),
            FieldKind::Window {
                dependent_field_id,
                window_len,
                op,
            } => {
                let dep_idx = self
                    .registry
                    .index_of(dependent_field_id)
                    .expect("dependency was validated at lock time");
                let w = (*window_len)
                    .min(self.ring.bars_completed() as usize)
                    .min(self.ring.capacity());

                let mut values = Vec::with_capacity(w);
                for bars_ago in 0..w {
                    let layer = self.ring.layer_ago(bars_ago)?;
                    values.push(layer.get(asset_idx, dep_idx).unwrap_or(Value::MISSING));
                }

                Ok(Some(if w < *window_len {
                    op.partial_op(&values)
                } else {
                    op.op(&values)
                }))
            }
        }
    }

    /// Read a historical cell: `bars_ago` bars before the most recently
    /// completed bar.
    ///
    /// # Errors
    ///
    /// [`LatticeError::OutOfRange`], [`LatticeError::NotYetComputed`], or
    /// [`LatticeError::MissingCell`] if the cell is absent from the
    /// resolved layer.
    pub fn value_ago(
        &self,
        bars_ago: usize,
        asset_id: &AssetId,
        field_id: &FieldId,
    ) -> Result<Value, LatticeError> {
        let asset_idx = self
            .assets
            .get(asset_id)
            .copied()
            .ok_or_else(|| LatticeError::MissingCell {
                asset_id: asset_id.clone(),
                field_id: field_id.clone(),
            })?;
        let field_idx =
            self.registry
                .index_of(field_id)
                .ok_or_else(|| LatticeError::MissingCell {
                    asset_id: asset_id.clone(),
                    field_id: field_id.clone(),
                })?;
        let layer = self.ring.layer_ago(bars_ago)?;
        layer
            .get(asset_idx, field_idx)
            .ok_or_else(|| LatticeError::MissingCell {
                asset_id: asset_id.clone(),
                field_id: field_id.clone(),
            })
    }

    /// A tabular snapshot of the current layer: `(asset, field) -> value`
    /// for every cell currently populated.
    pub fn current_bar_snapshot(&self) -> IndexMap<(AssetId, FieldId), Value> {
        let Ok(layer) = self.ring.layer_ago(0) else {
            return IndexMap::new();
        };
        let mut snapshot = IndexMap::new();
        for (asset_id, &asset_idx) in &self.assets {
            for (field_idx, field_id, _) in self.registry.iter() {
                if let Some(value) = layer.get(asset_idx, field_idx) {
                    snapshot.insert((asset_id.clone(), field_id.clone()), value);
                }
            }
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_ops::builtin::{Sma, ZScore};

    fn bar(pairs: &[(&str, &[(&str, f64)])]) -> BarData {
        pairs
            .iter()
            .map(|(asset, fields)| {
                let field_map: IndexMap<FieldId, Value> = fields
                    .iter()
                    .map(|(f, v)| (FieldId::new(*f), Value::new(*v)))
                    .collect();
                (AssetId::new(*asset), field_map)
            })
            .collect()
    }

    #[test]
    fn injection_only_reads_back_by_bars_ago() {
        let mut lattice = Lattice::new(3, [AssetId::new("A"), AssetId::new("B")]);
        lattice.add_field(FieldDecl::injection("Open")).unwrap();

        lattice
            .new_bar(&bar(&[("A", &[("Open", 10.0)]), ("B", &[("Open", 20.0)])]))
            .unwrap();
        lattice
            .new_bar(&bar(&[("A", &[("Open", 11.0)]), ("B", &[("Open", 21.0)])]))
            .unwrap();

        assert_eq!(
            lattice
                .value_ago(0, &AssetId::new("A"), &FieldId::new("Open"))
                .unwrap(),
            Value::new(11.0)
        );
        assert_eq!(
            lattice
                .value_ago(1, &AssetId::new("B"), &FieldId::new("Open"))
                .unwrap(),
            Value::new(20.0)
        );
        assert!(matches!(
            lattice.value_ago(2, &AssetId::new("A"), &FieldId::new("Open")),
            Err(LatticeError::NotYetComputed { .. })
        ));
    }

    #[test]
    fn sma_warms_up_then_averages() {
        let mut lattice = Lattice::new(5, [AssetId::new("A")]);
        lattice.add_field(FieldDecl::injection("Open")).unwrap();
        lattice
            .add_field(FieldDecl::window("SMA3", "Open", 3, Sma))
            .unwrap();

        let mut results = Vec::new();
        for open in [1.0, 2.0, 3.0, 4.0] {
            lattice.new_bar(&bar(&[("A", &[("Open", open)])])).unwrap();
            results.push(
                lattice
                    .value_ago(0, &AssetId::new("A"), &FieldId::new("SMA3"))
                    .unwrap(),
            );
        }

        assert_eq!(
            results,
            vec![
                Value::MISSING,
                Value::MISSING,
                Value::new(2.0),
                Value::new(3.0),
            ]
        );
    }

    #[test]
    fn cross_sectional_zscore_matches_known_values() {
        let mut lattice = Lattice::new(2, [AssetId::new("A"), AssetId::new("B"), AssetId::new("C")]);
        lattice.add_field(FieldDecl::injection("Open")).unwrap();
        lattice
            .add_field(FieldDecl::cross_sectional("Z", "Open", ZScore))
            .unwrap();

        lattice
            .new_bar(&bar(&[
                ("A", &[("Open", 1.0)]),
                ("B", &[("Open", 2.0)]),
                ("C", &[("Open", 3.0)]),
            ]))
            .unwrap();

        assert_eq!(
            lattice.value_ago(0, &AssetId::new("A"), &FieldId::new("Z")).unwrap(),
            Value::new(-1.0)
        );
        assert_eq!(
            lattice.value_ago(0, &AssetId::new("B"), &FieldId::new("Z")).unwrap(),
            Value::new(0.0)
        );
        assert_eq!(
            lattice.value_ago(0, &AssetId::new("C"), &FieldId::new("Z")).unwrap(),
            Value::new(1.0)
        );
    }

    #[test]
    fn chain_depth_populates_every_cell_with_no_missing_reads() {
        let assets = [AssetId::new("A"), AssetId::new("B"), AssetId::new("C")];
        let mut lattice = Lattice::new(4, assets.clone());
        lattice.add_field(FieldDecl::injection("Open")).unwrap();
        lattice
            .add_field(FieldDecl::window("SMA2", "Open", 2, Sma))
            .unwrap();
        lattice
            .add_field(FieldDecl::cross_sectional("ZOfSMA2", "SMA2", ZScore))
            .unwrap();
        lattice
            .add_field(FieldDecl::window("SMA3OfZ", "ZOfSMA2", 3, Sma))
            .unwrap();

        for bar_idx in 0..5u32 {
            let base = bar_idx as f64;
            lattice
                .new_bar(&bar(&[
                    ("A", &[("Open", base + 1.0)]),
                    ("B", &[("Open", base + 2.0)]),
                    ("C", &[("Open", base + 3.0)]),
                ]))
                .unwrap();
        }

        let snapshot = lattice.current_bar_snapshot();
        for asset in &assets {
            for field in ["Open", "SMA2", "ZOfSMA2", "SMA3OfZ"] {
                assert!(
                    snapshot.contains_key(&(asset.clone(), FieldId::new(field))),
                    "missing cell for {asset} / {field}"
                );
            }
        }
    }

    #[test]
    fn duplicate_field_registration_leaves_lattice_usable() {
        let mut lattice = Lattice::new(2, [AssetId::new("A")]);
        lattice.add_field(FieldDecl::injection("Open")).unwrap();
        assert!(lattice.add_field(FieldDecl::injection("Open")).is_err());

        lattice
            .new_bar(&bar(&[("A", &[("Open", 1.0)])]))
            .unwrap();
        assert_eq!(
            lattice.value_ago(0, &AssetId::new("A"), &FieldId::new("Open")).unwrap(),
            Value::new(1.0)
        );
    }

    #[test]
    fn add_field_after_first_bar_is_rejected() {
        let mut lattice = Lattice::new(2, [AssetId::new("A")]);
        lattice.add_field(FieldDecl::injection("Open")).unwrap();
        lattice
            .new_bar(&bar(&[("A", &[("Open", 1.0)])]))
            .unwrap();

        let err = lattice.add_field(FieldDecl::injection("Close")).unwrap_err();
        assert_eq!(err, LatticeError::MutationAfterStart);
    }

    #[test]
    fn inconsistent_genesis_fields_are_rejected() {
        let mut lattice = Lattice::new(2, [AssetId::new("A"), AssetId::new("B")]);
        lattice.add_field(FieldDecl::injection("Open")).unwrap();
        lattice.add_field(FieldDecl::injection("Close")).unwrap();

        let mut data = IndexMap::new();
        data.insert(
            AssetId::new("A"),
            IndexMap::from([
                (FieldId::new("Open"), Value::new(1.0)),
                (FieldId::new("Close"), Value::new(2.0)),
            ]),
        );
        data.insert(
            AssetId::new("B"),
            IndexMap::from([(FieldId::new("Open"), Value::new(1.0))]),
        );

        let err = lattice.new_bar(&data).unwrap_err();
        assert_eq!(
            err,
            LatticeError::InconsistentGenesisFields {
                asset_id: AssetId::new("B")
            }
        );
    }

    #[test]
    fn window_len_one_is_identity_every_bar() {
        let mut lattice = Lattice::new(3, [AssetId::new("A")]);
        lattice.add_field(FieldDecl::injection("Open")).unwrap();
        lattice
            .add_field(FieldDecl::window("SMA1", "Open", 1, Sma))
            .unwrap();

        for open in [5.0, 6.0, 7.0] {
            lattice.new_bar(&bar(&[("A", &[("Open", open)])])).unwrap();
            assert_eq!(
                lattice.value_ago(0, &AssetId::new("A"), &FieldId::new("SMA1")).unwrap(),
                Value::new(open)
            );
        }
    }

    #[test]
    fn single_asset_zscore_is_missing() {
        let mut lattice = Lattice::new(2, [AssetId::new("A")]);
        lattice.add_field(FieldDecl::injection("Open")).unwrap();
        lattice
            .add_field(FieldDecl::cross_sectional("Z", "Open", ZScore))
            .unwrap();

        lattice.new_bar(&bar(&[("A", &[("Open", 42.0)])])).unwrap();
        assert!(
            lattice
                .value_ago(0, &AssetId::new("A"), &FieldId::new("Z"))
                .unwrap()
                .is_missing()
        );
    }

    #[test]
    fn window_len_greater_than_capacity_degrades_to_missing_forever() {
        let mut lattice = Lattice::new(2, [AssetId::new("A")]);
        lattice.add_field(FieldDecl::injection("Open")).unwrap();
        lattice
            .add_field(FieldDecl::window("SMA5", "Open", 5, Sma))
            .unwrap();

        for open in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0] {
            lattice.new_bar(&bar(&[("A", &[("Open", open)])])).unwrap();
            assert!(
                lattice
                    .value_ago(0, &AssetId::new("A"), &FieldId::new("SMA5"))
                    .unwrap()
                    .is_missing()
            );
        }
    }

    #[test]
    fn ring_invariant_rejects_capacity_ago_always() {
        let mut lattice = Lattice::new(2, [AssetId::new("A")]);
        lattice.add_field(FieldDecl::injection("Open")).unwrap();
        lattice.new_bar(&bar(&[("A", &[("Open", 1.0)])])).unwrap();
        lattice.new_bar(&bar(&[("A", &[("Open", 2.0)])])).unwrap();

        assert!(matches!(
            lattice.value_ago(2, &AssetId::new("A"), &FieldId::new("Open")),
            Err(LatticeError::OutOfRange { .. })
        ));
        assert!(lattice
            .value_ago(1, &AssetId::new("A"), &FieldId::new("Open"))
            .is_ok());
    }
}

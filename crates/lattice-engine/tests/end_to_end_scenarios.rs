//! Integration tests for the end-to-end bar scenarios: feeding a
//! sequence of bars through a public [`Lattice`] and checking the
//! resulting historical reads, exactly as a driver would.

use indexmap::IndexMap;
use lattice_core::{AssetId, FieldId, LatticeError, Value};
use lattice_engine::{BarData, Lattice};
use lattice_ops::builtin::{Sma, ZScore};
use lattice_ops::FieldDecl;

fn one_asset_bar(asset: &AssetId, field: &str, value: f64) -> BarData {
    let mut data = BarData::new();
    let mut fields = IndexMap::new();
    fields.insert(FieldId::new(field), Value::new(value));
    data.insert(asset.clone(), fields);
    data
}

#[test]
fn duplicate_field_rejection_does_not_disturb_later_bars() {
    let mut lattice = Lattice::new(4, [AssetId::new("A")]);
    lattice.add_field(FieldDecl::injection("Open")).unwrap();
    let err = lattice.add_field(FieldDecl::injection("Open")).unwrap_err();
    assert!(matches!(err, LatticeError::DuplicateField { .. }));

    let asset = AssetId::new("A");
    lattice.new_bar(&one_asset_bar(&asset, "Open", 10.0)).unwrap();
    lattice.new_bar(&one_asset_bar(&asset, "Open", 11.0)).unwrap();

    assert_eq!(
        lattice.value_ago(0, &asset, &FieldId::new("Open")).unwrap(),
        Value::new(11.0)
    );
}

#[test]
fn mutation_after_start_rejection_does_not_disturb_the_running_lattice() {
    let mut lattice = Lattice::new(4, [AssetId::new("A")]);
    lattice.add_field(FieldDecl::injection("Open")).unwrap();

    let asset = AssetId::new("A");
    lattice.new_bar(&one_asset_bar(&asset, "Open", 1.0)).unwrap();

    let err = lattice
        .add_field(FieldDecl::window("SMA3", "Open", 3, Sma))
        .unwrap_err();
    assert_eq!(err, LatticeError::MutationAfterStart);

    // The lattice is still usable for further bars.
    lattice.new_bar(&one_asset_bar(&asset, "Open", 2.0)).unwrap();
    assert_eq!(
        lattice.value_ago(0, &asset, &FieldId::new("Open")).unwrap(),
        Value::new(2.0)
    );
}

#[test]
fn full_chain_settles_with_every_cell_populated_after_five_bars() {
    let assets = [AssetId::new("A"), AssetId::new("B"), AssetId::new("C")];
    let mut lattice = Lattice::new(6, assets.clone());
    lattice.add_field(FieldDecl::injection("Open")).unwrap();
    lattice
        .add_field(FieldDecl::window("SMA2", "Open", 2, Sma))
        .unwrap();
    lattice
        .add_field(FieldDecl::cross_sectional("Z", "SMA2", ZScore))
        .unwrap();
    lattice
        .add_field(FieldDecl::window("SMA3OfZ", "Z", 3, Sma))
        .unwrap();

    for bar_idx in 0..5 {
        let mut data = BarData::new();
        for (offset, asset) in assets.iter().enumerate() {
            let mut fields = IndexMap::new();
            fields.insert(
                FieldId::new("Open"),
                Value::new(bar_idx as f64 + offset as f64 + 1.0),
            );
            data.insert(asset.clone(), fields);
        }
        lattice.new_bar(&data).unwrap();
    }

    for asset in &assets {
        for field in ["Open", "SMA2", "Z", "SMA3OfZ"] {
            let result = lattice.value_ago(0, asset, &FieldId::new(field));
            assert!(result.is_ok(), "expected a cell for {asset} / {field}");
        }
    }
}

#[test]
fn ring_capacity_three_rejects_reads_past_capacity() {
    let asset = AssetId::new("A");
    let mut lattice = Lattice::new(3, [asset.clone()]);
    lattice.add_field(FieldDecl::injection("Open")).unwrap();

    lattice.new_bar(&one_asset_bar(&asset, "Open", 10.0)).unwrap();
    lattice.new_bar(&one_asset_bar(&asset, "Open", 11.0)).unwrap();

    assert_eq!(
        lattice.value_ago(0, &asset, &FieldId::new("Open")).unwrap(),
        Value::new(11.0)
    );
    assert_eq!(
        lattice.value_ago(1, &asset, &FieldId::new("Open")).unwrap(),
        Value::new(10.0)
    );
    assert!(matches!(
        lattice.value_ago(2, &asset, &FieldId::new("Open")),
        Err(LatticeError::NotYetComputed { .. })
    ));
    assert!(matches!(
        lattice.value_ago(3, &asset, &FieldId::new("Open")),
        Err(LatticeError::OutOfRange { .. })
    ));
}

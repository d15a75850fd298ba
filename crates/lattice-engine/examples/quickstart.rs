//! Calculation lattice quickstart — a minimal backtest field graph
//! from scratch.
//!
//! Demonstrates:
//!   1. Constructing a lattice over a fixed asset set
//!   2. Registering a genesis field and two derived fields (window,
//!      cross-sectional)
//!   3. Feeding bars and reading back historical and current values
//!
//! Run with:
//!   cargo run --example quickstart

use lattice_core::{AssetId, FieldId, Value};
use lattice_engine::{BarData, Lattice};
use lattice_ops::builtin::{Sma, ZScore};
use lattice_ops::FieldDecl;

fn main() {
    println!("=== Calculation Lattice Quickstart ===\n");

    // 1. Construct a lattice: three assets, 8 bars of history.
    let assets = [AssetId::new("AAPL"), AssetId::new("MSFT"), AssetId::new("GOOG")];
    let mut lattice = Lattice::new(8, assets.clone());
    println!("Lattice created: {} assets, capacity 8\n", lattice.num_assets());

    // 2. Register fields: a genesis price field, a 3-bar SMA on it,
    //    and a cross-sectional z-score on the SMA.
    lattice.add_field(FieldDecl::injection("Open")).unwrap();
    lattice
        .add_field(FieldDecl::window("SMA3", "Open", 3, Sma))
        .unwrap();
    lattice
        .add_field(FieldDecl::cross_sectional("ZOfSMA3", "SMA3", ZScore))
        .unwrap();
    println!("Fields: Open (injection) -> SMA3 (window 3) -> ZOfSMA3 (cross-sectional)\n");

    // 3. Feed six bars of synthetic prices.
    let prices: [[f64; 3]; 6] = [
        [100.0, 200.0, 50.0],
        [101.0, 198.0, 51.0],
        [102.0, 202.0, 49.0],
        [103.0, 199.0, 52.0],
        [104.0, 201.0, 53.0],
        [105.0, 203.0, 54.0],
    ];

    for (bar_idx, row) in prices.iter().enumerate() {
        let mut data: BarData = BarData::new();
        for (asset, price) in assets.iter().zip(row.iter()) {
            let mut fields = indexmap::IndexMap::new();
            fields.insert(FieldId::new("Open"), Value::new(*price));
            data.insert(asset.clone(), fields);
        }

        let report = lattice.new_bar(&data).unwrap();
        println!(
            "bar {:>2}: fields_fired={}, cells_written={}, total_us={}",
            bar_idx, report.fields_fired, report.cells_written, report.total_us
        );
    }

    // 4. Read back SMA3 and ZOfSMA3 for the final bar.
    println!("\nFinal bar readings:");
    for asset in &assets {
        let sma3 = lattice.value_ago(0, asset, &FieldId::new("SMA3")).unwrap();
        let z = lattice.value_ago(0, asset, &FieldId::new("ZOfSMA3")).unwrap();
        println!("  {asset}: SMA3={sma3}, Z={z}");
    }

    // 5. Look two bars back on AAPL's raw Open price.
    let aapl = AssetId::new("AAPL");
    let open_two_ago = lattice.value_ago(2, &aapl, &FieldId::new("Open")).unwrap();
    println!("\nAAPL Open 2 bars ago: {open_two_ago}");
}

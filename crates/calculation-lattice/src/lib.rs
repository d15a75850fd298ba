//! Calculation lattice: an incremental, bar-driven dataflow engine for
//! backtesting time-series strategies.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the lattice's sub-crates. For most users, adding `calculation-lattice`
//! as a single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use calculation_lattice::prelude::*;
//!
//! let mut lattice = Lattice::new(4, [AssetId::new("A"), AssetId::new("B")]);
//! lattice.add_field(FieldDecl::injection("Open")).unwrap();
//! lattice
//!     .add_field(FieldDecl::window("SMA3", "Open", 3, Sma))
//!     .unwrap();
//!
//! let mut bar: BarData = BarData::new();
//! let mut fields = indexmap::IndexMap::new();
//! fields.insert(FieldId::new("Open"), Value::new(10.0));
//! bar.insert(AssetId::new("A"), fields.clone());
//! fields.insert(FieldId::new("Open"), Value::new(20.0));
//! bar.insert(AssetId::new("B"), fields);
//!
//! lattice.new_bar(&bar).unwrap();
//! assert_eq!(
//!     lattice.value_ago(0, &AssetId::new("A"), &FieldId::new("Open")).unwrap(),
//!     Value::new(10.0)
//! );
//! // SMA3 has not seen a full window yet: missing sentinel.
//! assert!(
//!     lattice
//!         .value_ago(0, &AssetId::new("A"), &FieldId::new("SMA3"))
//!         .unwrap()
//!         .is_missing()
//! );
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`core`] | `lattice-core` | IDs, values, error types |
//! | [`ops`] | `lattice-ops` | Field operation traits, built-in ops, field declarations |
//! | [`engine`] | `lattice-engine` | The lattice itself: ring buffer, registry, propagation |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identifiers, values, and error types (`lattice-core`).
///
/// Contains [`core::AssetId`], [`core::FieldId`], [`core::Value`], and
/// [`core::LatticeError`] — the vocabulary every other module builds on.
pub use lattice_core as core;

/// Field operation traits and built-in operations (`lattice-ops`).
///
/// The [`ops::WindowOp`] and [`ops::CrossSectionalOp`] traits are the main
/// extension points for user-defined derived fields;
/// [`ops::builtin`](lattice_ops::builtin) ships [`ops::builtin::Sma`](lattice_ops::builtin::Sma)
/// and [`ops::builtin::ZScore`](lattice_ops::builtin::ZScore).
pub use lattice_ops as ops;

/// The propagation engine (`lattice-engine`).
///
/// [`engine::Lattice`] is the entry point for driving bars through a
/// registered field graph.
pub use lattice_engine as engine;

/// Common imports for typical calculation-lattice usage.
///
/// ```rust
/// use calculation_lattice::prelude::*;
/// ```
///
/// This imports the most frequently used types: the lattice itself,
/// identifiers, values, field declarations, and the built-in operations.
pub mod prelude {
    // Core types
    pub use lattice_core::{AssetId, FieldId, LatticeError, Value};

    // Field operations
    pub use lattice_ops::builtin::{Sma, ZScore};
    pub use lattice_ops::{CrossSectionalOp, FieldDecl, FieldKind, WindowOp};

    // Engine
    pub use lattice_engine::{BarData, BarReport, Lattice};
}

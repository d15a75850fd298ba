//! The propagation engine, ring buffer, and field registry for the
//! calculation lattice.
//!
//! [`Lattice`] is the entry point: construct it with a fixed asset set
//! and ring capacity, register fields with [`Lattice::add_field`], then
//! drive it bar by bar with [`Lattice::new_bar`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod layer;
pub mod metrics;
pub mod registry;
pub mod ring;

pub use engine::{BarData, Lattice};
pub use metrics::BarReport;
pub use registry::FieldRegistry;

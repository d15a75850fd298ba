//! Field operation traits and built-in window/cross-sectional operations
//! for the calculation lattice.
//!
//! Defines [`WindowOp`] and [`CrossSectionalOp`], the extension points a
//! driver implements to add derived fields, plus [`FieldDecl`]/[`FieldKind`]
//! — the registration payload the field registry stores. [`builtin`]
//! ships the two reference operations required by the design: [`builtin::Sma`]
//! and [`builtin::ZScore`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builtin;
pub mod field;
pub mod ops;

pub use field::{FieldDecl, FieldKind};
pub use ops::{CrossSectionalOp, WindowOp};

//! Error taxonomy for the calculation lattice.
//!
//! Mirrors the error table in the design notes: registration errors,
//! DAG validation errors, and the historical-access/propagation errors
//! raised while a bar is being processed.

use std::error::Error;
use std::fmt;

use crate::id::FieldId;

/// Why a DAG failed validation at the first bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BadDagReason {
    /// The combined window/cross-sectional edge set contains a cycle.
    Circular,
    /// A non-injection field is not reachable from any injection field.
    Unreachable,
}

impl fmt::Display for BadDagReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Circular => write!(f, "circular dependency"),
            Self::Unreachable => write!(f, "unreachable from any injection field"),
        }
    }
}

/// All errors the lattice can raise.
///
/// `MutationAfterStart`, `DuplicateField`, and `BadDag` are registration/
/// validation errors: fatal to continued use of the lattice, or at least
/// to the registration attempt that triggered them. `OutOfRange`,
/// `NotYetComputed`, and `MissingCell` are raised during a bar's
/// propagation and indicate either caller error or a malformed DAG.
#[derive(Clone, Debug, PartialEq)]
pub enum LatticeError {
    /// `add_field` was called after the first `new_bar`.
    MutationAfterStart,
    /// A field with this ID was already registered.
    DuplicateField {
        /// The field that was registered twice.
        field_id: FieldId,
    },
    /// DAG validation failed at the first `new_bar`.
    BadDag {
        /// Why validation failed.
        reason: BadDagReason,
        /// The field implicated, if validation can pin one down.
        field_id: Option<FieldId>,
    },
    /// A historical index fell outside `[0, capacity)`.
    OutOfRange {
        /// The requested "bars ago" offset.
        requested: usize,
        /// The ring buffer's capacity.
        capacity: usize,
    },
    /// A historical index exceeds the number of bars completed so far.
    NotYetComputed {
        /// The requested "bars ago" offset.
        requested: usize,
        /// The number of bars completed so far.
        bars_completed: u64,
    },
    /// A read of `(asset, field)` found no entry in the requested layer.
    MissingCell {
        /// The asset that was queried.
        asset_id: crate::id::AssetId,
        /// The field that was queried.
        field_id: FieldId,
    },
    /// A non-injection field referenced a `dependent_field_id` that was
    /// never registered.
    UnknownDependency {
        /// The field whose dependency is unregistered.
        field_id: FieldId,
        /// The unregistered dependency.
        dependent_field_id: FieldId,
    },
    /// A `Window` field was registered with `window_len == 0`.
    InvalidWindowLen {
        /// The offending field.
        field_id: FieldId,
    },
    /// The bar supplied to `new_bar` did not carry the same genesis field
    /// set for every asset.
    InconsistentGenesisFields {
        /// The asset whose field set diverged from the first asset's.
        asset_id: crate::id::AssetId,
    },
    /// The bar supplied to `new_bar` carried a value for a field that was
    /// never registered as a genesis field via `add_field`.
    UnregisteredGenesisField {
        /// The unregistered field referenced by the input bar.
        field_id: FieldId,
    },
}

impl fmt::Display for LatticeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MutationAfterStart => {
                write!(f, "add_field called after the first new_bar")
            }
            Self::DuplicateField { field_id } => {
                write!(f, "field '{field_id}' is already registered")
            }
            Self::BadDag { reason, field_id } => {
                write!(f, "dependency graph is invalid: {reason}")?;
                if let Some(field_id) = field_id {
                    write!(f, " (at field '{field_id}')")?;
                }
                Ok(())
            }
            Self::OutOfRange {
                requested,
                capacity,
            } => {
                write!(
                    f,
                    "requested {requested} bars ago but ring capacity is {capacity}"
                )
            }
            Self::NotYetComputed {
                requested,
                bars_completed,
            } => {
                write!(
                    f,
                    "requested {requested} bars ago but only {bars_completed} bars are completed"
                )
            }
            Self::MissingCell { asset_id, field_id } => {
                write!(f, "no cell for asset '{asset_id}' field '{field_id}'")
            }
            Self::UnknownDependency {
                field_id,
                dependent_field_id,
            } => {
                write!(
                    f,
                    "field '{field_id}' depends on unregistered field '{dependent_field_id}'"
                )
            }
            Self::InvalidWindowLen { field_id } => {
                write!(f, "field '{field_id}' has window_len == 0")
            }
            Self::InconsistentGenesisFields { asset_id } => {
                write!(
                    f,
                    "asset '{asset_id}' did not carry the same genesis fields as the first asset"
                )
            }
            Self::UnregisteredGenesisField { field_id } => {
                write!(
                    f,
                    "new_bar supplied a value for unregistered field '{field_id}'"
                )
            }
        }
    }
}

impl Error for LatticeError {}

//! Field declarations: the catalog entries a driver registers before the
//! first bar.

use lattice_core::FieldId;

use crate::ops::{CrossSectionalOp, WindowOp};

/// Classification of a field's computation, tagged with its payload.
///
/// Modeled as a sum type rather than runtime class-hierarchy inspection:
/// the propagation engine matches on this tag exactly once per firing.
pub enum FieldKind {
    /// A genesis field. Values are supplied verbatim in `new_bar`'s input;
    /// the engine never computes them.
    Injection,
    /// A per-asset reduction over the most recent `window_len` bars of
    /// `dependent_field_id`.
    Window {
        /// The single upstream field this operation reads.
        dependent_field_id: FieldId,
        /// Number of bars the reduction spans.
        window_len: usize,
        /// The reduction itself.
        op: Box<dyn WindowOp>,
    },
    /// A per-bar reduction across all assets of `dependent_field_id`.
    CrossSectional {
        /// The single upstream field this operation reads.
        dependent_field_id: FieldId,
        /// The reduction itself.
        op: Box<dyn CrossSectionalOp>,
    },
}

impl FieldKind {
    /// The upstream field this kind depends on, if any.
    pub fn dependent_field_id(&self) -> Option<&FieldId> {
        match self {
            Self::Injection => None,
            Self::Window {
                dependent_field_id, ..
            } => Some(dependent_field_id),
            Self::CrossSectional {
                dependent_field_id, ..
            } => Some(dependent_field_id),
        }
    }
}

/// A declaration carrying a [`FieldId`] and its [`FieldKind`].
///
/// Registered once, before the first bar, via the engine's `add_field`.
/// The set of declarations becomes immutable after the first `new_bar`
/// call.
pub struct FieldDecl {
    /// Unique-within-lattice identifier for this field.
    pub field_id: FieldId,
    /// The field's computation kind.
    pub kind: FieldKind,
}

impl FieldDecl {
    /// Declare a genesis (injection) field.
    pub fn injection(field_id: impl Into<FieldId>) -> Self {
        Self {
            field_id: field_id.into(),
            kind: FieldKind::Injection,
        }
    }

    /// Declare a window field over `dependent_field_id`.
    pub fn window(
        field_id: impl Into<FieldId>,
        dependent_field_id: impl Into<FieldId>,
        window_len: usize,
        op: impl WindowOp,
    ) -> Self {
        Self {
            field_id: field_id.into(),
            kind: FieldKind::Window {
                dependent_field_id: dependent_field_id.into(),
                window_len,
                op: Box::new(op),
            },
        }
    }

    /// Declare a cross-sectional field over `dependent_field_id`.
    pub fn cross_sectional(
        field_id: impl Into<FieldId>,
        dependent_field_id: impl Into<FieldId>,
        op: impl CrossSectionalOp,
    ) -> Self {
        Self {
            field_id: field_id.into(),
            kind: FieldKind::CrossSectional {
                dependent_field_id: dependent_field_id.into(),
                op: Box::new(op),
            },
        }
    }
}

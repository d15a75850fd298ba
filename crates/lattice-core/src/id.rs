//! Strongly-typed identifiers for assets and fields.

use std::fmt;
use std::sync::Arc;

/// Identifies a tradable asset (e.g. a ticker symbol) within a lattice.
///
/// Backed by an `Arc<str>` so that clones are cheap regardless of how many
/// times the identifier is threaded through bar layers and dependency maps.
/// Equality and hashing are delegated to the underlying label.
#[derive(Clone, Debug, Eq)]
pub struct AssetId(Arc<str>);

impl AssetId {
    /// Create a new asset identifier from any string-like value.
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self(label.into())
    }

    /// The underlying label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for AssetId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl std::hash::Hash for AssetId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

impl From<String> for AssetId {
    fn from(v: String) -> Self {
        Self::new(v)
    }
}

/// Identifies a field (genesis or derived) within a lattice.
///
/// Field names are globally unique within a single lattice instance; see
/// [`DuplicateField`](crate::error::LatticeError::DuplicateField).
#[derive(Clone, Debug, Eq)]
pub struct FieldId(Arc<str>);

impl FieldId {
    /// Create a new field identifier from any string-like value.
    pub fn new(label: impl Into<Arc<str>>) -> Self {
        Self(label.into())
    }

    /// The underlying label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for FieldId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl std::hash::Hash for FieldId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FieldId {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

impl From<String> for FieldId {
    fn from(v: String) -> Self {
        Self::new(v)
    }
}

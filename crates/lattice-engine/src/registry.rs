//! [`FieldRegistry`]: the catalog of declared fields and their dependency
//! graph, validated once at the first bar.

use indexmap::{IndexMap, IndexSet};
use lattice_core::{BadDagReason, FieldId, LatticeError};
use lattice_ops::{FieldDecl, FieldKind};

/// Three-color marks for the cycle-detection DFS.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// The registry of declared fields, indexed by insertion order.
///
/// Insertion order doubles as each field's dense storage index: the
/// first field registered is index 0, and so on. This lets
/// [`BarLayer`](crate::layer::BarLayer) and [`RingBuffer`](crate::ring::RingBuffer)
/// address fields by `usize` without a second lookup table.
///
/// Registration is open until [`lock`](Self::lock) is called (which the
/// engine does on the first `new_bar`); after that, [`add_field`](Self::add_field)
/// returns [`LatticeError::MutationAfterStart`].
pub struct FieldRegistry {
    fields: IndexMap<FieldId, FieldKind>,
    /// `window_adjacency[i]` holds the dense indices of every `Window`
    /// field whose `dependent_field_id` is the field at index `i`. Built
    /// once in [`lock`](Self::lock); empty before that.
    window_adjacency: Vec<Vec<usize>>,
    /// Same as `window_adjacency` but for `CrossSectional` dependents.
    cross_adjacency: Vec<Vec<usize>>,
    locked: bool,
}

impl FieldRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
            window_adjacency: Vec::new(),
            cross_adjacency: Vec::new(),
            locked: false,
        }
    }

    /// Register a field declaration.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::MutationAfterStart`] if called after [`lock`](Self::lock).
    /// - [`LatticeError::DuplicateField`] if `decl.field_id` is already registered.
    /// - [`LatticeError::InvalidWindowLen`] if a `Window` field declares `window_len == 0`.
    pub fn add_field(&mut self, decl: FieldDecl) -> Result<(), LatticeError> {
        if self.locked {
            return Err(LatticeError::MutationAfterStart);
        }
        if self.fields.contains_key(&decl.field_id) {
            return Err(LatticeError::DuplicateField {
                field_id: decl.field_id,
            });
        }
        if let FieldKind::Window { window_len, .. } = &decl.kind {
            if *window_len == 0 {
                return Err(LatticeError::InvalidWindowLen {
                    field_id: decl.field_id,
                });
            }
        }
        self.fields.insert(decl.field_id, decl.kind);
        Ok(())
    }

    /// Freeze the registry and validate its dependency graph.
    ///
    /// Checks, in order: every non-injection field's `dependent_field_id`
    /// is registered; the dependency graph (treating each non-injection
    /// field as an edge to its dependent) is acyclic; every non-injection
    /// field is reachable from some injection field.
    ///
    /// Idempotent: calling `lock` a second time is a no-op that re-runs
    /// validation against the now-frozen field set (cheap, and harmless
    /// since registration cannot have changed).
    ///
    /// # Errors
    ///
    /// [`LatticeError::UnknownDependency`], [`LatticeError::BadDag`].
    pub fn lock(&mut self) -> Result<(), LatticeError> {
        self.validate()?;
        self.build_adjacency();
        self.locked = true;
        Ok(())
    }

    fn build_adjacency(&mut self) {
        let n = self.fields.len();
        self.window_adjacency = vec![Vec::new(); n];
        self.cross_adjacency = vec![Vec::new(); n];
        for (idx, (_, kind)) in self.fields.iter().enumerate() {
            match kind {
                FieldKind::Window {
                    dependent_field_id, ..
                } => {
                    let dep_idx = self.fields.get_index_of(dependent_field_id).expect(
                        "dependent_field_id was validated to exist before adjacency is built",
                    );
                    self.window_adjacency[dep_idx].push(idx);
                }
                FieldKind::CrossSectional {
                    dependent_field_id, ..
                } => {
                    let dep_idx = self.fields.get_index_of(dependent_field_id).expect(
                        "dependent_field_id was validated to exist before adjacency is built",
                    );
                    self.cross_adjacency[dep_idx].push(idx);
                }
                FieldKind::Injection => {}
            }
        }
    }

    /// Dense indices of the `Window` fields directly dependent on field `idx`.
    ///
    /// Empty before [`lock`](Self::lock) has been called.
    pub fn window_dependents(&self, idx: usize) -> &[usize] {
        self.window_adjacency
            .get(idx)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Dense indices of the `CrossSectional` fields directly dependent on field `idx`.
    ///
    /// Empty before [`lock`](Self::lock) has been called.
    pub fn cross_dependents(&self, idx: usize) -> &[usize] {
        self.cross_adjacency
            .get(idx)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether [`lock`](Self::lock) has been called.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the registry holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The dense storage index for `field_id`, if registered.
    pub fn index_of(&self, field_id: &FieldId) -> Option<usize> {
        self.fields.get_index_of(field_id)
    }

    /// The field kind at dense index `idx`.
    pub fn kind_at(&self, idx: usize) -> Option<&FieldKind> {
        self.fields.get_index(idx).map(|(_, kind)| kind)
    }

    /// The field kind for `field_id`.
    pub fn kind_of(&self, field_id: &FieldId) -> Option<&FieldKind> {
        self.fields.get(field_id)
    }

    /// Iterate fields in registration (= dense index) order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FieldId, &FieldKind)> {
        self.fields
            .iter()
            .enumerate()
            .map(|(idx, (field_id, kind))| (idx, field_id, kind))
    }

    fn validate(&self) -> Result<(), LatticeError> {
        for (field_id, kind) in &self.fields {
            if let Some(dep) = kind.dependent_field_id() {
                if !self.fields.contains_key(dep) {
                    return Err(LatticeError::UnknownDependency {
                        field_id: field_id.clone(),
                        dependent_field_id: dep.clone(),
                    });
                }
            }
        }

        self.check_acyclic()?;
        self.check_reachable_from_injection()?;
        Ok(())
    }

    /// Depth-first cycle detection over the "depends on" edges.
    fn check_acyclic(&self) -> Result<(), LatticeError> {
        let mut marks: IndexMap<&FieldId, Mark> =
            self.fields.keys().map(|id| (id, Mark::Unvisited)).collect();

        for start in self.fields.keys() {
            if marks[start] == Mark::Unvisited {
                self.visit_acyclic(start, &mut marks)?;
            }
        }
        Ok(())
    }

    fn visit_acyclic<'a>(
        &'a self,
        field_id: &'a FieldId,
        marks: &mut IndexMap<&'a FieldId, Mark>,
    ) -> Result<(), LatticeError> {
        marks.insert(field_id, Mark::InProgress);

        if let Some(dep) = self.fields[field_id].dependent_field_id() {
            match marks.get(dep).copied().unwrap_or(Mark::Unvisited) {
                Mark::InProgress => {
                    return Err(LatticeError::BadDag {
                        reason: BadDagReason::Circular,
                        field_id: Some(field_id.clone()),
                    });
                }
                Mark::Unvisited => self.visit_acyclic(dep, marks)?,
                Mark::Done => {}
            }
        }

        marks.insert(field_id, Mark::Done);
        Ok(())
    }

    /// Every non-injection field must be reachable by following
    /// "depends on" edges back to some injection field.
    fn check_reachable_from_injection(&self) -> Result<(), LatticeError> {
        for (field_id, kind) in &self.fields {
            if kind.dependent_field_id().is_none() {
                continue;
            }
            if !self.reaches_injection(field_id, &mut IndexSet::new()) {
                return Err(LatticeError::BadDag {
                    reason: BadDagReason::Unreachable,
                    field_id: Some(field_id.clone()),
                });
            }
        }
        Ok(())
    }

    fn reaches_injection<'a>(&'a self, field_id: &'a FieldId, seen: &mut IndexSet<&'a FieldId>) -> bool {
        // Cycles are already rejected by `check_acyclic`, but guard
        // against infinite recursion if called before that check.
        if !seen.insert(field_id) {
            return false;
        }
        match self.fields[field_id].dependent_field_id() {
            None => true,
            Some(dep) => self.reaches_injection(dep, seen),
        }
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

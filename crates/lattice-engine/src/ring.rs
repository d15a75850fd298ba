//! [`RingBuffer`]: fixed-capacity history of [`BarLayer`]s.

use lattice_core::LatticeError;

use crate::layer::BarLayer;

/// A tagged slot: the `u64` is the monotonic bar index this layer was
/// written at, letting [`get`](RingBuffer::get) recognize a slot that has
/// since been overwritten and reject it as evicted rather than returning
/// stale data at the wrong offset.
type Slot = Option<(u64, BarLayer)>;

/// A fixed-capacity ring buffer of [`BarLayer`]s, addressed by
/// "bars ago" relative to the most recently completed bar.
///
/// Single-threaded and non-reentrant: all methods take `&mut self` or
/// assume no concurrent [`advance`](Self::advance) call is in flight.
/// The write position (`bars_injected`) is monotonically increasing and
/// never wraps; slot index is `position % capacity`.
pub struct RingBuffer {
    slots: Vec<Slot>,
    capacity: usize,
    bars_injected: u64,
}

impl RingBuffer {
    /// Create an empty ring buffer with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be > 0");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            capacity,
            bars_injected: 0,
        }
    }

    /// Push a new layer, evicting whatever previously occupied its slot.
    ///
    /// Bumps `bars_injected` after storing the layer, so the layer just
    /// pushed is "0 bars ago" immediately after this call returns.
    pub fn advance(&mut self, layer: BarLayer) {
        let pos = self.bars_injected;
        let slot_idx = (pos as usize) % self.capacity;
        self.slots[slot_idx] = Some((pos, layer));
        self.bars_injected += 1;
    }

    /// Number of bars completed so far (i.e. `advance` calls made).
    pub fn bars_completed(&self) -> u64 {
        self.bars_injected
    }

    /// The ring buffer's capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Borrow the layer `bars_ago` bars before the most recently
    /// completed bar. `bars_ago == 0` is the most recent bar.
    ///
    /// # Errors
    ///
    /// - [`LatticeError::OutOfRange`] if `bars_ago >= capacity`.
    /// - [`LatticeError::NotYetComputed`] if fewer than `bars_ago + 1`
    ///   bars have been completed, or if the requested slot was evicted
    ///   by a later write (this can only happen if `bars_ago >= capacity`,
    ///   which `OutOfRange` already covers, but the tag check is kept as
    ///   a belt-and-suspenders guard against index arithmetic bugs).
    pub fn layer_ago(&self, bars_ago: usize) -> Result<&BarLayer, LatticeError> {
        if bars_ago >= self.capacity {
            return Err(LatticeError::OutOfRange {
                requested: bars_ago,
                capacity: self.capacity,
            });
        }
        if bars_ago as u64 >= self.bars_injected {
            return Err(LatticeError::NotYetComputed {
                requested: bars_ago,
                bars_completed: self.bars_injected,
            });
        }

        let target_pos = self.bars_injected - 1 - bars_ago as u64;
        let slot_idx = (target_pos as usize) % self.capacity;
        match &self.slots[slot_idx] {
            Some((tag, layer)) if *tag == target_pos => Ok(layer),
            _ => Err(LatticeError::NotYetComputed {
                requested: bars_ago,
                bars_completed: self.bars_injected,
            }),
        }
    }

    /// Mutably borrow the layer currently being written (the one most
    /// recently pushed by [`advance`](Self::advance)).
    ///
    /// # Panics
    ///
    /// Panics if no bar has been advanced yet; the engine always calls
    /// [`advance`](Self::advance) before writing to the current layer.
    pub fn current_layer_mut(&mut self) -> &mut BarLayer {
        let pos = self.bars_injected - 1;
        let slot_idx = (pos as usize) % self.capacity;
        match &mut self.slots[slot_idx] {
            Some((tag, layer)) if *tag == pos => layer,
            _ => unreachable!("current layer must be the slot just written by advance"),
        }
    }
}

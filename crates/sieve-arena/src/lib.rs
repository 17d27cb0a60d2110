//! Batched arena allocation for short-lived wire storage.
//!
//! A [`Pool`] hands out contiguous runs of slots and never moves or reuses a
//! slot once allocated — a [`Run`] returned by [`Pool::allocate`] stays valid
//! for the pool's whole lifetime, even after [`Pool::free`]. This gives
//! pointer-stable storage without raw pointers: callers address slots by
//! `usize` index instead, which is what lets a [`Run`] be copied freely
//! between a caller scope and a callee scope to express remapping (see
//! `sieve-interpreter::Scope`).

use std::fmt;

/// A contiguous, stable handle into a [`Pool`].
///
/// `Run`s are cheap to copy and carry no lifetime — they remain valid for as
/// long as the originating `Pool` is alive, regardless of intervening
/// allocations or frees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Run {
    base: usize,
    len: usize,
}

impl Run {
    pub fn base(self) -> usize {
        self.base
    }

    pub fn len(self) -> usize {
        self.len
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    /// The `i`-th slot index within this run, or `None` if out of bounds.
    pub fn index(self, i: usize) -> Option<usize> {
        (i < self.len).then_some(self.base + i)
    }

    /// Split off a sub-run `[offset, offset+len)`. Returns `None` if it
    /// would fall outside this run.
    pub fn sub(self, offset: usize, len: usize) -> Option<Run> {
        if offset + len > self.len {
            return None;
        }
        Some(Run {
            base: self.base + offset,
            len,
        })
    }
}

struct Slot<T> {
    // `None` marks a freed (tombstoned) slot; the index is never reused.
    value: Option<T>,
}

/// An append-only arena of `T`, addressed by stable `usize` indices.
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.slots.len())
            .finish()
    }
}

impl<T: Default> Pool<T> {
    /// Allocate `n` default-constructed slots and return the run covering
    /// them. All objects are destructed and the memory released when the
    /// pool itself is dropped.
    pub fn allocate(&mut self, n: usize) -> Run {
        let base = self.slots.len();
        self.slots.reserve(n);
        for _ in 0..n {
            self.slots.push(Slot {
                value: Some(T::default()),
            });
        }
        Run { base, len: n }
    }
}

impl<T: Default> Pool<T> {
    /// Extend `run` by `n` more default-constructed slots, provided no
    /// other allocation has happened since `run` was issued (i.e. `run`
    /// still ends at the pool's current tail). Returns `None`, leaving
    /// the pool unchanged, if that no-longer holds — the caller should
    /// fall back to a fresh [`Pool::allocate`] in that case.
    pub fn extend(&mut self, run: Run, n: usize) -> Option<Run> {
        if run.base + run.len != self.slots.len() {
            return None;
        }
        self.slots.reserve(n);
        for _ in 0..n {
            self.slots.push(Slot {
                value: Some(T::default()),
            });
        }
        Some(Run {
            base: run.base,
            len: run.len + n,
        })
    }
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the values in `run`, tombstoning the slots. The indices stay
    /// allocated (never reused) so any other `Run` referencing them keeps
    /// its indices meaningful, but reads return `None` afterward.
    pub fn free(&mut self, run: Run) {
        for i in run.base..run.base + run.len {
            if let Some(slot) = self.slots.get_mut(i) {
                slot.value = None;
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots.get_mut(index).and_then(|s| s.value.as_mut())
    }

    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                slot.value = Some(value);
                true
            }
            None => false,
        }
    }

    /// True if the slot exists and has not been freed.
    pub fn is_live(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot { value: Some(_) }))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

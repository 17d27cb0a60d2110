//! A [`Scope`] owns one type's wire bookkeeping within one call frame:
//! which wire indices exist, which are assigned, which are still active,
//! and where each lives in the owning [`crate::TypeInterpreter`]'s
//! [`Pool`]. Mirrors `wtk::nails::Scope<Wire_T>` (spec.md §3/§4.C),
//! generalized to address storage by [`Run`] instead of a raw pointer
//! (spec.md §9).

use std::marker::PhantomData;

use sieve_arena::{Pool, Run};
use sieve_ir::WireIdx;
use sieve_ranges::SkipList;

use crate::error::ScopeError;

struct RangeEntry {
    first: WireIdx,
    last: WireIdx,
    run: Run,
    /// Fixed-size by an explicit `@new` directive; cannot be deleted
    /// piecewise, only as a whole matching span.
    new_range: bool,
    /// Refers to caller-owned storage installed by `map_inputs`/`map_outputs`.
    remapped: bool,
    /// May absorb an immediately-adjacent `assign` by extending in place.
    can_grow: bool,
}

/// Per-type, per-frame wire memory: reserved ranges plus the `assigned`/
/// `active` skip-lists that define which wires currently exist.
pub struct Scope<V> {
    // Coindexed with `ranges`; `offsets[i] == ranges[i].first`. Sorted
    // ascending, binary-searched by `find_range_index`.
    offsets: Vec<WireIdx>,
    ranges: Vec<RangeEntry>,
    assigned: SkipList,
    active: SkipList,
    /// Wire indices `< first_local` must be remapped; `>= first_local`
    /// must be local. Advances with every `map_outputs`/`map_inputs`.
    first_local: WireIdx,
    _value: PhantomData<V>,
}

impl<V> Default for Scope<V> {
    fn default() -> Self {
        Self {
            offsets: Vec::new(),
            ranges: Vec::new(),
            assigned: SkipList::new(),
            active: SkipList::new(),
            first_local: 0,
            _value: PhantomData,
        }
    }
}

impl<V> Scope<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_local(&self) -> WireIdx {
        self.first_local
    }

    fn find_range_index(&self, idx: WireIdx) -> Option<usize> {
        let pos = self.offsets.partition_point(|&o| o <= idx);
        if pos == 0 {
            return None;
        }
        let candidate = pos - 1;
        (self.ranges[candidate].last >= idx).then_some(candidate)
    }

    fn overlaps_existing(&self, first: WireIdx, last: WireIdx) -> bool {
        self.ranges
            .iter()
            .any(|r| r.first <= last && first <= r.last)
    }

    fn insert_entry(&mut self, entry: RangeEntry) {
        let pos = self.offsets.partition_point(|&o| o < entry.first);
        self.offsets.insert(pos, entry.first);
        self.ranges.insert(pos, entry);
    }

    fn remove_entry(&mut self, idx: usize) {
        self.offsets.remove(idx);
        self.ranges.remove(idx);
    }

    /// Reserve a fresh range `[first, last]`, fixed-size (`@new`).
    pub fn new_range(
        &mut self,
        pool: &mut Pool<V>,
        first: WireIdx,
        last: WireIdx,
    ) -> Result<(), ScopeError>
    where
        V: Default,
    {
        if first > last {
            return Err(ScopeError::Discontiguous);
        }
        if self.overlaps_existing(first, last) {
            return Err(ScopeError::AlreadyExists);
        }
        let run = pool.allocate((last - first + 1) as usize);
        self.insert_entry(RangeEntry {
            first,
            last,
            run,
            new_range: true,
            remapped: false,
            can_grow: false,
        });
        Ok(())
    }

    /// Delete `[first, last]`. Succeeds only when the request matches a
    /// whole `@new` range, or lies within (and may be a strict subrange
    /// of) a single ordinary range — never when it spans more than one
    /// stored range (spec.md §9's "safe policy" for the cross-`new`-range
    /// open question).
    pub fn delete_range(
        &mut self,
        pool: &mut Pool<V>,
        first: WireIdx,
        last: WireIdx,
    ) -> Result<(), ScopeError>
    where
        V: Default,
    {
        if first > last {
            return Err(ScopeError::Discontiguous);
        }
        let idx = self.find_range_index(first).ok_or(ScopeError::NotAssigned)?;
        if self.find_range_index(last) != Some(idx) {
            return Err(ScopeError::UnmatchedDelete);
        }
        if self.ranges[idx].remapped {
            return Err(ScopeError::CannotDeleteRemap);
        }
        if !self.active.has_all(first, last) {
            return Err(ScopeError::NotAssigned);
        }

        if self.ranges[idx].new_range {
            if first != self.ranges[idx].first || last != self.ranges[idx].last {
                return Err(ScopeError::UnmatchedDelete);
            }
            let run = self.ranges[idx].run;
            self.assigned.remove_range(first, last);
            self.active.remove_range(first, last);
            self.remove_entry(idx);
            pool.free(run);
            return Ok(());
        }

        let entry_first = self.ranges[idx].first;
        let offset = (first - entry_first) as usize;
        let len = (last - first + 1) as usize;
        let sub_run = self.ranges[idx]
            .run
            .sub(offset, len)
            .ok_or(ScopeError::Discontiguous)?;
        self.assigned.remove_range(first, last);
        self.active.remove_range(first, last);
        pool.free(sub_run);
        self.shrink_or_split(idx, first, last);
        Ok(())
    }

    fn shrink_or_split(&mut self, idx: usize, del_first: WireIdx, del_last: WireIdx) {
        let entry = self.remove_entry_owned(idx);
        let run = entry.run;

        if del_first == entry.first && del_last == entry.last {
            return;
        }
        if del_first == entry.first {
            let removed = (del_last - del_first + 1) as usize;
            let new_run = run
                .sub(removed, run.len() - removed)
                .expect("shrink-from-front sub-run in bounds");
            self.insert_entry(RangeEntry {
                first: del_last + 1,
                last: entry.last,
                run: new_run,
                new_range: false,
                remapped: false,
                can_grow: entry.can_grow,
            });
            return;
        }
        if del_last == entry.last {
            let new_len = (del_first - entry.first) as usize;
            let new_run = run
                .sub(0, new_len)
                .expect("shrink-from-back sub-run in bounds");
            self.insert_entry(RangeEntry {
                first: entry.first,
                last: del_first - 1,
                run: new_run,
                new_range: false,
                remapped: false,
                can_grow: false,
            });
            return;
        }
        let left_len = (del_first - entry.first) as usize;
        let left_run = run.sub(0, left_len).expect("left sub-run in bounds");
        let right_offset = left_len + (del_last - del_first + 1) as usize;
        let right_run = run
            .sub(right_offset, run.len() - right_offset)
            .expect("right sub-run in bounds");
        self.insert_entry(RangeEntry {
            first: entry.first,
            last: del_first - 1,
            run: left_run,
            new_range: false,
            remapped: false,
            can_grow: false,
        });
        self.insert_entry(RangeEntry {
            first: del_last + 1,
            last: entry.last,
            run: right_run,
            new_range: false,
            remapped: false,
            can_grow: false,
        });
    }

    fn remove_entry_owned(&mut self, idx: usize) -> RangeEntry {
        self.offsets.remove(idx);
        self.ranges.remove(idx)
    }

    /// Borrow an active wire's value for read.
    pub fn retrieve<'p>(&self, pool: &'p Pool<V>, wire: WireIdx) -> Result<&'p V, ScopeError> {
        if !self.active.has(wire) {
            return Err(if self.assigned.has(wire) {
                ScopeError::Deleted
            } else {
                ScopeError::NotAssigned
            });
        }
        let idx = self.find_range_index(wire).ok_or(ScopeError::NotAssigned)?;
        let entry = &self.ranges[idx];
        let pool_idx = entry
            .run
            .index((wire - entry.first) as usize)
            .ok_or(ScopeError::NotAssigned)?;
        pool.get(pool_idx).ok_or(ScopeError::NotAssigned)
    }

    /// Obtain a mutable slot for a new assignment; may extend an
    /// adjacent growable range rather than allocating a fresh one.
    pub fn assign<'p>(
        &mut self,
        pool: &'p mut Pool<V>,
        wire: WireIdx,
    ) -> Result<&'p mut V, ScopeError>
    where
        V: Default,
    {
        if self.assigned.has(wire) {
            return Err(ScopeError::AlreadyExists);
        }
        if let Some(idx) = self.find_range_index(wire) {
            let entry = &self.ranges[idx];
            let pool_idx = entry
                .run
                .index((wire - entry.first) as usize)
                .ok_or(ScopeError::AlreadyExists)?;
            self.assigned.insert(wire);
            self.active.insert(wire);
            return pool.get_mut(pool_idx).ok_or(ScopeError::AlreadyExists);
        }

        if let Some(last_idx) = self.ranges.len().checked_sub(1) {
            let grows = {
                let entry = &self.ranges[last_idx];
                entry.can_grow
                    && !entry.remapped
                    && entry.last + 1 == wire
                    && entry.run.base() + entry.run.len() == pool.len()
            };
            if grows {
                let grown = pool
                    .extend(self.ranges[last_idx].run, 1)
                    .expect("tail run was just checked to be extendable");
                self.ranges[last_idx].run = grown;
                self.ranges[last_idx].last = wire;
                self.assigned.insert(wire);
                self.active.insert(wire);
                let pool_idx = grown
                    .index(grown.len() - 1)
                    .expect("just-extended slot is in range");
                return pool.get_mut(pool_idx).ok_or(ScopeError::AlreadyExists);
            }
        }

        let run = pool.allocate(1);
        self.insert_entry(RangeEntry {
            first: wire,
            last: wire,
            run,
            new_range: false,
            remapped: false,
            can_grow: true,
        });
        self.assigned.insert(wire);
        self.active.insert(wire);
        pool.get_mut(run.base()).ok_or(ScopeError::AlreadyExists)
    }

    /// Reserve contiguous, fresh, unassigned output slots ahead of a call
    /// or conversion. The caller marks them assigned via
    /// [`Scope::commit_outputs`] once the callee has written them.
    pub fn find_outputs(
        &mut self,
        pool: &mut Pool<V>,
        first: WireIdx,
        last: WireIdx,
    ) -> Result<Run, ScopeError>
    where
        V: Default,
    {
        if first > last {
            return Err(ScopeError::Discontiguous);
        }
        if self.overlaps_existing(first, last) {
            return Err(ScopeError::AlreadyExists);
        }
        let run = pool.allocate((last - first + 1) as usize);
        self.insert_entry(RangeEntry {
            first,
            last,
            run,
            new_range: false,
            remapped: false,
            can_grow: false,
        });
        Ok(run)
    }

    /// Mark a range previously reserved by [`Scope::find_outputs`] (or
    /// written by a converter) as assigned and active.
    pub fn commit_outputs(&mut self, first: WireIdx, last: WireIdx) {
        self.assigned.insert_range(first, last);
        self.active.insert_range(first, last);
    }

    /// Locate an existing, active, contiguous range of wires, for use as
    /// a call or conversion's input binding.
    pub fn find_inputs(&self, first: WireIdx, last: WireIdx) -> Result<Run, ScopeError> {
        if first > last {
            return Err(ScopeError::Discontiguous);
        }
        if !self.active.has_all(first, last) {
            return Err(ScopeError::NotAssigned);
        }
        let idx = self.find_range_index(first).ok_or(ScopeError::NotAssigned)?;
        if self.find_range_index(last) != Some(idx) {
            return Err(ScopeError::Discontiguous);
        }
        let entry = &self.ranges[idx];
        entry
            .run
            .sub((first - entry.first) as usize, (last - first + 1) as usize)
            .ok_or(ScopeError::Discontiguous)
    }

    /// Install a remapped output range (caller-owned storage). Must
    /// precede any local assignment in this frame.
    pub fn map_outputs(&mut self, run: Run) -> (WireIdx, WireIdx) {
        debug_assert!(
            self.ranges.iter().all(|r| r.remapped),
            "map_outputs called after a local wire was assigned"
        );
        let first = self.first_local;
        let last = first + run.len() as u64 - 1;
        self.insert_entry(RangeEntry {
            first,
            last,
            run,
            new_range: false,
            remapped: true,
            can_grow: false,
        });
        self.assigned.insert_range(first, last);
        self.active.insert_range(first, last);
        self.first_local = last + 1;
        (first, last)
    }

    /// Install a remapped input range (caller-owned storage). Must
    /// precede any local assignment in this frame.
    pub fn map_inputs(&mut self, run: Run) -> (WireIdx, WireIdx) {
        debug_assert!(
            self.ranges.iter().all(|r| r.remapped),
            "map_inputs called after a local wire was assigned"
        );
        let first = self.first_local;
        let last = first + run.len() as u64 - 1;
        self.insert_entry(RangeEntry {
            first,
            last,
            run,
            new_range: false,
            remapped: true,
            can_grow: false,
        });
        self.assigned.insert_range(first, last);
        self.active.insert_range(first, last);
        self.first_local = last + 1;
        (first, last)
    }

    pub fn is_active(&self, wire: WireIdx) -> bool {
        self.active.has(wire)
    }
}

//! A `SkipList` is a numeric set represented as a sorted list of disjoint,
//! non-adjacent closed ranges rather than a list of individual elements —
//! the representation a scope uses to track which wire indices have been
//! allocated and which have been assigned a value.
//!
//! Two adjacent ranges (`[a, b]` and `[b+1, c]`) are always merged on
//! insert, so the list stays in its minimal form: no two stored ranges
//! touch or overlap, and they appear in increasing order.

use std::fmt;

/// A closed, inclusive range `[first, last]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Span {
    first: u64,
    last: u64,
}

impl Span {
    fn len(self) -> u64 {
        self.last - self.first + 1
    }

    fn overlaps_or_touches(self, other: Span) -> bool {
        // touching means adjacent with no gap, i.e. mergeable
        self.first <= other.last.saturating_add(1) && other.first <= self.last.saturating_add(1)
    }

    fn overlaps(self, other: Span) -> bool {
        self.first <= other.last && other.first <= self.last
    }
}

/// A sorted set of `u64`, stored as disjoint non-adjacent closed ranges.
#[derive(Clone, Default)]
pub struct SkipList {
    spans: Vec<Span>,
}

impl fmt::Debug for SkipList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.spans.iter().map(|s| (s.first, s.last)))
            .finish()
    }
}

impl SkipList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks the internal invariant: ranges are sorted, `first <= last`
    /// in each, and consecutive ranges are neither overlapping nor
    /// adjacent. Intended for debug assertions and tests, not hot paths.
    pub fn integrity_check(&self) -> bool {
        for span in &self.spans {
            if span.first > span.last {
                return false;
            }
        }
        for pair in self.spans.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.last.saturating_add(1) >= b.first {
                return false;
            }
        }
        true
    }

    pub fn has(&self, n: u64) -> bool {
        self.find(n).is_some()
    }

    /// True if any element of `[first, last]` is in the set.
    pub fn has_overlap(&self, first: u64, last: u64) -> bool {
        assert!(first <= last, "has_overlap: first > last");
        let query = Span { first, last };
        self.spans.iter().any(|s| s.overlaps(query))
    }

    /// True if every element of `[first, last]` is in the set.
    pub fn has_all(&self, first: u64, last: u64) -> bool {
        assert!(first <= last, "has_all: first > last");
        let mut cursor = first;
        for span in &self.spans {
            if span.first > cursor {
                return false;
            }
            if span.last >= cursor {
                if span.last >= last {
                    return true;
                }
                cursor = span.last + 1;
            }
        }
        false
    }

    fn find(&self, n: u64) -> Option<usize> {
        self.spans
            .iter()
            .position(|s| s.first <= n && n <= s.last)
    }

    /// Insert a single element. Returns `false`, leaving the set
    /// unchanged, if `n` is already a member.
    pub fn insert(&mut self, n: u64) -> bool {
        self.insert_range(n, n)
    }

    /// Insert the closed range `[first, last]`. Returns `false`, leaving
    /// the set unchanged, if any element of the range is already a
    /// member.
    pub fn insert_range(&mut self, first: u64, last: u64) -> bool {
        assert!(first <= last, "insert_range: first > last");
        let incoming = Span { first, last };
        if self.has_overlap(first, last) {
            return false;
        }
        // spans strictly before `start` are neither overlapping nor adjacent.
        let start = self
            .spans
            .partition_point(|s| s.last.saturating_add(1) < incoming.first);
        let mut merged = incoming;
        let mut end = start;
        while end < self.spans.len() && self.spans[end].overlaps_or_touches(merged) {
            merged.first = merged.first.min(self.spans[end].first);
            merged.last = merged.last.max(self.spans[end].last);
            end += 1;
        }
        self.spans.splice(start..end, std::iter::once(merged));
        true
    }

    pub fn remove(&mut self, n: u64) -> bool {
        self.remove_range(n, n)
    }

    /// Remove every element of `[first, last]` that is present. Returns
    /// `false`, leaving the set unchanged, if none of the range was
    /// present.
    pub fn remove_range(&mut self, first: u64, last: u64) -> bool {
        assert!(first <= last, "remove_range: first > last");
        let query = Span { first, last };
        if !self.has_overlap(first, last) {
            return false;
        }
        let mut result = Vec::with_capacity(self.spans.len() + 1);
        for span in &self.spans {
            if !span.overlaps(query) {
                result.push(*span);
                continue;
            }
            if span.first < query.first {
                result.push(Span {
                    first: span.first,
                    last: query.first - 1,
                });
            }
            if span.last > query.last {
                result.push(Span {
                    first: query.last + 1,
                    last: span.last,
                });
            }
        }
        self.spans = result;
        true
    }

    /// Execute `func(first, last)` on each stored range, in order.
    pub fn for_each(&self, mut func: impl FnMut(u64, u64)) {
        for span in &self.spans {
            func(span.first, span.last);
        }
    }

    /// Execute `func(first, last)` on each range of `intersect(self,
    /// [range_first, range_last])`, in order.
    pub fn for_range(&self, range_first: u64, range_last: u64, mut func: impl FnMut(u64, u64)) {
        assert!(range_first <= range_last, "for_range: first > last");
        let query = Span {
            first: range_first,
            last: range_last,
        };
        for span in &self.spans {
            if span.overlaps(query) {
                func(span.first.max(query.first), span.last.min(query.last));
            }
        }
    }

    /// True if `a` and `b` represent the same set of elements.
    pub fn equivalent(a: &SkipList, b: &SkipList) -> bool {
        a.spans == b.spans
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Total number of elements represented across all ranges.
    pub fn len(&self) -> u64 {
        self.spans.iter().map(|s| s.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_merges_adjacent_ranges() {
        let mut list = SkipList::new();
        assert!(list.insert_range(0, 3));
        assert!(list.insert_range(4, 7));
        assert!(list.integrity_check());
        assert_eq!(list.len(), 8);
        let mut seen = Vec::new();
        list.for_each(|f, l| seen.push((f, l)));
        assert_eq!(seen, vec![(0, 7)]);
    }

    #[test]
    fn insert_rejects_overlap() {
        let mut list = SkipList::new();
        assert!(list.insert_range(0, 3));
        assert!(!list.insert_range(2, 5));
        assert!(list.integrity_check());
    }

    #[test]
    fn insert_bridges_gap_between_two_neighbors() {
        let mut list = SkipList::new();
        assert!(list.insert_range(0, 1));
        assert!(list.insert_range(4, 5));
        assert!(list.insert_range(2, 3));
        assert!(list.integrity_check());
        let mut seen = Vec::new();
        list.for_each(|f, l| seen.push((f, l)));
        assert_eq!(seen, vec![(0, 5)]);
    }

    #[test]
    fn has_all_requires_full_coverage() {
        let mut list = SkipList::new();
        list.insert_range(0, 2);
        list.insert_range(5, 7);
        assert!(list.has_all(0, 2));
        assert!(!list.has_all(0, 5));
        assert!(!list.has_all(3, 4));
    }

    #[test]
    fn remove_splits_range() {
        let mut list = SkipList::new();
        list.insert_range(0, 9);
        assert!(list.remove_range(3, 5));
        assert!(list.integrity_check());
        let mut seen = Vec::new();
        list.for_each(|f, l| seen.push((f, l)));
        assert_eq!(seen, vec![(0, 2), (6, 9)]);
    }

    #[test]
    fn remove_partial_overlap_succeeds() {
        let mut list = SkipList::new();
        list.insert_range(5, 10);
        assert!(list.remove_range(0, 7));
        let mut seen = Vec::new();
        list.for_each(|f, l| seen.push((f, l)));
        assert_eq!(seen, vec![(8, 10)]);
    }

    #[test]
    fn remove_disjoint_fails() {
        let mut list = SkipList::new();
        list.insert_range(5, 10);
        assert!(!list.remove_range(0, 4));
        let mut seen = Vec::new();
        list.for_each(|f, l| seen.push((f, l)));
        assert_eq!(seen, vec![(5, 10)]);
    }

    #[test]
    fn for_range_clips_to_query() {
        let mut list = SkipList::new();
        list.insert_range(0, 4);
        list.insert_range(10, 14);
        let mut seen = Vec::new();
        list.for_range(2, 12, |f, l| seen.push((f, l)));
        assert_eq!(seen, vec![(2, 4), (10, 12)]);
    }

    #[test]
    fn equivalent_checks_structural_equality() {
        let mut a = SkipList::new();
        a.insert_range(0, 3);
        a.insert_range(10, 12);
        let mut b = SkipList::new();
        b.insert_range(10, 12);
        b.insert_range(0, 3);
        assert!(SkipList::equivalent(&a, &b));
    }

    #[test]
    fn clear_empties_the_list() {
        let mut list = SkipList::new();
        list.insert_range(0, 3);
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }
}

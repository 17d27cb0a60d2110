/// Index of a single wire within a type's address space.
pub type WireIdx = u64;

/// Sentinel marking "no wire" / an unallocated slot.
pub const WIRE_IDX_MAX: WireIdx = WireIdx::MAX;

/// An inclusive `$first...$last` wire range, the IR's native way of
/// naming a contiguous group of wires of one type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WireRange {
    pub first: WireIdx,
    pub last: WireIdx,
}

impl WireRange {
    pub fn new(first: WireIdx, last: WireIdx) -> Self {
        assert!(first <= last, "WireRange: first > last");
        Self { first, last }
    }

    pub fn single(wire: WireIdx) -> Self {
        Self {
            first: wire,
            last: wire,
        }
    }

    pub fn len(&self) -> u64 {
        self.last - self.first + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_is_inclusive() {
        assert_eq!(WireRange::new(4, 4).len(), 1);
        assert_eq!(WireRange::new(4, 9).len(), 6);
    }
}

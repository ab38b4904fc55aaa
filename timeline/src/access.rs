//! Cells touched by a single instruction, as reported by the execution engine.

use std::fmt;

use smallvec::SmallVec;

use crate::state::{Address, RegIndex, REGISTER_COUNT};

/// A set of register indices, stored as a bitmask.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegisterSet(u16);

const _: () = assert!(REGISTER_COUNT <= u16::BITS as usize);

impl RegisterSet {
    pub const fn new() -> Self {
        Self(0)
    }

    /// Adds `index` to the set. Indices outside the register file are ignored.
    pub fn insert(&mut self, index: RegIndex) {
        if (index as usize) < REGISTER_COUNT {
            self.0 |= 1 << index;
        }
    }

    pub const fn contains(&self, index: RegIndex) -> bool {
        (index as usize) < REGISTER_COUNT && self.0 & (1 << index) != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates over the members in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = RegIndex> {
        let set = *self;
        (0..REGISTER_COUNT as RegIndex).filter(move |&i| set.contains(i))
    }
}

impl FromIterator<RegIndex> for RegisterSet {
    fn from_iter<I: IntoIterator<Item = RegIndex>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<RegIndex> for RegisterSet {
    fn extend<I: IntoIterator<Item = RegIndex>>(&mut self, iter: I) {
        for index in iter {
            self.insert(index);
        }
    }
}

impl fmt::Debug for RegisterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// What one instruction read and wrote.
///
/// `written_addresses` must list every memory word the instruction stored to;
/// delta computation only inspects those addresses unless configured to scan
/// the whole memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepAccess {
    pub read_registers: RegisterSet,
    pub written_registers: RegisterSet,
    pub written_addresses: SmallVec<[Address; 2]>,
}

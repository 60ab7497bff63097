//! Vector clock indexed by session slot.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{Display, Formatter, Result};

use super::LogicalClock;

/// Classic per-session counters. `join` is the point-wise maximum and `le`
/// compares every component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VectorClock {
    slot: usize,
    clocks: Vec<u64>,
}

impl VectorClock {
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    pub fn set(&mut self, slot: usize, value: u64) {
        if slot >= self.clocks.len() {
            self.clocks.resize(slot + 1, 0);
        }
        self.clocks[slot] = value;
    }
}

impl LogicalClock for VectorClock {
    fn new(slot: usize, dim: usize) -> Self {
        Self {
            slot,
            clocks: vec![0; dim.max(slot + 1)],
        }
    }

    fn get(&self, slot: usize) -> u64 {
        self.clocks.get(slot).copied().unwrap_or(0)
    }

    fn increment(&mut self, by: u64) {
        let value = self.get(self.slot) + by;
        self.set(self.slot, value);
    }

    fn join(&mut self, other: &Self) {
        if other.clocks.len() > self.clocks.len() {
            self.clocks.resize(other.clocks.len(), 0);
        }
        for (a, b) in self.clocks.iter_mut().zip(other.clocks.iter()) {
            *a = (*a).max(*b);
        }
    }

    fn le(&self, other: &Self) -> bool {
        let max_len = self.clocks.len().max(other.clocks.len());
        (0..max_len).all(|i| self.get(i) <= other.get(i))
    }
}

impl Display for VectorClock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "[")?;
        for (i, c) in self.clocks.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zero() {
        let vc = VectorClock::new(1, 3);
        assert_eq!(vc.get(0), 0);
        assert_eq!(vc.get(1), 0);
        assert_eq!(vc.get(2), 0);
        assert_eq!(vc.get(7), 0);
    }

    #[test]
    fn test_increment_own_slot() {
        let mut vc = VectorClock::new(1, 3);
        vc.increment(1);
        vc.increment(1);
        assert_eq!(vc.get(1), 2);
        assert_eq!(vc.get(0), 0);
    }

    #[test]
    fn test_join_and_le() {
        let mut a = VectorClock::new(0, 3);
        a.set(0, 2);
        a.set(1, 1);
        let mut b = VectorClock::new(1, 3);
        b.set(0, 1);
        b.set(1, 3);
        b.set(2, 2);
        assert!(!a.le(&b));
        assert!(!b.le(&a));

        a.join(&b);
        assert_eq!(a.to_string(), "[2, 3, 2]");
        assert!(b.le(&a));
        assert!(a.le(&a));
    }
}

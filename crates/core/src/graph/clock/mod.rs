//! Logical clocks summarising the ancestor set of a node.

pub mod tree;
pub mod vector;

use core::fmt::Debug;

pub use self::tree::TreeClock;
pub use self::vector::VectorClock;

/// A per-session logical timestamp.
///
/// A clock belongs to one session slot. It is created empty, joined with its
/// session predecessor and then incremented once, after which it only grows
/// by joins.
pub trait LogicalClock: Clone + Debug {
    /// Empty clock owned by session `slot`, sized for `dim` sessions.
    fn new(slot: usize, dim: usize) -> Self;

    fn get(&self, slot: usize) -> u64;

    /// Advances the owning session's entry.
    fn increment(&mut self, by: u64);

    /// Learns everything `other` knows.
    fn join(&mut self, other: &Self);

    /// Whether the owner of `self` happens-before-or-equals the owner of
    /// `other`.
    fn le(&self, other: &Self) -> bool;
}

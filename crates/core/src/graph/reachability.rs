//! Per-node reachability state.
//!
//! Each node answers "does this node happen-before-or-equal that one" along
//! the commit order (session order and write-read edges) and along the
//! arbitration order (commit order plus arbitration edges). Clock-based
//! strategies keep one clock per relation; the search strategy keeps nothing
//! and lets the graph run a depth-first search instead.

use core::fmt::{Display, Formatter};

use super::clock::{LogicalClock, TreeClock, VectorClock};
use super::Relation;

/// How a node tracks its ancestors.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    #[default]
    TreeClock,
    VectorClock,
    Search,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TreeClock => write!(f, "tree-clock"),
            Self::VectorClock => write!(f, "vector-clock"),
            Self::Search => write!(f, "search"),
        }
    }
}

/// Commit-order clock plus the arbitration clock seeded from it once the
/// commit-order pass is complete.
#[derive(Debug, Clone)]
pub struct ClockPair<C> {
    co: C,
    ao: Option<C>,
}

impl<C: LogicalClock> ClockPair<C> {
    /// Clock of a fresh node of session `slot`: its session predecessor's
    /// knowledge plus one tick.
    fn new(slot: usize, dim: usize, prev: Option<&Self>) -> Self {
        let mut co = C::new(slot, dim);
        if let Some(prev) = prev {
            co.join(&prev.co);
        }
        co.increment(1);
        Self { co, ao: None }
    }

    #[must_use]
    pub fn clock(&self, relation: Relation) -> Option<&C> {
        match relation {
            Relation::CommitOrder => Some(&self.co),
            Relation::Arbitration => self.ao.as_ref(),
        }
    }

    fn clock_mut(&mut self, relation: Relation) -> Option<&mut C> {
        match relation {
            Relation::CommitOrder => Some(&mut self.co),
            Relation::Arbitration => self.ao.as_mut(),
        }
    }

    /// `None` if either side's arbitration clock is not seeded yet.
    fn le(&self, other: &Self, relation: Relation) -> Option<bool> {
        Some(self.clock(relation)?.le(other.clock(relation)?))
    }

    /// Returns `false` if either side's arbitration clock is not seeded yet.
    fn join(&mut self, anchor: &Self, relation: Relation) -> bool {
        match (self.clock_mut(relation), anchor.clock(relation)) {
            (Some(mine), Some(theirs)) => {
                mine.join(theirs);
                true
            }
            _ => false,
        }
    }

    fn seed_arbitration(&mut self) {
        self.ao = Some(self.co.clone());
    }
}

/// Reachability state of one node, chosen once at node construction.
#[derive(Debug, Clone)]
pub enum Reachability {
    TreeClock(ClockPair<TreeClock>),
    VectorClock(ClockPair<VectorClock>),
    Search,
}

/// Outcome of comparing or merging two reachability states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    /// Both sides use the search strategy; the graph must answer.
    NeedsSearch,
    Mismatch,
    NotSeeded,
}

impl Reachability {
    /// State of a fresh node of session `slot`, seeded from its session
    /// predecessor if there is one.
    ///
    /// Returns `None` if `prev` uses a different strategy.
    #[must_use]
    pub fn new(strategy: Strategy, slot: usize, dim: usize, prev: Option<&Self>) -> Option<Self> {
        Some(match (strategy, prev) {
            (Strategy::TreeClock, None) => Self::TreeClock(ClockPair::new(slot, dim, None)),
            (Strategy::TreeClock, Some(Self::TreeClock(p))) => {
                Self::TreeClock(ClockPair::new(slot, dim, Some(p)))
            }
            (Strategy::VectorClock, None) => Self::VectorClock(ClockPair::new(slot, dim, None)),
            (Strategy::VectorClock, Some(Self::VectorClock(p))) => {
                Self::VectorClock(ClockPair::new(slot, dim, Some(p)))
            }
            (Strategy::Search, None | Some(Self::Search)) => Self::Search,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        match self {
            Self::TreeClock(_) => Strategy::TreeClock,
            Self::VectorClock(_) => Strategy::VectorClock,
            Self::Search => Strategy::Search,
        }
    }

    /// Whether the owner of `self` happens-before-or-equals the owner of
    /// `other` along `relation`.
    #[must_use]
    pub fn le(&self, other: &Self, relation: Relation) -> Outcome<bool> {
        let result = match (self, other) {
            (Self::TreeClock(a), Self::TreeClock(b)) => a.le(b, relation),
            (Self::VectorClock(a), Self::VectorClock(b)) => a.le(b, relation),
            (Self::Search, Self::Search) => return Outcome::NeedsSearch,
            _ => return Outcome::Mismatch,
        };
        result.map_or(Outcome::NotSeeded, Outcome::Done)
    }

    /// Records that the owner of `self` is now reachable from everything
    /// `anchor` is reachable from. A no-op for the search strategy.
    pub fn absorb(&mut self, anchor: &Self, relation: Relation) -> Outcome<()> {
        let joined = match (self, anchor) {
            (Self::TreeClock(a), Self::TreeClock(b)) => a.join(b, relation),
            (Self::VectorClock(a), Self::VectorClock(b)) => a.join(b, relation),
            (Self::Search, Self::Search) => true,
            _ => return Outcome::Mismatch,
        };
        if joined {
            Outcome::Done(())
        } else {
            Outcome::NotSeeded
        }
    }

    /// Seeds the arbitration state from the final commit-order state.
    pub fn sync_co_ao(&mut self) {
        match self {
            Self::TreeClock(pair) => pair.seed_arbitration(),
            Self::VectorClock(pair) => pair.seed_arbitration(),
            Self::Search => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_successor_reaches() {
        for strategy in [Strategy::TreeClock, Strategy::VectorClock] {
            let first = Reachability::new(strategy, 0, 2, None).unwrap();
            let second = Reachability::new(strategy, 0, 2, Some(&first)).unwrap();
            assert_eq!(first.le(&second, Relation::CommitOrder), Outcome::Done(true));
            assert_eq!(second.le(&first, Relation::CommitOrder), Outcome::Done(false));
        }
    }

    #[test]
    fn test_absorb_makes_anchor_reach() {
        for strategy in [Strategy::TreeClock, Strategy::VectorClock] {
            let writer = Reachability::new(strategy, 0, 2, None).unwrap();
            let mut reader = Reachability::new(strategy, 1, 2, None).unwrap();
            assert_eq!(writer.le(&reader, Relation::CommitOrder), Outcome::Done(false));
            assert_eq!(reader.absorb(&writer, Relation::CommitOrder), Outcome::Done(()));
            assert_eq!(writer.le(&reader, Relation::CommitOrder), Outcome::Done(true));
        }
    }

    #[test]
    fn test_arbitration_requires_seeding() {
        let mut a = Reachability::new(Strategy::VectorClock, 0, 2, None).unwrap();
        let mut b = Reachability::new(Strategy::VectorClock, 1, 2, None).unwrap();
        assert_eq!(a.le(&b, Relation::Arbitration), Outcome::NotSeeded);
        assert_eq!(b.absorb(&a, Relation::Arbitration), Outcome::NotSeeded);

        a.sync_co_ao();
        b.sync_co_ao();
        assert_eq!(a.le(&b, Relation::Arbitration), Outcome::Done(false));
        assert_eq!(b.absorb(&a, Relation::Arbitration), Outcome::Done(()));
        assert_eq!(a.le(&b, Relation::Arbitration), Outcome::Done(true));
        // commit order is untouched by arbitration merges
        assert_eq!(a.le(&b, Relation::CommitOrder), Outcome::Done(false));
    }

    #[test]
    fn test_mixed_strategies_mismatch() {
        let tree = Reachability::new(Strategy::TreeClock, 0, 1, None).unwrap();
        let search = Reachability::new(Strategy::Search, 0, 1, None).unwrap();
        assert_eq!(tree.le(&search, Relation::CommitOrder), Outcome::Mismatch);
        assert!(Reachability::new(Strategy::VectorClock, 0, 1, Some(&tree)).is_none());
        assert_eq!(search.le(&search, Relation::CommitOrder), Outcome::NeedsSearch);
    }
}

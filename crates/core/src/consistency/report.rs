use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use super::policy::IsolationLevel;
use super::tap::Tap;
use crate::history::types::TransactionId;

/// Transactions that together form one flagged pattern: the pair of a
/// commit-order cycle, or the `(t1, t2, t3)` triple of an arbitration
/// triangle.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Violation {
    pub transactions: Vec<TransactionId>,
    pub taps: BTreeSet<Tap>,
}

/// Outcome of a check.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub isolation: IsolationLevel,
    /// Distinct patterns prohibited at `isolation` that the history shows.
    pub taps: BTreeSet<Tap>,
    /// How often each pattern in `taps` was flagged.
    pub counts: BTreeMap<Tap, u64>,
    /// Only collected when the check was configured to visualize.
    pub violations: Vec<Violation>,
    /// Nodes visited by propagation and search. Diagnostic only.
    pub traversal_steps: u64,
}

impl Report {
    #[must_use]
    pub const fn new(isolation: IsolationLevel) -> Self {
        Self {
            isolation,
            taps: BTreeSet::new(),
            counts: BTreeMap::new(),
            violations: Vec::new(),
            traversal_steps: 0,
        }
    }

    /// Records `tap` if `isolation` prohibits it. Returns whether it was
    /// recorded.
    pub fn record(&mut self, tap: Tap) -> bool {
        if !self.isolation.prohibits(tap) {
            return false;
        }
        tracing::trace!(%tap, "pattern found");
        self.taps.insert(tap);
        *self.counts.entry(tap).or_insert(0) += 1;
        true
    }

    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.taps.is_empty()
    }

    #[must_use]
    pub fn verdict(&self) -> &'static str {
        if self.is_accepted() {
            "ACCEPT"
        } else {
            "REJECT"
        }
    }

    #[must_use]
    pub fn count(&self, tap: Tap) -> u64 {
        self.counts.get(&tap).copied().unwrap_or(0)
    }
}

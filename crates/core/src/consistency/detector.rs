//! Anomaly detection over the built graph and the indexes the builder kept.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use super::error::Error;
use super::report::Violation;
use super::tap::Tap;
use super::{Checker, Site, Witness};
use crate::graph::{EdgeKind, NodeId, Relation};
use crate::history::types::Operation;
use crate::history::value::Value;

/// Which of the two triangle shapes of the arbitration checks was found.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Triangle {
    /// `t1` happens before `t2`.
    CommitOrder,
    /// `t1` is only arbitrated before `t2`.
    Arbitration,
}

impl Triangle {
    /// Patterns for an intervening session edge, an intervening read on
    /// another variable that comes later, and no explanation.
    const fn taps(self) -> (Tap, Tap, Tap) {
        match self {
            Self::CommitOrder => (Tap::FracturedReadCO, Tap::NonMonoReadCO, Tap::COConflictAO),
            Self::Arbitration => (Tap::FracturedReadAO, Tap::NonMonoReadAO, Tap::ConflictAO),
        }
    }
}

impl<'h, Variable, Version> Checker<'h, Variable, Version>
where
    Variable: Clone + Eq + Hash + Debug,
    Version: Value,
{
    fn operations_of(&self, node: NodeId) -> &'h [Operation<Variable, Version>] {
        let history: &'h _ = self.history;
        history
            .transaction(self.graph.transaction_of(node))
            .map_or(&[], |txn| txn.operations.as_slice())
    }

    fn note_violation(&mut self, nodes: &[NodeId], taps: BTreeSet<Tap>) {
        if !self.config.visualize || taps.is_empty() {
            return;
        }
        let transactions = nodes
            .iter()
            .map(|&node| self.graph.transaction_of(node))
            .collect();
        self.report.violations.push(Violation { transactions, taps });
    }

    /// Checks that only need the commit order.
    pub(super) fn check_commit_order(&mut self) -> Result<(), Error> {
        self.check_dangling_reads();

        let history = self.history;
        let mut sites: Vec<Site> = self.reads.values().flatten().copied().collect();
        sites.sort_unstable();
        for site in sites {
            let Some(read) = history.operation(site.op) else {
                continue;
            };
            if read.value.is_zero() {
                self.check_zero_read(read, site)?;
            } else {
                self.check_sourced_read(read, site);
            }
        }

        self.check_cycles()
    }

    /// Reads whose value no committed transaction wrote.
    fn check_dangling_reads(&mut self) {
        let aborted = self.history.aborted_writes();
        let mut thin_air = false;
        for key in self.dangling.keys() {
            if aborted.contains(key) {
                self.report.record(Tap::AbortedRead);
            } else {
                thin_air = true;
            }
        }
        if thin_air {
            self.report.record(Tap::ThinAirRead);
        }
    }

    /// A read of the zero value in a transaction that already happens after
    /// a write of the variable.
    ///
    /// In list mode a read of the empty list is a zero read and lands here
    /// too, so an empty read after a visible append is reported even though
    /// it observes no element.
    fn check_zero_read(
        &mut self,
        read: &Operation<Variable, Version>,
        site: Site,
    ) -> Result<(), Error> {
        let Some(writers) = self.write_nodes.get(&read.variable) else {
            return Ok(());
        };
        let mut writers: Vec<NodeId> = writers.iter().copied().collect();
        writers.sort_unstable();
        for writer in writers {
            if writer == site.node
                || !self
                    .graph
                    .can_reach(writer, site.node, Relation::CommitOrder)?
            {
                continue;
            }
            // the writer also wrote some y that this transaction read; a
            // write of the zero value is indistinguishable from the initial
            // state and never counts
            let mut explained = false;
            for write_y in self.operations_of(writer).iter().filter(|op| {
                op.is_write() && op.variable != read.variable && !op.value.is_zero()
            }) {
                for read_y in self.operations_of(site.node).iter().filter(|op| {
                    op.is_read() && op.variable == write_y.variable && op.value == write_y.value
                }) {
                    explained = true;
                    if read_y.index < read.index {
                        self.report.record(Tap::NonMonoReadCO);
                    } else {
                        self.report.record(Tap::FracturedReadCO);
                    }
                }
            }
            if !explained {
                self.report.record(Tap::COConflictAO);
            }
        }
        Ok(())
    }

    /// A read of a non-zero value against the writes it observes.
    fn check_sourced_read(&mut self, read: &Operation<Variable, Version>, site: Site) {
        for element in read.value.observed() {
            let Some(&write) = self.writes.get(&(read.variable.clone(), element.clone())) else {
                continue;
            };
            if write.node != site.node {
                // only the value the read ends on can be intermediate
                if self.internal_writes.contains(&write.op) && element == read.value {
                    self.report.record(Tap::IntermediateRead);
                }
            } else if write.op.index > read.index {
                self.report.record(Tap::FutureRead);
            }
        }
    }

    /// Write-read edges whose endpoints happen before each other.
    fn check_cycles(&mut self) -> Result<(), Error> {
        let mut pairs: Vec<(NodeId, NodeId)> = self.wr_edges.values().flatten().copied().collect();
        pairs.sort_unstable();
        for (t1, t2) in pairs {
            if self.graph.can_reach(t1, t2, Relation::CommitOrder)?
                && self.graph.can_reach(t2, t1, Relation::CommitOrder)?
                && self.report.record(Tap::CyclicCO)
            {
                self.note_violation(&[t1, t2], BTreeSet::from([Tap::CyclicCO]));
            }
        }
        Ok(())
    }

    /// Explains a cyclic arbitration order: for every read of `x` in `t3`
    /// from `t1` and every other writer `t2` of `x` that happens before
    /// `t3`, `t2` overwrote `x` between `t1` and `t3`.
    pub(super) fn check_arbitration(&mut self) -> Result<(), Error> {
        let mut pairs: Vec<(NodeId, NodeId)> = self.witnesses.keys().copied().collect();
        pairs.sort_unstable();
        for (t1, t3) in pairs {
            let witnesses = self.witnesses.get(&(t1, t3)).cloned().unwrap_or_default();
            for witness in &witnesses {
                let mut writers: Vec<NodeId> = self
                    .write_nodes
                    .get(&witness.variable)
                    .map(|writers| writers.iter().copied().collect())
                    .unwrap_or_default();
                writers.sort_unstable();
                for t2 in writers {
                    if t2 == t1
                        || t2 == t3
                        || !self.graph.can_reach(t2, t3, Relation::CommitOrder)?
                    {
                        continue;
                    }
                    if self.graph.can_reach(t1, t2, Relation::CommitOrder)? {
                        self.classify_triangle([t1, t2, t3], witness, Triangle::CommitOrder);
                    } else if self.graph.can_reach(t1, t2, Relation::Arbitration)? {
                        self.classify_triangle([t1, t2, t3], witness, Triangle::Arbitration);
                    }
                }
            }
        }
        Ok(())
    }

    fn classify_triangle(
        &mut self,
        [t1, t2, t3]: [NodeId; 3],
        witness: &Witness<Variable>,
        shape: Triangle,
    ) {
        let (fractured, non_mono, conflict) = shape.taps();
        let mut found = Vec::new();

        if self
            .graph
            .edges_between(t2, t3)
            .iter()
            .any(|edge| edge.kind == EdgeKind::So)
        {
            found.push(fractured);
        }
        if let Some(others) = self.witnesses.get(&(t2, t3)) {
            for other in others
                .iter()
                .filter(|other| other.variable != witness.variable)
            {
                if other.read.op.index < witness.read.op.index {
                    found.push(non_mono);
                } else {
                    found.push(fractured);
                }
            }
        }
        if found.is_empty() {
            found.push(conflict);
        }

        let mut taps = BTreeSet::new();
        for tap in found {
            if self.report.record(tap) {
                taps.insert(tap);
            }
        }
        self.note_violation(&[t1, t2, t3], taps);
    }
}

//! Graph construction: the commit-order pass, the arbitration pass and the
//! list-value arbitration pass.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;

use super::error::Error;
use super::tap::Tap;
use super::{Checker, Site, Witness};
use crate::graph::{CausalityGraph, Edge, EdgeKind, NodeId, Relation};
use crate::history::types::{OpKind, Operation, OperationId};
use crate::history::value::Value;

impl<Variable, Version> Checker<'_, Variable, Version>
where
    Variable: Clone + Eq + Hash + Debug,
    Version: Value,
{
    /// Adds every transaction in round-robin session order with its
    /// session-order and write-read edges, flagging the patterns that are
    /// visible inside a single transaction on the way.
    pub(super) fn build_commit_order(&mut self) -> Result<(), Error> {
        let history = self.history;
        let mut last_in_session: HashMap<u64, NodeId> = HashMap::new();

        for txn in history.flatten() {
            let prev = last_in_session.get(&txn.session_id()).copied();
            let node = self.graph.add_vertex(txn.id, prev)?;
            last_in_session.insert(txn.session_id(), node);
            if let Some(prev) = prev {
                self.graph.add_edge(prev, node, Edge::session_order());
            }

            // latest read or non-zero write per variable
            let mut nearest: HashMap<&Variable, &Operation<Variable, Version>> = HashMap::new();
            let mut last_write: HashMap<&Variable, OperationId> = HashMap::new();

            for op in &txn.operations {
                let site = Site { op: op.id(), node };
                match op.kind {
                    OpKind::Read => {
                        if let Some(&prior) = nearest.get(&op.variable) {
                            if prior.value != op.value {
                                self.check_own_read(&txn.operations, prior, op);
                            }
                        }
                        nearest.insert(&op.variable, op);
                        self.resolve_read(op, site)?;
                    }
                    OpKind::Write => {
                        if let Some(superseded) = last_write.insert(&op.variable, op.id()) {
                            self.internal_writes.insert(superseded);
                        }
                        if op.value.is_zero() {
                            continue;
                        }
                        nearest.insert(&op.variable, op);
                        self.record_write(op, site);
                    }
                }
            }

            self.graph.propagate(node, Relation::CommitOrder)?;
        }
        Ok(())
    }

    /// `read` disagrees with `prior`, the closest earlier operation of its
    /// transaction on the same variable.
    fn check_own_read(
        &mut self,
        operations: &[Operation<Variable, Version>],
        prior: &Operation<Variable, Version>,
        read: &Operation<Variable, Version>,
    ) {
        if prior.is_read() {
            self.report.record(Tap::NonRepeatableRead);
            return;
        }
        let mut older_own_write = false;
        for earlier in operations.iter().filter(|earlier| {
            earlier.index < prior.index
                && earlier.is_write()
                && earlier.variable == read.variable
                && earlier.value == read.value
        }) {
            tracing::trace!(?earlier, ?read, "read skips the latest own write");
            older_own_write = true;
            self.report.record(Tap::NotMyLastWrite);
        }
        if !older_own_write {
            self.report.record(Tap::NotMyOwnWrite);
        }
    }

    fn resolve_read(&mut self, read: &Operation<Variable, Version>, site: Site) -> Result<(), Error> {
        let key = (read.variable.clone(), read.value.clone());
        if let Some(&write) = self.writes.get(&key) {
            self.reads.entry(key).or_default().push(site);
            if write.node != site.node {
                if !self
                    .graph
                    .can_reach(write.node, site.node, Relation::CommitOrder)?
                {
                    self.graph
                        .absorb(site.node, write.node, Relation::CommitOrder)?;
                }
                self.link(read.variable.clone(), write, site);
            }
        } else if read.value.is_zero() {
            self.reads.entry(key).or_default().push(site);
        } else {
            self.dangling.entry(key).or_default().push(site);
        }
        Ok(())
    }

    /// Records a non-zero write and resolves the reads that were waiting
    /// for it. Reachability reaches them through the end-of-transaction
    /// propagation.
    fn record_write(&mut self, write: &Operation<Variable, Version>, site: Site) {
        let key = (write.variable.clone(), write.value.clone());
        self.write_nodes
            .entry(write.variable.clone())
            .or_default()
            .insert(site.node);
        if let Some(pending) = self.dangling.remove(&key) {
            for &read in &pending {
                if read.node != site.node {
                    self.link(write.variable.clone(), site, read);
                }
            }
            self.reads.entry(key.clone()).or_default().extend(pending);
        }
        self.writes.insert(key, site);
    }

    fn link(&mut self, variable: Variable, write: Site, read: Site) {
        self.graph
            .add_edge(write.node, read.node, Edge::write_read(variable.clone()));
        self.wr_edges
            .entry(variable.clone())
            .or_default()
            .insert((write.node, read.node));
        self.witnesses
            .entry((write.node, read.node))
            .or_default()
            .push(Witness {
                variable,
                write,
                read,
            });
    }

    /// For every write-read edge `t1 -> t2` on `x` and every other writer
    /// `t` of `x` that happens before `t2` but not before `t1`, `t` must be
    /// arbitrated before `t1`.
    pub(super) fn build_arbitration(&mut self) -> Result<(), Error> {
        let mut anchors = BTreeSet::new();
        let mut added = 0usize;
        for (t1, t2, writers) in self.arbitration_candidates() {
            for t in writers {
                if t == t1
                    || t == t2
                    || !self.graph.can_reach(t, t2, Relation::CommitOrder)?
                    || self.graph.can_reach(t, t1, Relation::CommitOrder)?
                {
                    continue;
                }
                if add_arbitration_edge(&mut self.graph, t, t1) {
                    added += 1;
                    anchors.insert(t);
                }
            }
        }
        tracing::debug!(added, anchors = anchors.len(), "arbitration edges");
        for anchor in anchors {
            self.graph.propagate(anchor, Relation::Arbitration)?;
        }
        Ok(())
    }

    /// Every write-read edge with the other writers of its variable, in
    /// node order so that reachability queries run in the same order on
    /// every check.
    fn arbitration_candidates(&self) -> Vec<(NodeId, NodeId, Vec<NodeId>)> {
        let mut candidates = Vec::new();
        for (variable, edges) in &self.wr_edges {
            let Some(writers) = self.write_nodes.get(variable) else {
                continue;
            };
            let mut writers: Vec<NodeId> = writers.iter().copied().collect();
            writers.sort_unstable();
            for &(t1, t2) in edges {
                candidates.push((t1, t2, writers.clone()));
            }
        }
        candidates.sort();
        candidates
    }

    /// Every read of a list tells the order its elements were appended in:
    /// the writers of consecutive elements are arbitrated in that order.
    pub(super) fn build_list_arbitration(&mut self) -> Result<(), Error> {
        let history = self.history;
        let mut anchors = BTreeSet::new();
        let mut added = 0usize;
        let mut sites: Vec<Site> = self.reads.values().flatten().copied().collect();
        sites.sort_unstable();
        for site in sites {
            let Some(read) = history.operation(site.op) else {
                continue;
            };
            let mut prev: Option<NodeId> = None;
            for element in read.value.observed() {
                let Some(&writer) = self.writes.get(&(read.variable.clone(), element)) else {
                    continue;
                };
                if let Some(prev) = prev {
                    if prev != writer.node
                        && add_arbitration_edge(&mut self.graph, prev, writer.node)
                    {
                        added += 1;
                        anchors.insert(prev);
                    }
                }
                prev = Some(writer.node);
            }
        }
        tracing::debug!(added, anchors = anchors.len(), "list arbitration edges");
        for anchor in anchors {
            self.graph.propagate(anchor, Relation::Arbitration)?;
        }
        Ok(())
    }
}

/// Adds an arbitration edge unless the pair already has one.
fn add_arbitration_edge<Variable>(
    graph: &mut CausalityGraph<Variable>,
    from: NodeId,
    to: NodeId,
) -> bool
where
    Variable: Clone + Debug,
{
    if graph
        .edges_between(from, to)
        .iter()
        .any(|edge| edge.kind == EdgeKind::Ao)
    {
        return false;
    }
    graph.add_edge(from, to, Edge::arbitration());
    true
}

use alloc::vec;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt::Debug;

use hashbrown::{HashMap, HashSet};

use super::reachability::{Outcome, Reachability, Strategy};
use super::{NodeId, Relation};
use crate::consistency::error::Error;
use crate::history::types::TransactionId;

/// Label of an edge between two transactions.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Consecutive transactions of one session.
    So,
    /// A write observed by a read.
    Wr,
    /// The source is arbitrated before the target.
    Ao,
}

impl EdgeKind {
    /// Whether edges of this kind belong to `relation`.
    #[must_use]
    pub const fn within(self, relation: Relation) -> bool {
        match self {
            Self::So | Self::Wr => true,
            Self::Ao => matches!(relation, Relation::Arbitration),
        }
    }
}

/// A labelled edge. Write-read edges carry the variable that induced them.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge<Variable> {
    pub kind: EdgeKind,
    pub variable: Option<Variable>,
}

impl<Variable> Edge<Variable> {
    #[must_use]
    pub const fn session_order() -> Self {
        Self {
            kind: EdgeKind::So,
            variable: None,
        }
    }

    #[must_use]
    pub const fn write_read(variable: Variable) -> Self {
        Self {
            kind: EdgeKind::Wr,
            variable: Some(variable),
        }
    }

    #[must_use]
    pub const fn arbitration() -> Self {
        Self {
            kind: EdgeKind::Ao,
            variable: None,
        }
    }
}

/// One node per transaction.
#[derive(Debug, Clone)]
pub struct Node {
    pub transaction: TransactionId,
    reach: Reachability,
}

impl Node {
    #[must_use]
    pub const fn reachability(&self) -> &Reachability {
        &self.reach
    }
}

/// Insert-only directed multigraph over transactions.
///
/// An ordered pair of nodes may carry several edges (say, write-read edges on
/// two variables). `successors` lists every distinct target once, in the
/// order the first edge to it was added.
///
/// Node ids handed to the query methods must come from this graph; a foreign
/// id panics on indexing.
#[derive(Debug)]
pub struct CausalityGraph<Variable> {
    strategy: Strategy,
    dim: usize,
    nodes: Vec<Node>,
    index: HashMap<TransactionId, NodeId>,
    successors: Vec<Vec<NodeId>>,
    edges: HashMap<(NodeId, NodeId), Vec<Edge<Variable>>>,
    steps: Cell<u64>,
}

impl<Variable> CausalityGraph<Variable>
where
    Variable: Clone + Debug,
{
    /// Empty graph whose nodes use `strategy` with clocks sized for `dim`
    /// sessions.
    #[must_use]
    pub fn new(strategy: Strategy, dim: usize) -> Self {
        Self {
            strategy,
            dim,
            nodes: Vec::new(),
            index: HashMap::new(),
            successors: Vec::new(),
            edges: HashMap::new(),
            steps: Cell::new(0),
        }
    }

    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Adds the node of `transaction`, seeding its reachability from its
    /// session predecessor `prev`. Returns the existing node if the
    /// transaction already has one.
    pub fn add_vertex(
        &mut self,
        transaction: TransactionId,
        prev: Option<NodeId>,
    ) -> Result<NodeId, Error> {
        if let Some(&id) = self.index.get(&transaction) {
            return Ok(id);
        }
        #[allow(clippy::cast_possible_truncation)]
        let slot = transaction.session_id as usize;
        let prev_reach = prev.map(|p| &self.nodes[p.0].reach);
        let Some(reach) = Reachability::new(self.strategy, slot, self.dim, prev_reach) else {
            return Err(Error::StrategyMismatch {
                from: prev.unwrap_or(NodeId(self.nodes.len())),
                from_strategy: prev_reach.map_or(self.strategy, Reachability::strategy),
                to: NodeId(self.nodes.len()),
                to_strategy: self.strategy,
            });
        };
        Ok(self.insert_vertex(transaction, reach))
    }

    /// Adds a node with caller-built reachability state. Idempotent per
    /// transaction.
    pub fn insert_vertex(&mut self, transaction: TransactionId, reach: Reachability) -> NodeId {
        if let Some(&id) = self.index.get(&transaction) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { transaction, reach });
        self.successors.push(Vec::new());
        self.index.insert(transaction, id);
        id
    }

    /// Appends an edge; parallel edges are kept.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, edge: Edge<Variable>) {
        let labels = self.edges.entry((from, to)).or_default();
        if labels.is_empty() {
            self.successors[from.0].push(to);
        }
        labels.push(edge);
    }

    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        self.successors.get(node.0).map_or(&[], Vec::as_slice)
    }

    /// All edges from `from` to `to`, possibly none.
    #[must_use]
    pub fn edges_between(&self, from: NodeId, to: NodeId) -> &[Edge<Variable>] {
        self.edges.get(&(from, to)).map_or(&[], Vec::as_slice)
    }

    /// Every `(from, to)` pair that carries at least one edge, with its
    /// labels.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, &[Edge<Variable>])> {
        self.edges
            .iter()
            .map(|(&(from, to), labels)| (from, to, labels.as_slice()))
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    #[must_use]
    pub fn node_of(&self, transaction: TransactionId) -> Option<NodeId> {
        self.index.get(&transaction).copied()
    }

    #[must_use]
    pub fn transaction_of(&self, id: NodeId) -> TransactionId {
        self.nodes[id.0].transaction
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of individual edges of `kind`.
    #[must_use]
    pub fn edge_count(&self, kind: EdgeKind) -> usize {
        self.edges
            .values()
            .flatten()
            .filter(|edge| edge.kind == kind)
            .count()
    }

    /// Nodes visited by propagation and by search so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps.get()
    }

    fn tick(&self) {
        self.steps.set(self.steps.get() + 1);
    }

    /// Whether `from` happens-before-or-equals `to` along `relation`.
    pub fn can_reach(&self, from: NodeId, to: NodeId, relation: Relation) -> Result<bool, Error> {
        let (a, b) = (&self.nodes[from.0].reach, &self.nodes[to.0].reach);
        match a.le(b, relation) {
            Outcome::Done(reachable) => Ok(reachable),
            Outcome::NeedsSearch => Ok(self.search(from, to, relation)),
            Outcome::Mismatch => Err(Error::StrategyMismatch {
                from,
                from_strategy: a.strategy(),
                to,
                to_strategy: b.strategy(),
            }),
            Outcome::NotSeeded => Err(Error::ArbitrationNotSeeded { node: from }),
        }
    }

    /// Depth-first search over the edges of `relation`.
    fn search(&self, from: NodeId, to: NodeId, relation: Relation) -> bool {
        if from == to {
            return true;
        }
        let mut visited = HashSet::new();
        visited.insert(from);
        let mut stack = vec![from];
        while let Some(cur) = stack.pop() {
            self.tick();
            for &next in self.neighbors(cur) {
                if visited.contains(&next)
                    || !self
                        .edges_between(cur, next)
                        .iter()
                        .any(|edge| edge.kind.within(relation))
                {
                    continue;
                }
                if next == to {
                    return true;
                }
                visited.insert(next);
                stack.push(next);
            }
        }
        false
    }

    /// Makes `target` reachable from everything `anchor` is reachable from.
    pub fn absorb(&mut self, target: NodeId, anchor: NodeId, relation: Relation) -> Result<(), Error> {
        if target == anchor {
            return Ok(());
        }
        let (target_node, anchor_node) = if target.0 < anchor.0 {
            let (left, right) = self.nodes.split_at_mut(anchor.0);
            (&mut left[target.0], &right[0])
        } else {
            let (left, right) = self.nodes.split_at_mut(target.0);
            (&mut right[0], &left[anchor.0])
        };
        match target_node.reach.absorb(&anchor_node.reach, relation) {
            Outcome::Done(()) | Outcome::NeedsSearch => Ok(()),
            Outcome::Mismatch => Err(Error::StrategyMismatch {
                from: anchor,
                from_strategy: anchor_node.reach.strategy(),
                to: target,
                to_strategy: target_node.reach.strategy(),
            }),
            Outcome::NotSeeded => Err(Error::ArbitrationNotSeeded { node: target }),
        }
    }

    /// Pushes `anchor`'s reachability to every downstream node that does
    /// not know it yet.
    ///
    /// Iterative, with a visited set, so it terminates on cyclic graphs.
    /// Search nodes keep no state, so there is nothing to push.
    pub fn propagate(&mut self, anchor: NodeId, relation: Relation) -> Result<(), Error> {
        if self.strategy == Strategy::Search {
            return Ok(());
        }
        let mut visited = HashSet::new();
        visited.insert(anchor);
        let mut stack = vec![anchor];
        while let Some(cur) = stack.pop() {
            self.tick();
            for i in 0..self.successors[cur.0].len() {
                let next = self.successors[cur.0][i];
                if visited.contains(&next) || self.can_reach(anchor, next, relation)? {
                    continue;
                }
                self.absorb(next, anchor, relation)?;
                visited.insert(next);
                stack.push(next);
            }
        }
        Ok(())
    }

    /// Seeds every node's arbitration state from its commit-order state.
    pub fn sync_co_ao(&mut self) {
        for node in &mut self.nodes {
            node.reach.sync_co_ao();
        }
    }

    /// Whether some edge of `relation` closes a cycle, that is its target
    /// reaches its source.
    pub fn has_cycle(&self, relation: Relation) -> Result<bool, Error> {
        let mut pairs: Vec<(NodeId, NodeId)> = self
            .edges
            .iter()
            .filter(|(_, labels)| labels.iter().any(|edge| edge.kind.within(relation)))
            .map(|(&pair, _)| pair)
            .collect();
        pairs.sort_unstable();
        for (from, to) in pairs {
            if self.can_reach(to, from, relation)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

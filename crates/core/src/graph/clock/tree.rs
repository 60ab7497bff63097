//! Tree clock: a vector clock that also remembers through which session it
//! learned each entry, so that a join only visits the entries that actually
//! change.
//!
//! Every slot present in the clock is a node of a tree rooted at the clock's
//! own session. A node `v` hanging below `u` means the clock learned `v`'s
//! time transitively through `u`; `aclk[v]` is `u`'s time when that
//! happened. Children are kept oldest-attached first, so a join can walk a
//! child list from the newest end and stop at the first child the receiver
//! must already know.
//!
//! The comparison only looks at the root entry: a clock that knows this
//! clock's own session at least as far as this clock does has observed it.

use alloc::vec::Vec;

use super::LogicalClock;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeClock {
    root: usize,
    clk: Vec<u64>,
    aclk: Vec<u64>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl TreeClock {
    #[must_use]
    pub const fn root(&self) -> usize {
        self.root
    }

    /// Slots that hang directly below `slot`, newest attachment first.
    #[must_use]
    pub fn children_of(&self, slot: usize) -> Vec<usize> {
        self.children
            .get(slot)
            .map(|c| c.iter().rev().copied().collect())
            .unwrap_or_default()
    }

    fn grow(&mut self, dim: usize) {
        if dim > self.clk.len() {
            self.clk.resize(dim, 0);
            self.aclk.resize(dim, 0);
            self.parent.resize(dim, None);
            self.children.resize_with(dim, Vec::new);
        }
    }

    fn attach(&mut self, slot: usize, parent: usize) {
        self.parent[slot] = Some(parent);
        self.children[parent].push(slot);
    }

    fn detach(&mut self, slot: usize) {
        if let Some(parent) = self.parent[slot].take() {
            self.children[parent].retain(|&c| c != slot);
        }
    }

    /// Post-order collection of the nodes of `other` (below `u`) that carry
    /// newer times than `self`. Parents end up above their children on the
    /// returned stack.
    fn collect_updated(&self, other: &Self, u: usize, stack: &mut Vec<usize>) {
        for &v in other.children[u].iter().rev() {
            if self.get(v) < other.clk[v] {
                self.collect_updated(other, v, stack);
            } else if other.aclk[v] <= self.get(u) {
                break;
            }
        }
        stack.push(u);
    }

    /// Point-wise join that flattens the tree below the root. Used when
    /// `other` knows this clock's own session further than this clock does,
    /// which only happens on cyclic histories.
    fn join_pointwise(&mut self, other: &Self) {
        for (a, b) in self.clk.iter_mut().zip(other.clk.iter()) {
            *a = (*a).max(*b);
        }
        for children in &mut self.children {
            children.clear();
        }
        self.parent.fill(None);
        let root_time = self.clk[self.root];
        for slot in 0..self.clk.len() {
            if slot != self.root && self.clk[slot] > 0 {
                self.aclk[slot] = root_time;
                self.attach(slot, self.root);
            }
        }
    }
}

impl LogicalClock for TreeClock {
    fn new(slot: usize, dim: usize) -> Self {
        let dim = dim.max(slot + 1);
        let mut children = Vec::new();
        children.resize_with(dim, Vec::new);
        Self {
            root: slot,
            clk: alloc::vec![0; dim],
            aclk: alloc::vec![0; dim],
            parent: alloc::vec![None; dim],
            children,
        }
    }

    fn get(&self, slot: usize) -> u64 {
        self.clk.get(slot).copied().unwrap_or(0)
    }

    fn increment(&mut self, by: u64) {
        self.clk[self.root] += by;
    }

    fn join(&mut self, other: &Self) {
        self.grow(other.clk.len());
        let z = other.root;
        if other.clk[z] <= self.get(z) {
            return;
        }
        // fresh clock seeded from its session predecessor
        if z == self.root && self.clk.iter().all(|&c| c == 0) {
            let dim = self.clk.len();
            *self = other.clone();
            self.grow(dim);
            return;
        }
        if other.get(self.root) > self.clk[self.root] {
            self.join_pointwise(other);
            return;
        }

        let mut updated = Vec::new();
        self.collect_updated(other, z, &mut updated);
        for &slot in &updated {
            self.detach(slot);
        }
        while let Some(slot) = updated.pop() {
            self.clk[slot] = other.clk[slot];
            if let Some(parent) = other.parent[slot] {
                self.aclk[slot] = other.aclk[slot];
                self.attach(slot, parent);
            }
        }
        self.aclk[z] = self.clk[self.root];
        self.attach(z, self.root);
    }

    fn le(&self, other: &Self) -> bool {
        self.clk[self.root] <= other.get(self.root)
    }
}

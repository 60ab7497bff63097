//! The causality graph and the reachability index kept on its nodes.

pub mod causality;
pub mod clock;
pub mod reachability;

use derive_more::{Display, From};

pub use self::causality::{CausalityGraph, Edge, EdgeKind, Node};
pub use self::reachability::{Reachability, Strategy};

/// Position of a node in its [`CausalityGraph`].
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, From, Display)]
#[display("n{_0}")]
pub struct NodeId(pub usize);

/// The edge relation a reachability query or propagation runs along.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Session order plus write-read order.
    CommitOrder,
    /// Commit order plus arbitration edges.
    Arbitration,
}

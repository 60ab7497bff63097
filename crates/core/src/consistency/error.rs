use alloc::string::String;

use derive_more::Display;

use crate::graph::reachability::Strategy;
use crate::graph::NodeId;

/// Setup errors of a check.
///
/// Anomalies found in a history are never errors; they are reported as
/// [`Tap`](crate::consistency::tap::Tap) findings in the
/// [`Report`](crate::consistency::report::Report).
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Error {
    /// Two nodes built with different reachability strategies were compared
    /// or merged.
    #[display("node {from} uses {from_strategy} reachability, node {to} uses {to_strategy}")]
    StrategyMismatch {
        from: NodeId,
        from_strategy: Strategy,
        to: NodeId,
        to_strategy: Strategy,
    },
    /// Arbitration reachability was used before it was seeded from the
    /// commit-order state.
    #[display("arbitration reachability of node {node} used before it was seeded")]
    ArbitrationNotSeeded { node: NodeId },
    /// An algorithm selector that names no known algorithm.
    #[display("unknown algorithm `{_0}`")]
    UnknownAlgorithm(String),
    /// An isolation level selector that names no known level.
    #[display("unknown isolation level `{_0}`")]
    UnknownIsolationLevel(String),
}

impl core::error::Error for Error {}

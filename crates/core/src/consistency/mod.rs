//! Checking a history against an isolation level.
//!
//! A check runs in phases over one fresh [`CausalityGraph`]:
//!
//! 1. the commit-order pass adds one node per transaction in round-robin
//!    session order, session-order edges and write-read edges, and keeps the
//!    per-node reachability up to date;
//! 2. the commit-order checks look at the reads recorded by that pass;
//! 3. above Read Committed, the arbitration state of every node is seeded
//!    from its commit-order state and the arbitration pass adds an edge from
//!    every writer that was causally overwritten before a read to the writer
//!    the read observed;
//! 4. if the arbitration graph has a cycle, the arbitration checks look for
//!    the triangles that explain it.
//!
//! Every finding goes through the [`IsolationLevel`] policy before it lands
//! in the [`Report`].

pub mod builder;
pub mod config;
pub mod detector;
pub mod error;
pub mod policy;
pub mod report;
pub mod tap;

use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::{HashMap, HashSet};

use self::config::Config;
use self::error::Error;
use self::policy::IsolationLevel;
use self::report::Report;
use crate::graph::{CausalityGraph, NodeId, Relation};
use crate::history::types::OperationId;
use crate::history::value::Value;
use crate::history::History;

/// An operation together with the node of its transaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Site {
    pub op: OperationId,
    pub node: NodeId,
}

/// A write observed by a read, on `variable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness<Variable> {
    pub variable: Variable,
    pub write: Site,
    pub read: Site,
}

/// State of one check of one history.
///
/// ```rust
/// use tapcheck_core::history::types::OpKind;
/// use tapcheck_core::{check, Config, History, IsolationLevel};
///
/// let mut history: History<&str, u64> = History::new();
/// history.push_transaction(0, [(OpKind::Write, "x", 1)]);
/// history.push_transaction(1, [(OpKind::Read, "x", 1)]);
///
/// let config = Config::builder()
///     .isolation(IsolationLevel::TransactionalCausal)
///     .build();
/// let report = check(&history, &config).unwrap();
/// assert!(report.is_accepted());
/// ```
#[derive(Debug)]
pub struct Checker<'h, Variable, Version>
where
    Variable: Clone + Eq + Hash + Debug,
    Version: Value,
{
    history: &'h History<Variable, Version>,
    config: Config,
    graph: CausalityGraph<Variable>,
    report: Report,
    /// Latest write of every `(variable, value)`.
    writes: HashMap<(Variable, Version), Site>,
    /// Reads with a known source, and reads of the zero value.
    reads: HashMap<(Variable, Version), Vec<Site>>,
    /// Reads whose source has not been seen yet.
    dangling: HashMap<(Variable, Version), Vec<Site>>,
    write_nodes: HashMap<Variable, HashSet<NodeId>>,
    wr_edges: HashMap<Variable, HashSet<(NodeId, NodeId)>>,
    witnesses: HashMap<(NodeId, NodeId), Vec<Witness<Variable>>>,
    /// Writes overwritten by their own transaction.
    internal_writes: HashSet<OperationId>,
}

impl<'h, Variable, Version> Checker<'h, Variable, Version>
where
    Variable: Clone + Eq + Hash + Debug,
    Version: Value,
{
    #[must_use]
    pub fn new(history: &'h History<Variable, Version>, config: Config) -> Self {
        Self {
            history,
            config,
            graph: CausalityGraph::new(config.algorithm.strategy(), history.session_size()),
            report: Report::new(config.isolation),
            writes: HashMap::new(),
            reads: HashMap::new(),
            dangling: HashMap::new(),
            write_nodes: HashMap::new(),
            wr_edges: HashMap::new(),
            witnesses: HashMap::new(),
            internal_writes: HashSet::new(),
        }
    }

    /// Runs every phase the configured level needs and returns the findings.
    /// A checker runs once; build a new one to check again.
    ///
    /// # Errors
    ///
    /// Only setup errors; anomalies are findings in the report.
    pub fn run(&mut self) -> Result<Report, Error> {
        tracing::debug!(
            sessions = self.history.session_size(),
            isolation = %self.config.isolation,
            algorithm = %self.config.algorithm,
            "checking history"
        );

        self.build_commit_order()?;
        tracing::debug!(
            nodes = self.graph.len(),
            wr_pairs = self.witnesses.len(),
            dangling = self.dangling.len(),
            "commit order built"
        );
        self.check_commit_order()?;

        if self.config.isolation > IsolationLevel::ReadCommitted {
            self.graph.sync_co_ao();
            if self.config.algorithm.uses_lists() {
                self.build_list_arbitration()?;
            }
            self.build_arbitration()?;
            let cyclic = self.graph.has_cycle(Relation::Arbitration)?;
            tracing::debug!(cyclic, "arbitration order built");
            if cyclic {
                self.check_arbitration()?;
            }
        }

        self.report.violations.sort();
        self.report.violations.dedup();
        self.report.traversal_steps = self.graph.steps();
        tracing::debug!(verdict = self.report.verdict(), taps = ?self.report.taps, "check finished");
        Ok(self.report.clone())
    }

    /// The graph as built so far.
    #[must_use]
    pub const fn graph(&self) -> &CausalityGraph<Variable> {
        &self.graph
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

/// Checks `history` against `config.isolation` on a fresh graph.
///
/// # Errors
///
/// Only setup errors; anomalies are findings in the returned [`Report`].
pub fn check<Variable, Version>(
    history: &History<Variable, Version>,
    config: &Config,
) -> Result<Report, Error>
where
    Variable: Clone + Eq + Hash + Debug,
    Version: Value,
{
    Checker::new(history, *config).run()
}

//! Graphviz output for violations.

use std::fmt::Debug;
use std::fs;
use std::hash::Hash;
use std::path::Path;

use petgraph::dot::Dot;
use petgraph::graph::DiGraph;
use tapcheck_core::history::types::TransactionId;
use tapcheck_core::{History, Report, Tap, Violation};

fn label<Variable, Version>(history: &History<Variable, Version>, id: TransactionId) -> String
where
    Variable: Debug + Eq + Hash,
    Version: Debug + Eq + Hash,
{
    let name = format!("s{}t{}", id.session_id, id.session_height);
    history
        .transaction(id)
        .map_or_else(|| name.clone(), |txn| format!("{name} {txn:?}"))
}

/// The transactions of `violation` and the orders between them.
///
/// A pair is a commit-order cycle. In a triple `(t1, t2, t3)`, `t3` reads
/// from `t1` and `t2` happens before `t3` after `t1`.
#[must_use]
pub fn violation_graph<Variable, Version>(
    history: &History<Variable, Version>,
    violation: &Violation,
) -> DiGraph<String, &'static str>
where
    Variable: Debug + Eq + Hash,
    Version: Debug + Eq + Hash,
{
    let mut graph = DiGraph::new();
    let nodes: Vec<_> = violation
        .transactions
        .iter()
        .map(|&id| graph.add_node(label(history, id)))
        .collect();
    match nodes.as_slice() {
        &[t1, t2] => {
            graph.add_edge(t1, t2, "co");
            graph.add_edge(t2, t1, "co");
        }
        &[t1, t2, t3] => {
            let arbitrated = violation.taps.iter().any(|tap| {
                matches!(
                    tap,
                    Tap::FracturedReadAO | Tap::NonMonoReadAO | Tap::ConflictAO
                )
            });
            graph.add_edge(t1, t3, "wr");
            graph.add_edge(t1, t2, if arbitrated { "ao" } else { "co" });
            graph.add_edge(t2, t3, "co");
        }
        _ => {}
    }
    graph
}

/// Writes `<stem>-<n>.dot` into `dir` for every violation of `report`.
/// Failures are logged and skipped. Returns the number of files written.
pub fn write_violations<Variable, Version>(
    dir: &Path,
    stem: &str,
    history: &History<Variable, Version>,
    report: &Report,
) -> usize
where
    Variable: Debug + Eq + Hash,
    Version: Debug + Eq + Hash,
{
    if report.violations.is_empty() {
        return 0;
    }
    if let Err(e) = fs::create_dir_all(dir) {
        tracing::warn!(dir = %dir.display(), error = %e, "cannot create visualization directory");
        return 0;
    }

    let mut written = 0;
    for (n, violation) in report.violations.iter().enumerate() {
        let graph = violation_graph(history, violation);
        let taps: Vec<String> = violation.taps.iter().map(ToString::to_string).collect();
        let contents = format!("// {}\n{}", taps.join(", "), Dot::new(&graph));
        let path = dir.join(format!("{stem}-{n}.dot"));
        match fs::write(&path, contents) {
            Ok(()) => written += 1,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot write violation graph");
            }
        }
    }
    written
}

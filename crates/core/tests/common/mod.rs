#![allow(dead_code)]

use rand::distr::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use tapcheck_core::history::types::OpKind;
use tapcheck_core::{check, Algorithm, Config, History, IsolationLevel, Report};

/// DSL macro for building test histories.
///
/// Produces `History<&'static str, u64>`.
///
/// # Syntax
///
/// ```ignore
/// history! {
///     [
///         { w(x, 1), w(y, 1) },          // committed transaction
///         aborted { w(z, 99) },          // aborted transaction
///     ],
///     [
///         { r(x, 1), r(y, 1) },
///         { r(z) },                      // r(var) reads the zero value
///     ],
/// }
/// ```
///
/// - `w(var, val)` → write of `val`
/// - `r(var, val)` → read of `val`
/// - `r(var)`      → read of `0`
///
/// Aborted transactions are not part of their session; their writes become
/// aborted writes.
///
/// Build a single operation.
#[macro_export]
macro_rules! op {
    (w($var:ident, $val:expr)) => {
        (
            tapcheck_core::history::types::OpKind::Write,
            stringify!($var),
            $val as u64,
        )
    };
    (r($var:ident, $val:expr)) => {
        (
            tapcheck_core::history::types::OpKind::Read,
            stringify!($var),
            $val as u64,
        )
    };
    (r($var:ident)) => {
        (
            tapcheck_core::history::types::OpKind::Read,
            stringify!($var),
            0u64,
        )
    };
}

/// Internal TT-muncher: accumulate transactions into a session Vec.
#[macro_export]
macro_rules! session_inner {
    // Base: nothing left
    (@acc $acc:expr ;) => { $acc };

    // aborted { ... } , rest
    (@acc $acc:expr ; aborted { $($e:ident($($args:tt)*)),* $(,)? } , $($rest:tt)*) => {{
        let mut v = $acc;
        v.push((true, vec![$($crate::op!($e($($args)*))),*]));
        $crate::session_inner!(@acc v ; $($rest)*)
    }};

    // aborted { ... }  trailing (no comma)
    (@acc $acc:expr ; aborted { $($e:ident($($args:tt)*)),* $(,)? }) => {{
        let mut v = $acc;
        v.push((true, vec![$($crate::op!($e($($args)*))),*]));
        v
    }};

    // { ... } , rest
    (@acc $acc:expr ; { $($e:ident($($args:tt)*)),* $(,)? } , $($rest:tt)*) => {{
        let mut v = $acc;
        v.push((false, vec![$($crate::op!($e($($args)*))),*]));
        $crate::session_inner!(@acc v ; $($rest)*)
    }};

    // { ... }  trailing (no comma)
    (@acc $acc:expr ; { $($e:ident($($args:tt)*)),* $(,)? }) => {{
        let mut v = $acc;
        v.push((false, vec![$($crate::op!($e($($args)*))),*]));
        v
    }};
}

/// Build one session from transaction blocks.
#[macro_export]
macro_rules! session {
    () => {
        Vec::<$crate::common::TxnSpec>::new()
    };
    ($($rest:tt)*) => {{
        let v = Vec::<$crate::common::TxnSpec>::new();
        $crate::session_inner!(@acc v ; $($rest)*)
    }};
}

/// Build a full history: sessions are `[ ... ]` blocks.
#[macro_export]
macro_rules! history {
    ($( [ $($txns:tt)* ] ),* $(,)?) => {
        $crate::common::build_history(vec![
            $($crate::session!($($txns)*)),*
        ])
    };
}

pub type OpSpec = (OpKind, &'static str, u64);

/// `(aborted, operations)`
pub type TxnSpec = (bool, Vec<OpSpec>);

pub fn build_history(sessions: Vec<Vec<TxnSpec>>) -> History<&'static str, u64> {
    let mut history = History::new();
    for (session_id, txns) in sessions.into_iter().enumerate() {
        let session_id = session_id as u64;
        while history.session_size() as u64 <= session_id {
            history.add_session();
        }
        for (aborted, ops) in txns {
            if aborted {
                for (kind, variable, value) in ops {
                    if kind == OpKind::Write {
                        history.add_aborted_write(variable, value);
                    }
                }
            } else {
                history.push_transaction(session_id, ops);
            }
        }
    }
    history
}

pub fn config(isolation: IsolationLevel, algorithm: Algorithm) -> Config {
    Config::builder()
        .isolation(isolation)
        .algorithm(algorithm)
        .build()
}

pub const STRATEGIES: [Algorithm; 3] = [
    Algorithm::TreeClock,
    Algorithm::VectorClock,
    Algorithm::BruteForce,
];

/// Checks with every strategy, asserts they agree and returns the report.
pub fn check_all<V>(history: &History<&'static str, V>, isolation: IsolationLevel) -> Report
where
    V: tapcheck_core::Value,
{
    let reports: Vec<Report> = STRATEGIES
        .iter()
        .map(|&algorithm| check(history, &config(isolation, algorithm)).unwrap())
        .collect();
    for report in &reports[1..] {
        assert_eq!(report.taps, reports[0].taps);
        assert_eq!(report.counts, reports[0].counts);
    }
    reports.into_iter().next().unwrap()
}

pub const VARIABLES: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

/// Random history whose reads only observe writes of transactions earlier
/// in round-robin order, so the commit order is acyclic.
///
/// Reads mostly see the latest visible version of a variable, sometimes an
/// older one, and sometimes the zero value.
pub fn random_history(
    seed: u64,
    n_session: u64,
    n_transaction: u64,
    n_op: u64,
    n_variable: usize,
) -> History<&'static str, u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let variable_range = Uniform::new(0, n_variable.min(VARIABLES.len())).unwrap();
    let mut counters: std::collections::HashMap<&str, u64> = std::collections::HashMap::new();
    let mut written: std::collections::HashMap<&str, Vec<u64>> = std::collections::HashMap::new();
    let mut history = History::new();

    for _ in 0..n_transaction {
        for session in 0..n_session {
            let visible = written.clone();
            let txn = history.add_transaction(session);
            for _ in 0..n_op {
                let variable = VARIABLES[variable_range.sample(&mut rng)];
                if rng.random::<bool>() {
                    let versions = visible.get(variable).map_or(&[][..], Vec::as_slice);
                    let value = match versions {
                        [] => 0,
                        _ if rng.random_ratio(1, 10) => 0,
                        [.., latest] if rng.random_ratio(3, 4) => *latest,
                        _ => versions[rng.random_range(0..versions.len())],
                    };
                    history.add_operation(txn, OpKind::Read, variable, value);
                } else {
                    let version = {
                        let entry = counters.entry(variable).or_default();
                        *entry += 1;
                        *entry
                    };
                    history.add_operation(txn, OpKind::Write, variable, version);
                    written.entry(variable).or_default().push(version);
                }
            }
        }
    }
    history
}

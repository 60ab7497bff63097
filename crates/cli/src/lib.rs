//! tapcheck CLI -- check recorded histories for transactional anomaly
//! patterns.

pub mod render;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tapcheck_core::{Algorithm, IsolationLevel};

#[derive(Debug, Parser)]
#[command(
    name = "tapcheck",
    about = "Check transactional histories against causal isolation levels"
)]
pub struct App {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check history files and print ACCEPT or REJECT for each
    Check(CheckArgs),
    /// Print the JSON Schema of the check report to stdout
    Schema,
}

#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// History files, or directories of history files
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Reachability strategy
    #[arg(short, long, value_enum, default_value_t = AlgorithmArg::TreeClock)]
    pub algorithm: AlgorithmArg,
    /// Isolation level to check
    #[arg(short, long, value_enum, default_value_t = IsolationArg::Tcc)]
    pub isolation: IsolationArg,
    /// Write one Graphviz file per violation into this directory
    #[arg(long, value_name = "DIR")]
    pub visualize: Option<PathBuf>,
    /// Print the number of nodes visited while checking
    #[arg(long)]
    pub count_steps: bool,
    /// Output results as JSON (one object per file)
    #[arg(long)]
    pub json: bool,
    /// Input format; `auto` reads `.edn` files and list checks as EDN
    #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
    pub format: FormatArg,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
    #[value(alias = "tc")]
    TreeClock,
    #[value(alias = "vc")]
    VectorClock,
    #[value(alias = "bf")]
    BruteForce,
    #[value(alias = "list-values")]
    List,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum IsolationArg {
    #[value(alias = "read-committed")]
    Rc,
    #[value(alias = "read-atomic")]
    Ra,
    #[value(alias = "transactional-causal")]
    Tcc,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Auto,
    Text,
    Edn,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(algorithm: AlgorithmArg) -> Self {
        match algorithm {
            AlgorithmArg::TreeClock => Self::TreeClock,
            AlgorithmArg::VectorClock => Self::VectorClock,
            AlgorithmArg::BruteForce => Self::BruteForce,
            AlgorithmArg::List => Self::ListValues,
        }
    }
}

impl From<IsolationArg> for IsolationLevel {
    fn from(level: IsolationArg) -> Self {
        match level {
            IsolationArg::Rc => Self::ReadCommitted,
            IsolationArg::Ra => Self::ReadAtomic,
            IsolationArg::Tcc => Self::TransactionalCausal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_defaults() {
        let app = App::try_parse_from(["tapcheck", "check", "h.txt"]).expect("should parse");
        let Command::Check(args) = app.command else {
            panic!("expected check");
        };
        assert_eq!(args.algorithm, AlgorithmArg::TreeClock);
        assert_eq!(args.isolation, IsolationArg::Tcc);
        assert_eq!(args.format, FormatArg::Auto);
        assert!(args.visualize.is_none());
    }

    #[test]
    fn test_short_aliases() {
        let app = App::try_parse_from(["tapcheck", "check", "-a", "vc", "-i", "ra", "a", "b"])
            .expect("should parse");
        let Command::Check(args) = app.command else {
            panic!("expected check");
        };
        assert_eq!(Algorithm::from(args.algorithm), Algorithm::VectorClock);
        assert_eq!(IsolationLevel::from(args.isolation), IsolationLevel::ReadAtomic);
        assert_eq!(args.paths.len(), 2);
    }

    #[test]
    fn test_paths_are_required() {
        assert!(App::try_parse_from(["tapcheck", "check"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory as _;
        App::command().debug_assert();
    }
}

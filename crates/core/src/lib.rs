//! Offline checking of transactional histories against causal isolation
//! levels.
//!
//! `tapcheck_core` decides whether a recorded history satisfies one of three
//! levels, ordered from weakest to strongest:
//!
//! 1. **Read Committed** -- no transaction observes aborted, intermediate or
//!    non-existent writes, and the commit order is acyclic.
//! 2. **Read Atomic** -- additionally, reads inside a transaction are
//!    repeatable and no transaction sees only part of another one.
//! 3. **Transactional Causal Consistency** -- additionally, no transaction
//!    reads a write that a causally earlier write already overwrote.
//!
//! A history violates a level exactly when it shows one of the
//! transactional anomaly patterns ([`Tap`]) the level prohibits. The checker
//! builds a commit-order graph (session order plus write-read order) and,
//! above Read Committed, an arbitration graph on top of it, and looks for
//! the patterns in both. Each node carries a logical clock so ancestor
//! queries stay cheap while the graph grows; tree clocks, vector clocks and
//! plain graph search are interchangeable and give identical findings.
//!
//! # Entry point
//!
//! ```rust
//! use tapcheck_core::history::types::OpKind;
//! use tapcheck_core::{check, Config, History, IsolationLevel, Tap};
//!
//! let mut history: History<&str, u64> = History::new();
//! history.push_transaction(0, [(OpKind::Write, "x", 1)]);
//! history.push_transaction(1, [(OpKind::Read, "x", 0), (OpKind::Read, "x", 2)]);
//!
//! let config = Config::builder()
//!     .isolation(IsolationLevel::ReadCommitted)
//!     .build();
//! let report = check(&history, &config).unwrap();
//! assert_eq!(report.verdict(), "REJECT");
//! assert!(report.taps.contains(&Tap::ThinAirRead));
//! ```
//!
//! # Crate features
//!
//! - **`serde`** -- `Serialize`/`Deserialize` on the history model, the
//!   configuration and the report.
//! - **`schemars`** -- `JsonSchema` on the configuration and the report.
//!
//! This crate is `no_std` compatible (requires `alloc`). Parsing history
//! files lives in the separate `tapcheck_parser` crate.

#![cfg_attr(not(any(test, feature = "schemars")), no_std)]
extern crate alloc;

pub mod consistency;
pub mod graph;
pub mod history;

pub use consistency::config::{Algorithm, Config};
pub use consistency::error::Error;
pub use consistency::policy::IsolationLevel;
pub use consistency::report::{Report, Violation};
pub use consistency::tap::Tap;
pub use consistency::{check, Checker};
pub use graph::Strategy;
pub use history::value::{ListValue, Value};
pub use history::History;

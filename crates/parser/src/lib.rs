//! Loaders for recorded histories.
//!
//! Two formats are understood:
//!
//! - the compact text format ([`parse_text`]), one session per block of
//!   lines, scalar `u64` versions;
//! - Jepsen-style EDN list-append histories ([`parse_edn`]), one session per
//!   client process, list values.

pub mod edn;
pub mod error;
pub mod lexer;
pub mod text;

pub use edn::parse_edn;
pub use error::ParseError;
pub use lexer::{tokenize, Token, TokenKind};
pub use text::parse_text;

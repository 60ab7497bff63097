//! Winnow-based parser for the compact history text format.
//!
//! Grammar:
//! ```text
//! history      = session (separator session)*
//! separator    = NEWLINE DASH+ NEWLINE
//! session      = (comment | session_line)*
//! comment      = "//" REST_OF_LINE NEWLINE
//! session_line = transaction (WHITESPACE transaction)* NEWLINE
//! transaction  = "[" op (WHITESPACE op)* "]" "!"?
//! op           = variable ":=" version   -- write
//!              | variable "==" version   -- read
//!              | variable "==?"          -- read of the initial value
//! variable     = IDENT
//! version      = INTEGER
//! ```
//!
//! A trailing `!` marks an aborted transaction. Its writes become aborted
//! writes of the history and the transaction itself is left out of its
//! session.
use tapcheck_core::history::types::OpKind;
use tapcheck_core::History;
use winnow::ascii::{dec_uint, newline, till_line_ending};
use winnow::combinator::{alt, eof, opt, repeat, separated};
use winnow::prelude::*;
use winnow::token::{literal, take_while};
use winnow::ModalResult;

use crate::error::ParseError;

type Op = (OpKind, String, u64);

/// A bracketed transaction as written in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    ops: Vec<Op>,
    aborted: bool,
}

/// Parse a compact text history.
///
/// Sessions are numbered in order of appearance, starting at 0; a session
/// with no committed transaction still counts.
///
/// # Errors
///
/// Returns a [`ParseError`] with line/column information when the input does
/// not conform to the grammar.
pub fn parse_text(input: &str) -> Result<History<String, u64>, ParseError> {
    let mut stream: &str = input;
    let sessions = history_parser.parse_next(&mut stream).map_err(|e| {
        let consumed = input.len().saturating_sub(stream.len());
        ParseError::at(input, consumed, e.to_string())
    })?;

    let mut history = History::new();
    for blocks in sessions {
        let session_id = history.add_session();
        for block in blocks {
            if block.aborted {
                for (kind, variable, value) in block.ops {
                    if kind == OpKind::Write {
                        history.add_aborted_write(variable, value);
                    }
                }
            } else {
                history.push_transaction(session_id, block.ops);
            }
        }
    }
    Ok(history)
}

/// Inline whitespace: spaces and tabs only (no newlines).
fn inline_ws(input: &mut &str) -> ModalResult<()> {
    take_while(1.., |c: char| c == ' ' || c == '\t')
        .void()
        .parse_next(input)
}

fn opt_inline_ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c == ' ' || c == '\t')
        .void()
        .parse_next(input)
}

fn variable(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_')
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

fn version(input: &mut &str) -> ModalResult<u64> {
    dec_uint.parse_next(input)
}

fn write_op(input: &mut &str) -> ModalResult<Op> {
    let var = variable.parse_next(input)?;
    literal(":=").parse_next(input)?;
    let ver = version.parse_next(input)?;
    Ok((OpKind::Write, var, ver))
}

fn initial_read_op(input: &mut &str) -> ModalResult<Op> {
    let var = variable.parse_next(input)?;
    literal("==?").parse_next(input)?;
    Ok((OpKind::Read, var, 0))
}

fn read_op(input: &mut &str) -> ModalResult<Op> {
    let var = variable.parse_next(input)?;
    literal("==").parse_next(input)?;
    let ver = version.parse_next(input)?;
    Ok((OpKind::Read, var, ver))
}

/// `==?` must be tried before `==` since it shares the prefix.
fn op(input: &mut &str) -> ModalResult<Op> {
    alt((write_op, initial_read_op, read_op)).parse_next(input)
}

fn transaction(input: &mut &str) -> ModalResult<Block> {
    literal("[").parse_next(input)?;
    let ops: Vec<Op> = separated(1.., op, inline_ws).parse_next(input)?;
    literal("]").parse_next(input)?;
    let aborted = opt(literal("!")).parse_next(input)?.is_some();
    Ok(Block { ops, aborted })
}

/// A newline, or the end of input on the last line.
fn line_end(input: &mut &str) -> ModalResult<()> {
    alt((newline.void(), eof.void())).parse_next(input)
}

fn comment_line(input: &mut &str) -> ModalResult<Option<Vec<Block>>> {
    literal("//").parse_next(input)?;
    till_line_ending.parse_next(input)?;
    line_end.parse_next(input)?;
    Ok(None)
}

fn session_line(input: &mut &str) -> ModalResult<Option<Vec<Block>>> {
    opt_inline_ws.parse_next(input)?;
    let blocks: Vec<Block> = separated(1.., transaction, inline_ws).parse_next(input)?;
    opt_inline_ws.parse_next(input)?;
    line_end.parse_next(input)?;
    Ok(Some(blocks))
}

fn blank_line(input: &mut &str) -> ModalResult<Option<Vec<Block>>> {
    opt_inline_ws.parse_next(input)?;
    newline.parse_next(input)?;
    Ok(None)
}

fn session_item(input: &mut &str) -> ModalResult<Option<Vec<Block>>> {
    alt((comment_line, blank_line, session_line)).parse_next(input)
}

fn separator(input: &mut &str) -> ModalResult<()> {
    opt_inline_ws.parse_next(input)?;
    take_while(1.., '-').parse_next(input)?;
    opt_inline_ws.parse_next(input)?;
    newline.parse_next(input)?;
    Ok(())
}

/// Items up to the next separator or the end of input.
fn session(input: &mut &str) -> ModalResult<Vec<Block>> {
    let mut blocks = Vec::new();
    loop {
        let trimmed = input.trim_start_matches([' ', '\t']);
        if trimmed.starts_with('-') || trimmed.is_empty() {
            break;
        }
        if let Some(mut line) = session_item.parse_next(input)? {
            blocks.append(&mut line);
        }
    }
    Ok(blocks)
}

fn history_parser(input: &mut &str) -> ModalResult<Vec<Vec<Block>>> {
    let mut sessions = vec![session.parse_next(input)?];
    while separator.parse_next(input).is_ok() {
        sessions.push(session.parse_next(input)?);
    }

    repeat::<_, _, (), _, _>(0.., blank_line).parse_next(input)?;
    if !input.is_empty() {
        return Err(winnow::error::ErrMode::Backtrack(
            winnow::error::ContextError::new(),
        ));
    }
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use tapcheck_core::history::types::TransactionId;

    use super::*;

    fn w(var: &str, ver: u64) -> Op {
        (OpKind::Write, var.to_string(), ver)
    }
    fn r(var: &str, ver: u64) -> Op {
        (OpKind::Read, var.to_string(), ver)
    }

    /// The operations of every transaction, session by session.
    fn ops(history: &History<String, u64>) -> Vec<Vec<Vec<Op>>> {
        history
            .sessions()
            .iter()
            .map(|session| {
                session
                    .transactions
                    .iter()
                    .map(|txn| {
                        txn.operations
                            .iter()
                            .map(|op| (op.kind, op.variable.clone(), op.value))
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_single_session() {
        let h = parse_text("[x:=1 y:=1]\n").expect("should parse");
        assert_eq!(ops(&h), vec![vec![vec![w("x", 1), w("y", 1)]]]);
    }

    #[test]
    fn test_multi_session_with_separator() {
        let h = parse_text("[x:=1]\n---\n[y:=2]\n").expect("should parse");
        assert_eq!(h.session_size(), 2);
        assert_eq!(ops(&h), vec![vec![vec![w("x", 1)]], vec![vec![w("y", 2)]]]);
    }

    #[test]
    fn test_multiple_transactions_per_line() {
        let h = parse_text("[x:=1 y:=1] [z==2 z:=3]\n[y:=3]\n").expect("should parse");
        assert_eq!(
            ops(&h),
            vec![vec![
                vec![w("x", 1), w("y", 1)],
                vec![r("z", 2), w("z", 3)],
                vec![w("y", 3)],
            ]]
        );
        let third = TransactionId {
            session_id: 0,
            session_height: 2,
        };
        assert!(h.transaction(third).is_some());
    }

    #[test]
    fn test_aborted_transaction_becomes_aborted_writes() {
        let h = parse_text("[x:=1 y==3]! [x:=2]\n").expect("should parse");
        assert_eq!(ops(&h), vec![vec![vec![w("x", 2)]]]);
        assert!(h.aborted_writes().contains(&("x".to_string(), 1)));
        assert!(!h.aborted_writes().contains(&("y".to_string(), 3)));
    }

    #[test]
    fn test_initial_value_read() {
        let h = parse_text("[x==?]\n").expect("should parse");
        assert_eq!(ops(&h), vec![vec![vec![r("x", 0)]]]);
    }

    #[test]
    fn test_comments_are_skipped() {
        let input = "// session 1\n[x:=1]\n---\n// session 2\n[y:=2]\n";
        let h = parse_text(input).expect("should parse");
        assert_eq!(ops(&h), vec![vec![vec![w("x", 1)]], vec![vec![w("y", 2)]]]);
    }

    #[test]
    fn test_empty_session_between_separators() {
        let h = parse_text("[x:=1]\n---\n---\n[y:=2]\n").expect("should parse");
        assert_eq!(h.session_size(), 3);
        assert!(h.sessions()[1].transactions.is_empty());
    }

    #[test]
    fn test_full_example() {
        let input = "\
// session 1
[x:=1 y:=1] [z==2 z:=3]
[y:=3]
---
// session 2
[a==1 b:=3] [c:=3]
[d==3]
";
        let h = parse_text(input).expect("should parse full example");
        let sessions = ops(&h);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[1][0], vec![r("a", 1), w("b", 3)]);
        assert_eq!(sessions[1][2], vec![r("d", 3)]);
        assert_eq!(h.operations().count(), 9);
    }

    #[test]
    fn test_operation_indices_follow_input_order() {
        let h = parse_text("[a:=1 b==2 c==? d:=5]\n").expect("should parse");
        let indices: Vec<u64> = h.operations().map(|op| op.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_blank_lines_in_session() {
        let h = parse_text("[x:=1]\n\n[y:=2]\n").expect("should parse with blank lines");
        assert_eq!(h.session_size(), 1);
        assert_eq!(h.sessions()[0].transactions.len(), 2);
    }

    #[test]
    fn test_only_comment_is_one_empty_session() {
        let h = parse_text("// just a comment\n").expect("should parse empty session");
        assert_eq!(h.session_size(), 1);
        assert!(h.sessions()[0].transactions.is_empty());
    }

    #[test]
    fn test_parse_error_has_line_column() {
        let err = parse_text("[x:=1]\n@bad\n").expect_err("should fail");
        assert_eq!(err.line, 2, "expected error on line 2, got: {err}");
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn test_last_line_without_newline() {
        let h = parse_text("[x:=1]\n---\n[x==1]").expect("should parse");
        assert_eq!(ops(&h), vec![vec![vec![w("x", 1)]], vec![vec![r("x", 1)]]]);
    }

    #[test]
    fn test_missing_version_is_an_error() {
        assert!(parse_text("[x:=]\n").is_err());
    }
}

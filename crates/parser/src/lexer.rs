//! Logos-based lexer for EDN history files.
//!
//! Only the subset of EDN that Jepsen-style histories use is recognised:
//! collections, keywords, symbols, integers, floats, strings, `nil`,
//! booleans and tagged literals. Commas are whitespace and `;` starts a
//! comment that runs to the end of the line.
//!
//! # Example input
//!
//! ```text
//! {:type :invoke, :f :txn, :value [[:append 5 1] [:r 5 nil]], :process 0}
//! {:type :ok, :f :txn, :value [[:append 5 1] [:r 5 [1]]], :process 0}
//! ```

use core::ops::Range;

use crate::error::ParseError;

/// All token kinds produced by the EDN lexer.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(::logos::Logos, Debug, Copy, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n,]+")]
#[logos(skip(r";[^\n]*", allow_greedy = true))]
pub enum TokenKind {
    #[token("{")]
    BraceOpen,

    #[token("}")]
    BraceClose,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    /// Opening of a set literal `#{`.
    #[token("#{")]
    SetOpen,

    /// A keyword such as `:type` or `:append`.
    #[regex(r":[a-zA-Z0-9_*+!?<>=./\-]+")]
    Keyword,

    /// A tagged-literal tag such as `#inst` or `#jepsen.history.Op`.
    #[regex(r"#[a-zA-Z][a-zA-Z0-9_./\-]*")]
    Tag,

    #[token("nil")]
    Nil,

    #[token("true")]
    True,

    #[token("false")]
    False,

    /// An integer literal, optionally negative.
    #[regex(r"-?[0-9]+")]
    Integer,

    /// A decimal literal with a fraction and optional exponent.
    #[regex(r"-?[0-9]+\.[0-9]+([eE][+\-]?[0-9]+)?")]
    Float,

    /// A double-quoted string with backslash escapes.
    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    /// A bare symbol. Symbols never start with a digit or `-`, so negative
    /// numbers stay integers.
    #[regex(r"[a-zA-Z_*+!?<>=./][a-zA-Z0-9_*+!?<>=./:\-]*")]
    Symbol,
}

/// A single token with its kind and the byte-offset span in the source.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte range `start..end` into the input string.
    pub span: Range<usize>,
}

impl Token {
    #[must_use]
    pub const fn new(kind: TokenKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }

    /// Return the source text for this token given the input it was lexed from.
    #[must_use]
    pub fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.span.clone()]
    }
}

/// Tokenize `input`.
///
/// # Errors
///
/// Returns a [`ParseError`] at the first character the lexer cannot
/// recognise.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    use logos::Logos as _;
    TokenKind::lexer(input)
        .spanned()
        .map(|(result, span)| match result {
            Ok(kind) => Ok(Token { kind, span }),
            Err(()) => Err(ParseError::at(
                input,
                span.start,
                format!("unexpected character sequence `{}`", &input[span]),
            )),
        })
        .collect()
}

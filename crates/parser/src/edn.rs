//! Jepsen-style list-append histories in EDN.
//!
//! The input is a sequence of operation maps, either one per line or wrapped
//! in a single vector or list:
//!
//! ```text
//! {:type :invoke, :f :txn, :value [[:append x 1] [:r y nil]], :process 0}
//! {:type :ok, :f :txn, :value [[:append x 1] [:r y [3 4]]], :process 0}
//! ```
//!
//! Each client process is one session, numbered in order of the first
//! completed operation of the process. `:invoke` operations are skipped,
//! `:ok` operations become transactions, the appends of `:fail` operations
//! become aborted writes, and `:info` operations, whose reads are unknown,
//! become transactions of their appends alone. Operations of a non-numeric
//! process such as `:nemesis` are skipped.

use std::collections::HashMap;

use tapcheck_core::history::types::OpKind;
use tapcheck_core::{History, ListValue};

use crate::error::ParseError;
use crate::lexer::{tokenize, Token, TokenKind};

/// A parsed EDN form with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
struct Form<'a> {
    offset: usize,
    kind: FormKind<'a>,
}

#[derive(Debug, Clone, PartialEq)]
enum FormKind<'a> {
    Nil,
    Integer(i64),
    String(&'a str),
    Keyword(&'a str),
    Symbol(&'a str),
    Vector(Vec<Form<'a>>),
    List(Vec<Form<'a>>),
    Map(Vec<(Form<'a>, Form<'a>)>),
    /// Booleans, floats and sets, which no operation field needs.
    Other,
}

impl<'a> Form<'a> {
    fn items(&self) -> Option<&[Self]> {
        match &self.kind {
            FormKind::Vector(items) | FormKind::List(items) => Some(items),
            _ => None,
        }
    }

    fn get(&self, key: &str) -> Option<&Self> {
        let FormKind::Map(entries) = &self.kind else {
            return None;
        };
        entries
            .iter()
            .find(|(k, _)| matches!(k.kind, FormKind::Keyword(name) if name == key))
            .map(|(_, v)| v)
    }

    fn keyword(&self) -> Option<&'a str> {
        match self.kind {
            FormKind::Keyword(name) => Some(name),
            _ => None,
        }
    }
}

/// Recursive-descent reader over the token stream.
struct Reader<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Result<Self, ParseError> {
        Ok(Self {
            input,
            tokens: tokenize(input)?,
            pos: 0,
        })
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> ParseError {
        ParseError::at(self.input, offset, message)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next_token(&mut self) -> Result<Token, ParseError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| self.error(self.input.len(), "unexpected end of input"))?;
        self.pos += 1;
        Ok(token)
    }

    /// Forms up to the closing token, which is consumed.
    fn sequence(&mut self, close: TokenKind, open_at: usize) -> Result<Vec<Form<'a>>, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                Some(token) if token.kind == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) => items.push(self.form()?),
                None => return Err(self.error(open_at, "unclosed collection")),
            }
        }
    }

    fn form(&mut self) -> Result<Form<'a>, ParseError> {
        let token = self.next_token()?;
        let offset = token.span.start;
        let input = self.input;
        let text = &input[token.span];
        let kind = match token.kind {
            TokenKind::Nil => FormKind::Nil,
            TokenKind::True | TokenKind::False | TokenKind::Float => FormKind::Other,
            TokenKind::Integer => FormKind::Integer(
                text.parse()
                    .map_err(|_| self.error(offset, format!("integer out of range: {text}")))?,
            ),
            TokenKind::String => FormKind::String(&text[1..text.len() - 1]),
            TokenKind::Keyword => FormKind::Keyword(&text[1..]),
            TokenKind::Symbol => FormKind::Symbol(text),
            TokenKind::BracketOpen => FormKind::Vector(self.sequence(TokenKind::BracketClose, offset)?),
            TokenKind::ParenOpen => FormKind::List(self.sequence(TokenKind::ParenClose, offset)?),
            TokenKind::SetOpen => {
                self.sequence(TokenKind::BraceClose, offset)?;
                FormKind::Other
            }
            TokenKind::BraceOpen => {
                let items = self.sequence(TokenKind::BraceClose, offset)?;
                if items.len() % 2 != 0 {
                    return Err(self.error(offset, "map with an odd number of forms"));
                }
                let mut entries = Vec::with_capacity(items.len() / 2);
                let mut items = items.into_iter();
                while let (Some(key), Some(value)) = (items.next(), items.next()) {
                    entries.push((key, value));
                }
                FormKind::Map(entries)
            }
            // a tagged literal reads as the form it tags
            TokenKind::Tag => return self.form(),
            TokenKind::BracketClose | TokenKind::ParenClose | TokenKind::BraceClose => {
                return Err(self.error(offset, format!("unexpected `{text}`")));
            }
        };
        Ok(Form { offset, kind })
    }
}

type ListOp = (OpKind, String, ListValue<u64>);

/// Parse an EDN list-append history.
///
/// # Errors
///
/// Returns a [`ParseError`] for malformed EDN and for operation maps that
/// lack a `:type` or carry micro-operations other than `:append` and `:r`.
pub fn parse_edn(input: &str) -> Result<History<String, ListValue<u64>>, ParseError> {
    let mut reader = Reader::new(input)?;
    let mut forms = Vec::new();
    while !reader.at_end() {
        forms.push(reader.form()?);
    }
    let wrapped = match forms.as_slice() {
        [single] => single.items().map(<[Form<'_>]>::to_vec),
        _ => None,
    };
    let ops = wrapped.unwrap_or(forms);

    let mut history = History::new();
    let mut sessions: HashMap<i64, u64> = HashMap::new();
    for op in &ops {
        let kind = op
            .get("type")
            .and_then(Form::keyword)
            .ok_or_else(|| reader.error(op.offset, "operation without a :type keyword"))?;
        let Some(FormKind::Integer(process)) = op.get("process").map(|p| &p.kind) else {
            continue;
        };
        if kind == "invoke" {
            continue;
        }
        let micro_ops = micro_ops(&reader, op)?;
        match kind {
            "ok" | "info" => {
                let committed: Vec<ListOp> = if kind == "ok" {
                    micro_ops
                } else {
                    micro_ops
                        .into_iter()
                        .filter(|(op_kind, _, _)| *op_kind == OpKind::Write)
                        .collect()
                };
                if committed.is_empty() && kind == "info" {
                    continue;
                }
                let session_id = *sessions
                    .entry(*process)
                    .or_insert_with(|| history.add_session());
                history.push_transaction(session_id, committed);
            }
            "fail" => {
                for (op_kind, variable, value) in micro_ops {
                    if op_kind == OpKind::Write {
                        history.add_aborted_write(variable, value);
                    }
                }
            }
            other => {
                return Err(reader.error(op.offset, format!("unknown operation type :{other}")));
            }
        }
    }
    Ok(history)
}

/// The micro-operations in the `:value` of an operation map.
fn micro_ops(reader: &Reader<'_>, op: &Form<'_>) -> Result<Vec<ListOp>, ParseError> {
    let Some(value) = op.get("value") else {
        return Ok(Vec::new());
    };
    let Some(items) = value.items() else {
        if value.kind == FormKind::Nil {
            return Ok(Vec::new());
        }
        return Err(reader.error(value.offset, "expected a vector of micro-operations"));
    };
    items.iter().map(|item| micro_op(reader, item)).collect()
}

fn micro_op(reader: &Reader<'_>, form: &Form<'_>) -> Result<ListOp, ParseError> {
    let [f, key, value] = form.items().unwrap_or_default() else {
        return Err(reader.error(form.offset, "expected [:f key value]"));
    };
    let variable = match &key.kind {
        FormKind::Integer(n) => n.to_string(),
        FormKind::String(s) | FormKind::Keyword(s) | FormKind::Symbol(s) => (*s).to_string(),
        _ => return Err(reader.error(key.offset, "unsupported key")),
    };
    match f.keyword() {
        Some("append") => Ok((OpKind::Write, variable, ListValue::Append(element(reader, value)?))),
        Some("r") => {
            let elements = match value.items() {
                Some(items) => items
                    .iter()
                    .map(|item| element(reader, item))
                    .collect::<Result<Vec<_>, _>>()?,
                None if value.kind == FormKind::Nil => Vec::new(),
                None => return Err(reader.error(value.offset, "expected a list of elements or nil")),
            };
            Ok((OpKind::Read, variable, ListValue::Read(elements)))
        }
        _ => Err(reader.error(f.offset, "expected :append or :r")),
    }
}

fn element(reader: &Reader<'_>, form: &Form<'_>) -> Result<u64, ParseError> {
    match form.kind {
        FormKind::Integer(n) => u64::try_from(n)
            .map_err(|_| reader.error(form.offset, "list elements must be non-negative")),
        _ => Err(reader.error(form.offset, "list elements must be integers")),
    }
}

#[cfg(test)]
mod tests {
    use tapcheck_core::history::types::TransactionId;

    use super::*;

    fn append(key: &str, element: u64) -> ListOp {
        (OpKind::Write, key.to_string(), ListValue::Append(element))
    }

    fn read(key: &str, elements: &[u64]) -> ListOp {
        (OpKind::Read, key.to_string(), ListValue::Read(elements.to_vec()))
    }

    fn ops_of(history: &History<String, ListValue<u64>>, session_id: u64, height: u64) -> Vec<ListOp> {
        history
            .transaction(TransactionId {
                session_id,
                session_height: height,
            })
            .expect("transaction exists")
            .operations
            .iter()
            .map(|op| (op.kind, op.variable.clone(), op.value.clone()))
            .collect()
    }

    const HISTORY: &str = r#"
{:type :invoke, :f :txn, :value [[:append 5 1] [:r 5 nil]], :process 3, :time 10}
{:type :invoke, :f :txn, :value [[:r 5 nil]], :process 1, :time 11}
{:type :ok, :f :txn, :value [[:append 5 1] [:r 5 [1]]], :process 3, :time 12}
{:type :ok, :f :txn, :value [[:r 5 [1]]], :process 1, :time 13}
{:type :invoke, :f :txn, :value [[:append 6 2]], :process 3, :time 14}
{:type :fail, :f :txn, :value [[:append 6 2]], :process 3, :time 15, :error [:aborted]}
{:type :info, :f :start, :value nil, :process :nemesis}
{:type :invoke, :f :txn, :value [[:append "k" 7] [:r 5 nil]], :process 1}
{:type :info, :f :txn, :value [[:append "k" 7] [:r 5 nil]], :process 1}
"#;

    #[test]
    fn test_sessions_follow_processes() {
        let h = parse_edn(HISTORY).expect("should parse");
        assert_eq!(h.session_size(), 2);
        assert_eq!(ops_of(&h, 0, 0), vec![append("5", 1), read("5", &[1])]);
        assert_eq!(ops_of(&h, 1, 0), vec![read("5", &[1])]);
    }

    #[test]
    fn test_failed_appends_are_aborted() {
        let h = parse_edn(HISTORY).expect("should parse");
        assert!(h
            .aborted_writes()
            .contains(&("6".to_string(), ListValue::Append(2))));
        assert_eq!(h.sessions()[0].transactions.len(), 1);
    }

    #[test]
    fn test_indeterminate_operation_keeps_appends_only() {
        let h = parse_edn(HISTORY).expect("should parse");
        assert_eq!(ops_of(&h, 1, 1), vec![append("k", 7)]);
    }

    #[test]
    fn test_wrapped_in_a_vector() {
        let input = "[{:type :ok, :value [[:r x nil]], :process 0}\n {:type :ok, :value [[:append x 1]], :process 0}]";
        let h = parse_edn(input).expect("should parse");
        assert_eq!(ops_of(&h, 0, 0), vec![read("x", &[])]);
        assert_eq!(ops_of(&h, 0, 1), vec![append("x", 1)]);
    }

    #[test]
    fn test_tagged_operations() {
        let input = "#jepsen.history.Op{:type :ok, :value [[:append :k 3]], :process 0}";
        let h = parse_edn(input).expect("should parse");
        assert_eq!(ops_of(&h, 0, 0), vec![append("k", 3)]);
    }

    #[test]
    fn test_missing_type_is_an_error() {
        let err = parse_edn("{:value [], :process 0}\n").expect_err("should fail");
        assert_eq!(err.line, 1);
        assert!(err.message.contains(":type"));
    }

    #[test]
    fn test_unknown_micro_op_is_an_error() {
        let err = parse_edn("{:type :ok\n :value [[:cas x 1]], :process 0}").expect_err("should fail");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unclosed_map_is_an_error() {
        let err = parse_edn("{:type :ok").expect_err("should fail");
        assert_eq!((err.line, err.column), (1, 1));
    }

    #[test]
    fn test_negative_element_is_an_error() {
        assert!(parse_edn("{:type :ok, :value [[:append x -1]], :process 0}").is_err());
    }
}

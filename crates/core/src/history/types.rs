use alloc::vec::Vec;
use core::fmt::{Debug, Formatter, Result};

/// Whether an operation reads or writes its variable.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpKind {
    Read,
    Write,
}

/// Unique identifier for a transaction within a history.
///
/// A transaction is identified by the session it belongs to (`session_id`)
/// and its position within that session (`session_height`). The pair is also
/// the lookup key into the owning [`History`](super::History), so it doubles
/// as the non-owning back-reference from an operation to its transaction and
/// from a transaction to its session.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId {
    /// 0-based session index, also the session's clock slot.
    pub session_id: u64,
    /// 0-based position of the transaction within its session.
    pub session_height: u64,
}

/// Uniquely identifies an operation by transaction and position.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationId {
    pub session_id: u64,
    pub session_height: u64,
    pub index: u64,
}

impl OperationId {
    #[must_use]
    pub const fn transaction_id(&self) -> TransactionId {
        TransactionId {
            session_id: self.session_id,
            session_height: self.session_height,
        }
    }
}

/// A single read or write of a variable inside a transaction.
///
/// Two operations are equal only if kind, variable, value, owning
/// transaction and index all match.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Operation<Variable, Value> {
    pub kind: OpKind,
    pub variable: Variable,
    pub value: Value,
    pub transaction: TransactionId,
    /// 0-based position inside the owning transaction.
    pub index: u64,
}

impl<Variable, Value> Operation<Variable, Value> {
    #[must_use]
    pub const fn id(&self) -> OperationId {
        OperationId {
            session_id: self.transaction.session_id,
            session_height: self.transaction.session_height,
            index: self.index,
        }
    }

    #[must_use]
    pub fn is_read(&self) -> bool {
        self.kind == OpKind::Read
    }

    #[must_use]
    pub fn is_write(&self) -> bool {
        self.kind == OpKind::Write
    }
}

impl<Variable, Value> Debug for Operation<Variable, Value>
where
    Variable: Debug,
    Value: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self.kind {
            OpKind::Read => write!(f, "{:?}=>{:?}", self.variable, self.value),
            OpKind::Write => write!(f, "{:?}<={:?}", self.variable, self.value),
        }
    }
}

/// Committed transaction: operations in program order.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Clone, PartialEq, Eq)]
pub struct Transaction<Variable, Value> {
    pub id: TransactionId,
    pub operations: Vec<Operation<Variable, Value>>,
}

impl<Variable, Value> Transaction<Variable, Value> {
    /// Id of the owning session.
    #[must_use]
    pub const fn session_id(&self) -> u64 {
        self.id.session_id
    }
}

impl<Variable, Value> Debug for Transaction<Variable, Value>
where
    Variable: Debug,
    Value: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{:?}", self.operations)
    }
}

/// An ordered sequence of transactions from a single client.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session<Variable, Value> {
    pub id: u64,
    pub transactions: Vec<Transaction<Variable, Value>>,
}

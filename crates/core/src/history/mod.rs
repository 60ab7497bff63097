//! The history model: sessions own transactions, transactions own
//! operations, and back-references are ids into the owning history.

pub mod types;
pub mod value;

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashSet;

use self::types::{OpKind, Operation, OperationId, Session, Transaction, TransactionId};

/// A recorded execution: committed transactions grouped by session, plus the
/// `(variable, value)` pairs written by aborted transactions.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct History<Variable, Value>
where
    Variable: Eq + Hash,
    Value: Eq + Hash,
{
    sessions: Vec<Session<Variable, Value>>,
    aborted_writes: HashSet<(Variable, Value)>,
}

impl<Variable, Value> Default for History<Variable, Value>
where
    Variable: Eq + Hash,
    Value: Eq + Hash,
{
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            aborted_writes: HashSet::new(),
        }
    }
}

impl<Variable, Value> History<Variable, Value>
where
    Variable: Eq + Hash,
    Value: Eq + Hash,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an empty session and returns its id.
    pub fn add_session(&mut self) -> u64 {
        let id = self.sessions.len() as u64;
        self.sessions.push(Session {
            id,
            transactions: Vec::new(),
        });
        id
    }

    /// Appends an empty transaction to session `session_id`, creating the
    /// session (and any missing sessions before it) if needed.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_transaction(&mut self, session_id: u64) -> TransactionId {
        while self.sessions.len() as u64 <= session_id {
            self.add_session();
        }
        let session = &mut self.sessions[session_id as usize];
        let id = TransactionId {
            session_id,
            session_height: session.transactions.len() as u64,
        };
        session.transactions.push(Transaction {
            id,
            operations: Vec::new(),
        });
        id
    }

    /// Appends an operation to `transaction`, assigning the next index.
    ///
    /// Returns `None` if the transaction does not exist.
    pub fn add_operation(
        &mut self,
        transaction: TransactionId,
        kind: OpKind,
        variable: Variable,
        value: Value,
    ) -> Option<OperationId> {
        let txn = self.transaction_mut(transaction)?;
        let op = Operation {
            kind,
            variable,
            value,
            transaction,
            index: txn.operations.len() as u64,
        };
        let id = op.id();
        txn.operations.push(op);
        Some(id)
    }

    /// Appends a transaction with the given operations to `session_id`.
    pub fn push_transaction<I>(&mut self, session_id: u64, operations: I) -> TransactionId
    where
        I: IntoIterator<Item = (OpKind, Variable, Value)>,
    {
        let id = self.add_transaction(session_id);
        for (kind, variable, value) in operations {
            self.add_operation(id, kind, variable, value);
        }
        id
    }

    pub fn add_aborted_write(&mut self, variable: Variable, value: Value) {
        self.aborted_writes.insert((variable, value));
    }

    #[must_use]
    pub fn sessions(&self) -> &[Session<Variable, Value>] {
        &self.sessions
    }

    #[must_use]
    pub const fn aborted_writes(&self) -> &HashSet<(Variable, Value)> {
        &self.aborted_writes
    }

    /// Number of sessions; sizes the per-node clocks.
    #[must_use]
    pub fn session_size(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction<Variable, Value>> {
        self.sessions
            .get(id.session_id as usize)?
            .transactions
            .get(id.session_height as usize)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn transaction_mut(&mut self, id: TransactionId) -> Option<&mut Transaction<Variable, Value>> {
        self.sessions
            .get_mut(id.session_id as usize)?
            .transactions
            .get_mut(id.session_height as usize)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn operation(&self, id: OperationId) -> Option<&Operation<Variable, Value>> {
        self.transaction(id.transaction_id())?
            .operations
            .get(id.index as usize)
    }

    /// All operations, session by session in program order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation<Variable, Value>> {
        self.sessions
            .iter()
            .flat_map(|session| session.transactions.iter())
            .flat_map(|txn| txn.operations.iter())
    }

    /// Interleaves sessions round-robin by position: every session's first
    /// transaction, then every session's second transaction, and so on.
    ///
    /// This is the global processing order of the checker.
    #[must_use]
    pub fn flatten(&self) -> Vec<&Transaction<Variable, Value>> {
        let max_len = self
            .sessions
            .iter()
            .map(|session| session.transactions.len())
            .max()
            .unwrap_or(0);
        let mut result = Vec::new();
        for height in 0..max_len {
            for session in &self.sessions {
                if let Some(txn) = session.transactions.get(height) {
                    result.push(txn);
                }
            }
        }
        result
    }
}

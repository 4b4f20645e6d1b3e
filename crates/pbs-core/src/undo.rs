//! Undo/Redo functionality for transactions
//!
//! Committed transactions are kept on two stacks and replayed against the store in
//! the undo or redo direction.

use tracing::{error, info};

use pbs_api::{ChangeOrigin, ModelChanges, PbsError, Result};

use crate::store::Store;
use crate::transaction::{Transaction, TransactionStatus};

/// Undo/redo history stack
///
/// Maintains two stacks:
/// - `undo`: committed (or redone) transactions, most recent last
/// - `redo`: undone transactions, most recently undone last
pub struct UndoStack {
    undo: Vec<Transaction>,
    redo: Vec<Transaction>,
    /// Maximum number of transactions to keep in undo stack
    max_size: usize,
}

impl UndoStack {
    /// Create a new undo stack with default max size
    pub fn new() -> Self {
        Self::with_max_size(100)
    }

    /// Create a new undo stack with specified max size
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_size,
        }
    }

    /// Push a freshly committed transaction.
    ///
    /// A new mutation invalidates the undone future, so the redo stack is cleared.
    /// Open transactions are rejected.
    pub fn push(&mut self, transaction: Transaction) -> Result<()> {
        if transaction.status() == TransactionStatus::Open {
            return Err(PbsError::invalid(format!(
                "transaction '{}' must be committed before it is pushed",
                transaction.label()
            )));
        }
        self.redo.clear();
        self.undo.push(transaction);

        while self.undo.len() > self.max_size {
            let dropped = self.undo.remove(0);
            info!("Undo history full, forgetting '{}'", dropped.label());
        }
        Ok(())
    }

    /// Revert the most recent transaction and move it to the redo stack.
    ///
    /// Returns `Ok(None)` when there is nothing to undo. A transaction that cannot
    /// be replayed is dropped from the history and reported.
    pub fn undo(&mut self, store: &mut Store) -> Result<Option<ModelChanges>> {
        let Some(mut transaction) = self.undo.pop() else {
            return Ok(None);
        };
        if let Err(err) = transaction.replay_revert(store) {
            error!("Undo of '{}' failed, dropping it: {}", transaction.label(), err);
            return Err(err);
        }
        info!("Undo '{}'", transaction.label());
        let changes = transaction.changes(ChangeOrigin::Undo);
        transaction.set_status(TransactionStatus::Undone);
        self.redo.push(transaction);
        Ok(Some(changes))
    }

    /// Re-apply the most recently undone transaction and move it back to the undo stack.
    pub fn redo(&mut self, store: &mut Store) -> Result<Option<ModelChanges>> {
        let Some(mut transaction) = self.redo.pop() else {
            return Ok(None);
        };
        if let Err(err) = transaction.replay_apply(store) {
            error!("Redo of '{}' failed, dropping it: {}", transaction.label(), err);
            return Err(err);
        }
        info!("Redo '{}'", transaction.label());
        let changes = transaction.changes(ChangeOrigin::Redo);
        transaction.set_status(TransactionStatus::Redone);
        self.undo.push(transaction);
        Ok(Some(changes))
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Clear the redo stack
    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    /// Forget the whole history, e.g. after opening a new document
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Get the label of the next undo transaction (for UI)
    pub fn next_undo_label(&self) -> Option<&str> {
        self.undo.last().map(|t| t.label())
    }

    /// Get the label of the next redo transaction (for UI)
    pub fn next_redo_label(&self) -> Option<&str> {
        self.redo.last().map(|t| t.label())
    }

    /// Undo history labels, most recent first
    pub fn undo_labels(&self) -> Vec<&str> {
        self.undo.iter().rev().map(|t| t.label()).collect()
    }

    /// Redo history labels, next to redo first
    pub fn redo_labels(&self) -> Vec<&str> {
        self.redo.iter().rev().map(|t| t.label()).collect()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::AtomicOperation;
    use pbs_api::TagId;

    fn committed_create(store: &mut Store, name: &str) -> Transaction {
        let mut txn = Transaction::open(format!("Create Tag {}", name));
        let op = AtomicOperation::CreateTag {
            id: store.allocate_tag_id(),
            parent: TagId::ROOT,
            index: store.children(TagId::ROOT).len(),
            name: name.to_string(),
            icon: None,
        };
        txn.execute(store, op).unwrap();
        txn.commit()
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut store = Store::new();
        let mut stack = UndoStack::new();
        let empty = store.snapshot();

        let txn = committed_create(&mut store, "Work");
        stack.push(txn).unwrap();
        let after = store.snapshot();

        assert_eq!(stack.undo[0].status(), TransactionStatus::Committed);

        assert!(stack.undo(&mut store).unwrap().is_some());
        assert_eq!(store.snapshot(), empty);
        assert_eq!(stack.next_redo_label(), Some("Create Tag Work"));
        assert_eq!(stack.redo[0].status(), TransactionStatus::Undone);

        assert!(stack.redo(&mut store).unwrap().is_some());
        assert_eq!(store.snapshot(), after);
        assert!(!stack.can_redo());
        assert_eq!(stack.undo[0].status(), TransactionStatus::Redone);
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let mut store = Store::new();
        let mut stack = UndoStack::new();
        assert!(stack.undo(&mut store).unwrap().is_none());
        assert!(stack.redo(&mut store).unwrap().is_none());
    }

    #[test]
    fn test_push_clears_redo() {
        let mut store = Store::new();
        let mut stack = UndoStack::new();
        let txn = committed_create(&mut store, "Work");
        stack.push(txn).unwrap();
        stack.undo(&mut store).unwrap();
        assert!(stack.can_redo());

        let txn = committed_create(&mut store, "Home");
        stack.push(txn).unwrap();
        assert!(!stack.can_redo());
        assert_eq!(stack.undo_labels(), vec!["Create Tag Home"]);
    }

    #[test]
    fn test_max_size_trims_oldest() {
        let mut store = Store::new();
        let mut stack = UndoStack::with_max_size(2);
        for name in ["A", "B", "C"] {
            let txn = committed_create(&mut store, name);
            stack.push(txn).unwrap();
        }
        assert_eq!(stack.undo_labels(), vec!["Create Tag C", "Create Tag B"]);
    }

    #[test]
    fn test_open_transaction_is_not_pushable() {
        let mut stack = UndoStack::new();
        assert!(stack.push(Transaction::open("Pending")).is_err());
        assert!(!stack.can_undo());
        assert!(stack.push(Transaction::open("Done").commit()).is_ok());
    }
}

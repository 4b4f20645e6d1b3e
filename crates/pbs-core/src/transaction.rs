//! Transactions: named sequences of atomic operations
//!
//! A transaction is the unit pushed on the undo and redo stacks. While open it
//! executes and records operations; once committed its operation list is frozen.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use pbs_api::{ChangeOrigin, ModelChanges, PbsError, Result};

use crate::operation::AtomicOperation;
use crate::store::Store;

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Operations are still being recorded
    Open,
    /// Frozen and sitting on the undo stack
    Committed,
    /// Reverted and sitting on the redo stack
    Undone,
    /// Replayed forward and back on the undo stack
    Redone,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Open => "open",
            TransactionStatus::Committed => "committed",
            TransactionStatus::Undone => "undone",
            TransactionStatus::Redone => "redone",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Human readable label, e.g. "Delete Tag Foo"
    label: String,
    operations: Vec<AtomicOperation>,
    status: TransactionStatus,
    /// When the transaction was committed (Unix timestamp in milliseconds)
    committed_at: Option<i64>,
}

impl Transaction {
    pub fn open(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            operations: Vec::new(),
            status: TransactionStatus::Open,
            committed_at: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn operations(&self) -> &[AtomicOperation] {
        &self.operations
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn committed_at(&self) -> Option<i64> {
        self.committed_at
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Apply `op` to the store and record it. Nothing is recorded if it fails.
    pub fn execute(&mut self, store: &mut Store, op: AtomicOperation) -> Result<()> {
        if self.status != TransactionStatus::Open {
            return Err(PbsError::invalid(format!(
                "transaction '{}' is {}",
                self.label, self.status
            )));
        }
        op.apply(store)?;
        debug!("[{}] {} {:?}", self.label, op.name(), op);
        self.operations.push(op);
        Ok(())
    }

    /// Freeze the operation list.
    pub fn commit(mut self) -> Self {
        self.status = TransactionStatus::Committed;
        self.committed_at = Some(chrono::Utc::now().timestamp_millis());
        self
    }

    /// Revert every operation recorded after `checkpoint`, newest first, and
    /// forget them. Used to discard a failed (possibly nested) scope.
    ///
    /// An operation is forgotten only once reverted; on failure it stays recorded
    /// and the error names it.
    pub fn rollback_to(&mut self, store: &mut Store, checkpoint: usize) -> Result<()> {
        while self.operations.len() > checkpoint {
            let Some(op) = self.operations.last() else {
                break;
            };
            if let Err(err) = op.revert(store) {
                return Err(self.corrupt(op, err));
            }
            self.operations.pop();
        }
        Ok(())
    }

    /// Revert everything; the transaction is consumed.
    pub fn rollback(mut self, store: &mut Store) -> Result<()> {
        self.rollback_to(store, 0)
    }

    /// Undo direction: revert in reverse order.
    ///
    /// If an operation fails, the ones already reverted are re-applied so the store
    /// is left as it was before the call.
    pub(crate) fn replay_revert(&self, store: &mut Store) -> Result<()> {
        for (idx, op) in self.operations.iter().enumerate().rev() {
            if let Err(err) = op.revert(store) {
                for done in &self.operations[idx + 1..] {
                    if let Err(comp) = done.apply(store) {
                        error!(
                            "[{}] compensation of {} failed: {}",
                            self.label,
                            done.name(),
                            comp
                        );
                    }
                }
                return Err(self.corrupt(op, err));
            }
        }
        Ok(())
    }

    /// Redo direction: apply in original order, compensating on failure.
    pub(crate) fn replay_apply(&self, store: &mut Store) -> Result<()> {
        for (idx, op) in self.operations.iter().enumerate() {
            if let Err(err) = op.apply(store) {
                for done in self.operations[..idx].iter().rev() {
                    if let Err(comp) = done.revert(store) {
                        error!(
                            "[{}] compensation of {} failed: {}",
                            self.label,
                            done.name(),
                            comp
                        );
                    }
                }
                return Err(self.corrupt(op, err));
            }
        }
        Ok(())
    }

    pub(crate) fn set_status(&mut self, status: TransactionStatus) {
        self.status = status;
    }

    fn corrupt(&self, op: &AtomicOperation, err: PbsError) -> PbsError {
        PbsError::CorruptTransaction {
            label: self.label.clone(),
            message: format!("{} failed: {}", op.name(), err),
        }
    }

    /// Net changes of this transaction when replayed in the given direction.
    pub fn changes(&self, origin: ChangeOrigin) -> ModelChanges {
        let mut changes = ModelChanges::new(origin, self.label.clone());
        match origin {
            ChangeOrigin::Undo => {
                for op in self.operations.iter().rev() {
                    op.invert().record_changes(&mut changes);
                }
            }
            ChangeOrigin::Local | ChangeOrigin::Redo => {
                for op in &self.operations {
                    op.record_changes(&mut changes);
                }
            }
        }
        changes
    }
}

//! Controller: the single entry point for mutating the model
//!
//! Every mutation runs inside a transaction opened by [`Controller::undoable_operation`].
//! Public operations called outside such a scope open an implicit one labelled
//! after the call. On success the transaction is committed, pushed onto the undo
//! stack and observers are notified; on error every operation it recorded is
//! reverted and nothing is pushed or notified.

mod portable;
mod selection;
mod shortcuts;
mod tags;

use tracing::{debug, error, info, warn};

use pbs_api::{ChangeOrigin, ModelChanges, PbsError, Result, ShortcutId, TagId};
use pbs_core::{AtomicOperation, Shortcut, Store, Tag, Transaction, UndoStack};

use crate::conflict::ConflictResolver;
use crate::context::AppContext;
use crate::observer::{ModelObserver, ObserverId, ObserverSet};
use crate::registry::Invocation;

pub use portable::PasteReport;
pub use shortcuts::{ShortcutDraft, ShortcutUpdate};
pub use tags::TagUpdate;

pub struct Controller {
    context: AppContext,
    store: Store,
    undo_stack: UndoStack,
    /// Outermost open transaction, if any
    open: Option<Transaction>,
    observers: ObserverSet,
    resolver: Option<Box<dyn ConflictResolver>>,
}

impl Controller {
    /// Controller over an empty store (root tag only)
    pub fn new(context: AppContext) -> Self {
        let undo_stack = UndoStack::with_max_size(context.config.undo_depth);
        Self {
            context,
            store: Store::new(),
            undo_stack,
            open: None,
            observers: ObserverSet::new(),
            resolver: None,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.context
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // ------------------------------------------------------------------
    // Transactions
    // ------------------------------------------------------------------

    /// Run `f` as one undoable step.
    ///
    /// A nested call joins the enclosing transaction; if it fails, only the
    /// operations it recorded are reverted before the error is passed on.
    pub fn undoable_operation<T>(
        &mut self,
        label: &str,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if let Some(open) = &self.open {
            let checkpoint = open.len();
            let result = f(self);
            if let Err(err) = &result {
                if let Some(open) = self.open.as_mut() {
                    if let Err(rollback) = open.rollback_to(&mut self.store, checkpoint) {
                        return Err(rollback_failed(label, err, rollback));
                    }
                }
            }
            return result;
        }

        self.open = Some(Transaction::open(label));
        let result = f(self);
        let transaction = self
            .open
            .take()
            .ok_or_else(|| PbsError::invalid(format!("transaction '{}' vanished", label)))?;

        match result {
            Ok(value) => {
                if transaction.is_empty() {
                    debug!("Nothing recorded for '{}'", label);
                    return Ok(value);
                }
                let transaction = transaction.commit();
                info!(
                    "Commit '{}' ({} operations)",
                    transaction.label(),
                    transaction.len()
                );
                let changes = transaction.changes(ChangeOrigin::Local);
                self.undo_stack.push(transaction)?;
                self.notify(&changes);
                Ok(value)
            }
            Err(err) => {
                warn!(
                    "Rolling back '{}' ({} operations): {}",
                    label,
                    transaction.len(),
                    err
                );
                if let Err(rollback) = transaction.rollback(&mut self.store) {
                    return Err(rollback_failed(label, &err, rollback));
                }
                Err(err)
            }
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.open.is_some()
    }

    /// Record `op` in the open transaction.
    fn execute(&mut self, op: AtomicOperation) -> Result<()> {
        let open = self
            .open
            .as_mut()
            .ok_or_else(|| PbsError::invalid("no open transaction"))?;
        open.execute(&mut self.store, op)
    }

    // ------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------

    /// Revert the last committed transaction. Returns false when there is nothing
    /// to undo.
    pub fn undo(&mut self) -> Result<bool> {
        self.ensure_idle("undo")?;
        let result = self.undo_stack.undo(&mut self.store);
        self.finish_replay(result, ChangeOrigin::Undo)
    }

    pub fn redo(&mut self) -> Result<bool> {
        self.ensure_idle("redo")?;
        let result = self.undo_stack.redo(&mut self.store);
        self.finish_replay(result, ChangeOrigin::Redo)
    }

    fn finish_replay(
        &mut self,
        result: Result<Option<ModelChanges>>,
        origin: ChangeOrigin,
    ) -> Result<bool> {
        match result {
            Ok(Some(changes)) => {
                self.notify(&changes);
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(err) => {
                // The broken transaction left the history
                self.notify(&ModelChanges::new(origin, ""));
                Err(err)
            }
        }
    }

    fn ensure_idle(&self, action: &str) -> Result<()> {
        match &self.open {
            Some(open) => Err(PbsError::invalid(format!(
                "cannot {} while '{}' is open",
                action,
                open.label()
            ))),
            None => Ok(()),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo_stack.can_redo()
    }

    pub fn next_undo_label(&self) -> Option<&str> {
        self.undo_stack.next_undo_label()
    }

    pub fn next_redo_label(&self) -> Option<&str> {
        self.undo_stack.next_redo_label()
    }

    pub fn undo_labels(&self) -> Vec<&str> {
        self.undo_stack.undo_labels()
    }

    pub fn redo_labels(&self) -> Vec<&str> {
        self.undo_stack.redo_labels()
    }

    /// Forget the whole history
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.notify(&ModelChanges::new(ChangeOrigin::Local, ""));
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn find_tag(&self, id: TagId) -> Option<&Tag> {
        self.store.tag(id)
    }

    pub fn find_shortcut(&self, id: ShortcutId) -> Option<&Shortcut> {
        self.store.shortcut(id)
    }

    pub fn find_tags_by_name(&self, name: &str) -> Vec<TagId> {
        self.store.find_tags_by_name(name)
    }

    /// One-line description from the shortcut's type handler
    pub fn summarize(&self, id: ShortcutId) -> Result<String> {
        let shortcut = self.store.require_shortcut(id)?;
        Ok(self.context.registry.summarize(shortcut))
    }

    /// What the platform layer should spawn to run the shortcut
    pub fn invocation(&self, id: ShortcutId) -> Result<Invocation> {
        let shortcut = self.store.require_shortcut(id)?;
        self.context
            .registry
            .require(shortcut.kind())?
            .invocation(shortcut)
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self, observer: Box<dyn ModelObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn ModelObserver>> {
        self.observers.unsubscribe(id)
    }

    /// Install the collaborator asked when the conflict action is `Ask`
    pub fn set_conflict_resolver(&mut self, resolver: Option<Box<dyn ConflictResolver>>) {
        self.resolver = resolver;
    }

    fn notify(&mut self, changes: &ModelChanges) {
        self.observers.notify(
            changes,
            self.undo_stack.next_undo_label(),
            self.undo_stack.next_redo_label(),
        );
    }
}

/// A failed scope could not be reverted; keep both errors.
fn rollback_failed(label: &str, cause: &PbsError, rollback: PbsError) -> PbsError {
    error!("Rollback of '{}' failed: {} (after: {})", label, rollback, cause);
    PbsError::CorruptTransaction {
        label: label.to_string(),
        message: format!("rollback failed: {}; original error: {}", rollback, cause),
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(AppContext::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_scope_leaves_no_trace() {
        let mut ctl = Controller::default();
        let result: Result<()> = ctl.undoable_operation("Broken", |ctl| {
            ctl.create_tag(TagId::ROOT, "Work", None)?;
            Err(PbsError::invalid("boom"))
        });
        assert!(result.is_err());
        assert_eq!(ctl.store().tag_count(), 1);
        assert!(!ctl.can_undo());
        assert!(!ctl.in_transaction());
    }

    #[test]
    fn test_nested_failure_only_reverts_inner_scope() {
        let mut ctl = Controller::default();
        ctl.undoable_operation("Outer", |ctl| {
            ctl.create_tag(TagId::ROOT, "Kept", None)?;
            let inner: Result<()> = ctl.undoable_operation("Inner", |ctl| {
                ctl.create_tag(TagId::ROOT, "Dropped", None)?;
                Err(PbsError::invalid("inner"))
            });
            assert!(inner.is_err());
            Ok(())
        })
        .unwrap();

        assert_eq!(ctl.find_tags_by_name("Kept").len(), 1);
        assert!(ctl.find_tags_by_name("Dropped").is_empty());
        assert_eq!(ctl.undo_labels(), vec!["Outer"]);
    }

    #[test]
    fn test_empty_scope_keeps_redo() {
        let mut ctl = Controller::default();
        ctl.create_tag(TagId::ROOT, "Work", None).unwrap();
        ctl.undo().unwrap();
        ctl.undoable_operation("Nothing", |_| Ok(())).unwrap();
        assert!(ctl.can_redo());
    }

    #[test]
    fn test_failed_rollback_reports_both_errors() {
        let rollback = PbsError::CorruptTransaction {
            label: "Broken".into(),
            message: "RemoveTag failed".into(),
        };
        let err = rollback_failed("Broken", &PbsError::invalid("boom"), rollback);
        match err {
            PbsError::CorruptTransaction { label, message } => {
                assert_eq!(label, "Broken");
                assert!(message.contains("RemoveTag failed"));
                assert!(message.contains("boom"));
            }
            other => panic!("expected a corrupt transaction, got {:?}", other),
        }
    }

    #[test]
    fn test_undo_inside_open_transaction_is_rejected() {
        let mut ctl = Controller::default();
        let result = ctl.undoable_operation("Outer", |ctl| ctl.undo());
        assert!(result.is_err());
    }

    #[test]
    fn test_undo_on_empty_history() {
        let mut ctl = Controller::default();
        assert!(!ctl.undo().unwrap());
        assert!(!ctl.redo().unwrap());
    }
}

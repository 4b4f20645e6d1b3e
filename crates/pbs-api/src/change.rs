//! Change notifications delivered to model observers.
//!
//! A committed, undone or redone transaction is summarized as one `ModelChanges`
//! batch. Changes touching the same entity are coalesced so observers see the net
//! effect of the transaction, not every atomic step.

use serde::{Deserialize, Serialize};

use crate::ids::{ShortcutId, TagId};

/// What triggered a batch of changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeOrigin {
    /// A freshly committed transaction
    Local,
    /// Replay of a transaction in the undo direction
    Undo,
    /// Replay of a transaction in the redo direction
    Redo,
}

/// Net change of a single entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change<Id> {
    Created { id: Id },
    Updated { id: Id },
    Deleted { id: Id },
}

impl<Id: Copy + PartialEq> Change<Id> {
    pub fn id(&self) -> Id {
        match self {
            Change::Created { id } | Change::Updated { id } | Change::Deleted { id } => *id,
        }
    }

    /// Fold a later change into this one. `None` means the two cancel out.
    fn then(self, later: Change<Id>) -> Option<Change<Id>> {
        let id = self.id();
        match (self, later) {
            (Change::Created { .. }, Change::Deleted { .. }) => None,
            (Change::Created { .. }, _) => Some(Change::Created { id }),
            (Change::Deleted { .. }, Change::Created { .. }) => Some(Change::Updated { id }),
            (_, later) => Some(later),
        }
    }
}

/// Coalesced changes of one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelChanges {
    pub origin: ChangeOrigin,
    /// Label of the transaction that produced the changes
    pub label: String,
    pub tags: Vec<Change<TagId>>,
    pub shortcuts: Vec<Change<ShortcutId>>,
}

impl ModelChanges {
    pub fn new(origin: ChangeOrigin, label: impl Into<String>) -> Self {
        Self {
            origin,
            label: label.into(),
            tags: Vec::new(),
            shortcuts: Vec::new(),
        }
    }

    pub fn record_tag(&mut self, change: Change<TagId>) {
        coalesce(&mut self.tags, change);
    }

    pub fn record_shortcut(&mut self, change: Change<ShortcutId>) {
        coalesce(&mut self.shortcuts, change);
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.shortcuts.is_empty()
    }
}

fn coalesce<Id: Copy + PartialEq>(changes: &mut Vec<Change<Id>>, change: Change<Id>) {
    match changes.iter().position(|c| c.id() == change.id()) {
        Some(idx) => match changes[idx].then(change) {
            Some(merged) => changes[idx] = merged,
            None => {
                changes.remove(idx);
            }
        },
        None => changes.push(change),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_update_stays_created() {
        let mut changes = ModelChanges::new(ChangeOrigin::Local, "Create Tag");
        changes.record_tag(Change::Created { id: TagId(1) });
        changes.record_tag(Change::Updated { id: TagId(1) });
        assert_eq!(changes.tags, vec![Change::Created { id: TagId(1) }]);
    }

    #[test]
    fn test_create_then_delete_cancels_out() {
        let mut changes = ModelChanges::new(ChangeOrigin::Local, "Paste");
        changes.record_shortcut(Change::Created { id: ShortcutId(4) });
        changes.record_shortcut(Change::Updated { id: ShortcutId(4) });
        changes.record_shortcut(Change::Deleted { id: ShortcutId(4) });
        assert!(changes.is_empty());
    }

    #[test]
    fn test_delete_then_create_is_update() {
        let mut changes = ModelChanges::new(ChangeOrigin::Undo, "Move");
        changes.record_tag(Change::Updated { id: TagId(2) });
        changes.record_tag(Change::Deleted { id: TagId(3) });
        changes.record_tag(Change::Created { id: TagId(3) });
        assert_eq!(
            changes.tags,
            vec![Change::Updated { id: TagId(2) }, Change::Updated { id: TagId(3) }]
        );
    }
}

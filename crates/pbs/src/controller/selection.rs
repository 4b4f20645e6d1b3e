use pbs_api::{Result, TagId};
use pbs_core::{AtomicOperation, SelectedShortcut, Selection};

use super::Controller;

impl Controller {
    /// Delete everything the selection names directly.
    ///
    /// Primary shortcuts chosen from a tag are only taken out of that tag; those
    /// chosen from the root are deleted outright. Primary tags are deleted with
    /// their subtrees.
    pub fn delete_selection(&mut self, selection: &Selection) -> Result<()> {
        let label = format!("Delete {}", selection.describe(&self.store));
        self.undoable_operation(&label, |ctl| ctl.delete_selection_in_txn(selection))
    }

    /// Move the primary tags under `target` and refile the primary shortcuts from
    /// their context tag to `target`.
    pub fn move_selection(&mut self, selection: &Selection, target: TagId) -> Result<()> {
        let label = format!("Move {}", selection.describe(&self.store));
        self.undoable_operation(&label, |ctl| ctl.move_selection_in_txn(selection, target))
    }

    fn delete_selection_in_txn(&mut self, selection: &Selection) -> Result<()> {
        for SelectedShortcut { shortcut, context } in selection.primary_shortcuts().iter().copied() {
            let Some(record) = self.store.shortcut(shortcut) else {
                continue;
            };
            if context.is_root() {
                self.delete_shortcut_in_txn(shortcut)?;
            } else if record.has_tag(context) {
                self.execute(AtomicOperation::RemoveMembership {
                    shortcut,
                    tag: context,
                })?;
            }
        }
        for tag in selection.primary_tags() {
            if self.store.contains_tag(*tag) {
                self.delete_tag_in_txn(*tag)?;
            }
        }
        Ok(())
    }

    pub(super) fn move_selection_in_txn(&mut self, selection: &Selection, target: TagId) -> Result<()> {
        self.store.require_tag(target)?;
        for tag in selection.primary_tags() {
            if self.store.require_tag(*tag)?.parent() != Some(target) {
                self.execute(AtomicOperation::move_tag(&self.store, *tag, target)?)?;
            }
        }
        for SelectedShortcut { shortcut, context } in selection.primary_shortcuts().iter().copied() {
            if context == target {
                continue;
            }
            let record = self.store.require_shortcut(shortcut)?;
            let in_context = !context.is_root() && record.has_tag(context);
            let in_target = target.is_root() || record.has_tag(target);
            if in_context {
                self.execute(AtomicOperation::RemoveMembership {
                    shortcut,
                    tag: context,
                })?;
            }
            if !in_target {
                self.execute(AtomicOperation::AddMembership {
                    shortcut,
                    tag: target,
                })?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ShortcutDraft;
    use pbs_api::ShortcutId;

    struct Tree {
        ctl: Controller,
        work: TagId,
        rust: TagId,
        home: TagId,
        docs: ShortcutId,
    }

    fn tree() -> Tree {
        let mut ctl = Controller::default();
        let work = ctl.create_tag(TagId::ROOT, "Work", None).unwrap().id().unwrap();
        let rust = ctl.create_tag(work, "Rust", None).unwrap().id().unwrap();
        let home = ctl.create_tag(TagId::ROOT, "Home", None).unwrap().id().unwrap();
        let docs = ctl
            .create_shortcut(
                ShortcutDraft::new("url", "https://doc.rust-lang.org")
                    .tagged(rust)
                    .tagged(home),
            )
            .unwrap()
            .id()
            .unwrap();
        Tree {
            ctl,
            work,
            rust,
            home,
            docs,
        }
    }

    #[test]
    fn test_delete_shortcut_from_context_only() {
        let Tree {
            mut ctl,
            rust,
            home,
            docs,
            ..
        } = tree();
        let mut selection = Selection::new();
        selection.select_shortcut(ctl.store(), docs, rust).unwrap();

        ctl.delete_selection(&selection).unwrap();
        let record = ctl.find_shortcut(docs).unwrap();
        assert!(!record.has_tag(rust));
        assert!(record.has_tag(home));
        assert_eq!(ctl.next_undo_label(), Some("Delete Shortcut https://doc.rust-lang.org"));
    }

    #[test]
    fn test_delete_from_root_context_removes_shortcut() {
        let Tree { mut ctl, docs, .. } = tree();
        let mut selection = Selection::new();
        selection.select_shortcut(ctl.store(), docs, TagId::ROOT).unwrap();

        ctl.delete_selection(&selection).unwrap();
        assert!(ctl.find_shortcut(docs).is_none());
    }

    #[test]
    fn test_move_tag_and_shortcut() {
        let Tree {
            mut ctl,
            work,
            rust,
            home,
            docs,
        } = tree();
        let mut selection = Selection::new();
        selection.select_tag(ctl.store(), rust).unwrap();
        selection.select_shortcut(ctl.store(), docs, home).unwrap();

        ctl.move_selection(&selection, TagId::ROOT).unwrap();
        assert_eq!(ctl.find_tag(rust).unwrap().parent(), Some(TagId::ROOT));
        assert!(ctl.store().children(work).is_empty());
        assert!(!ctl.find_shortcut(docs).unwrap().has_tag(home));

        ctl.undo().unwrap();
        assert_eq!(ctl.find_tag(rust).unwrap().parent(), Some(work));
        assert!(ctl.find_shortcut(docs).unwrap().has_tag(home));
    }

    #[test]
    fn test_move_into_own_subtree_fails_cleanly() {
        let Tree {
            mut ctl, work, rust, ..
        } = tree();
        let before = ctl.store().snapshot();
        let mut selection = Selection::new();
        selection.select_tag(ctl.store(), work).unwrap();

        assert!(ctl.move_selection(&selection, rust).is_err());
        assert_eq!(ctl.store().snapshot(), before);
    }
}

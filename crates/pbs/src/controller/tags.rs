use std::collections::BTreeSet;

use pbs_api::{Icon, PbsError, Result, ShortcutId, TagId};
use pbs_core::AtomicOperation;

use super::Controller;
use crate::config::TagUniqueness;
use crate::conflict::{decide, tag_conflict, Decision, Outcome};

/// Changes to apply to a tag; `None` leaves the attribute alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the icon
    pub icon: Option<Option<Icon>>,
    /// New parent; the tag is appended after the parent's children
    pub parent: Option<TagId>,
}

impl TagUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn reparent(parent: TagId) -> Self {
        Self {
            parent: Some(parent),
            ..Default::default()
        }
    }
}

impl Controller {
    /// Create a tag under `parent`, subject to the tag conflict policy.
    pub fn create_tag(
        &mut self,
        parent: TagId,
        name: impl Into<String>,
        icon: Option<Icon>,
    ) -> Result<Outcome<TagId>> {
        let name = name.into();
        let label = format!("Create Tag {}", name);
        self.undoable_operation(&label, |ctl| ctl.create_tag_in_txn(parent, &name, icon))
    }

    pub fn update_tag(&mut self, id: TagId, update: TagUpdate) -> Result<()> {
        let label = format!("Update Tag {}", self.tag_label(id));
        self.undoable_operation(&label, |ctl| ctl.update_tag_in_txn(id, update))
    }

    /// Delete `id` and its subtree.
    ///
    /// Shortcuts lose their memberships in the deleted tags. Shortcuts left without
    /// any tag are deleted as well when `delete_orphans` is set.
    pub fn delete_tag(&mut self, id: TagId) -> Result<()> {
        let label = format!("Delete Tag {}", self.tag_label(id));
        self.undoable_operation(&label, |ctl| ctl.delete_tag_in_txn(id))
    }

    /// Name used in history labels; the id when the tag is gone
    fn tag_label(&self, id: TagId) -> String {
        match self.store.tag(id) {
            Some(tag) => tag.name().to_string(),
            None => id.to_string(),
        }
    }

    pub(super) fn create_tag_in_txn(
        &mut self,
        parent: TagId,
        name: &str,
        icon: Option<Icon>,
    ) -> Result<Outcome<TagId>> {
        self.store.require_tag(parent)?;
        if name.trim().is_empty() {
            return Err(PbsError::invalid("tag name must not be empty"));
        }

        let policy = self.context.config.conflicts.clone();
        let existing = match policy.tags {
            TagUniqueness::None => None,
            TagUniqueness::Name => self.store.find_child(parent, name, None),
            TagUniqueness::NameAndIcon => self.store.find_child(parent, name, Some(icon.as_ref())),
        };
        if let Some(existing) = existing {
            let conflict = tag_conflict(parent, existing, name);
            return match decide(conflict, existing, policy.action, self.resolver.as_mut())? {
                Decision::Merge {
                    existing,
                    incoming_wins,
                } => {
                    if incoming_wins {
                        self.overwrite_tag(existing, name, icon)?;
                    }
                    Ok(Outcome::Merged(existing))
                }
                Decision::Skip => Ok(Outcome::Skipped),
            };
        }

        self.append_tag(parent, name, icon).map(Outcome::Created)
    }

    /// Append a new tag after the children of `parent`, bypassing the conflict policy.
    pub(super) fn append_tag(&mut self, parent: TagId, name: &str, icon: Option<Icon>) -> Result<TagId> {
        self.store.require_tag(parent)?;
        if name.trim().is_empty() {
            return Err(PbsError::invalid("tag name must not be empty"));
        }
        let id = self.store.allocate_tag_id();
        let index = self.store.children(parent).len();
        self.execute(AtomicOperation::CreateTag {
            id,
            parent,
            index,
            name: name.to_string(),
            icon,
        })?;
        Ok(id)
    }

    fn overwrite_tag(&mut self, id: TagId, name: &str, icon: Option<Icon>) -> Result<()> {
        let tag = self.store.require_tag(id)?;
        let rename = tag.name() != name;
        let reicon = tag.icon() != icon.as_ref();
        if rename {
            self.execute(AtomicOperation::rename_tag(&self.store, id, name)?)?;
        }
        if reicon {
            self.execute(AtomicOperation::set_tag_icon(&self.store, id, icon)?)?;
        }
        Ok(())
    }

    pub(super) fn update_tag_in_txn(&mut self, id: TagId, update: TagUpdate) -> Result<()> {
        if id.is_root() {
            return Err(PbsError::invalid("the root tag cannot be changed"));
        }
        let tag = self.store.require_tag(id)?;
        let current_name = tag.name().to_string();
        let current_icon = tag.icon().cloned();
        let current_parent = tag.parent();

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(PbsError::invalid("tag name must not be empty"));
            }
            if name != current_name {
                self.execute(AtomicOperation::rename_tag(&self.store, id, name)?)?;
            }
        }
        if let Some(icon) = update.icon {
            if icon != current_icon {
                self.execute(AtomicOperation::set_tag_icon(&self.store, id, icon)?)?;
            }
        }
        if let Some(parent) = update.parent {
            if Some(parent) != current_parent {
                self.execute(AtomicOperation::move_tag(&self.store, id, parent)?)?;
            }
        }
        Ok(())
    }

    pub(super) fn delete_tag_in_txn(&mut self, id: TagId) -> Result<()> {
        if id.is_root() {
            return Err(PbsError::RootTag { action: "deleted" });
        }
        self.store.require_tag(id)?;

        let subtree = self.store.subtree_tags(id);
        let memberships: Vec<(ShortcutId, TagId)> = subtree
            .iter()
            .flat_map(|tag| self.store.shortcuts_in(*tag).map(move |s| (s, *tag)))
            .collect();

        let mut affected = BTreeSet::new();
        for (shortcut, tag) in memberships {
            self.execute(AtomicOperation::RemoveMembership { shortcut, tag })?;
            affected.insert(shortcut);
        }

        if self.context.config.delete_orphans {
            for shortcut in affected {
                if self.store.require_shortcut(shortcut)?.is_orphan() {
                    self.execute(AtomicOperation::remove_shortcut(&self.store, shortcut)?)?;
                }
            }
        }

        // Leaves first
        for tag in subtree.into_iter().rev() {
            self.execute(AtomicOperation::remove_tag(&self.store, tag)?)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(outcome: Outcome<TagId>) -> TagId {
        match outcome {
            Outcome::Created(id) => id,
            other => panic!("expected a new tag, got {:?}", other),
        }
    }

    #[test]
    fn test_create_and_rename() {
        let mut ctl = Controller::default();
        let work = created(ctl.create_tag(TagId::ROOT, "Work", None).unwrap());
        ctl.update_tag(work, TagUpdate::rename("Job")).unwrap();

        assert_eq!(ctl.find_tag(work).unwrap().name(), "Job");
        assert_eq!(ctl.undo_labels(), vec!["Update Tag Work", "Create Tag Work"]);

        ctl.delete_tag(work).unwrap();
        assert_eq!(ctl.next_undo_label(), Some("Delete Tag Job"));
    }

    #[test]
    fn test_root_cannot_be_updated_or_deleted() {
        let mut ctl = Controller::default();
        assert!(ctl.update_tag(TagId::ROOT, TagUpdate::rename("x")).is_err());
        assert!(matches!(
            ctl.delete_tag(TagId::ROOT),
            Err(PbsError::RootTag { .. })
        ));
    }

    #[test]
    fn test_reparent_into_descendant_is_cyclic() {
        let mut ctl = Controller::default();
        let a = created(ctl.create_tag(TagId::ROOT, "A", None).unwrap());
        let b = created(ctl.create_tag(a, "B", None).unwrap());

        let err = ctl.update_tag(a, TagUpdate::reparent(b)).unwrap_err();
        assert!(matches!(err, PbsError::CyclicMove { .. }));
        assert_eq!(ctl.find_tag(a).unwrap().parent(), Some(TagId::ROOT));
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let mut ctl = Controller::default();
        assert!(ctl.create_tag(TagId::ROOT, "  ", None).is_err());
        assert!(!ctl.can_undo());
    }

    #[test]
    fn test_delete_restores_sibling_order_on_undo() {
        let mut ctl = Controller::default();
        let a = created(ctl.create_tag(TagId::ROOT, "A", None).unwrap());
        let b = created(ctl.create_tag(TagId::ROOT, "B", None).unwrap());
        let c = created(ctl.create_tag(TagId::ROOT, "C", None).unwrap());

        ctl.delete_tag(b).unwrap();
        assert_eq!(ctl.store().children(TagId::ROOT), &[a, c]);
        ctl.undo().unwrap();
        assert_eq!(ctl.store().children(TagId::ROOT), &[a, b, c]);
    }
}

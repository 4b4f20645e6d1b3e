use std::collections::BTreeSet;

use pbs_api::{Metadata, PbsError, Result, ShortcutId, ShortcutKind, TagId, METADATA_TITLE};
use pbs_core::{shortcut_identity, AtomicOperation};

use super::Controller;
use crate::config::ShortcutUniqueness;
use crate::conflict::{decide, shortcut_conflict, Decision, Outcome};

/// A shortcut to be created
#[derive(Debug, Clone, PartialEq)]
pub struct ShortcutDraft {
    pub kind: ShortcutKind,
    pub content: String,
    pub metadata: Metadata,
    /// Tags to file the shortcut under; the root means no tag
    pub tags: Vec<TagId>,
}

impl ShortcutDraft {
    pub fn new(kind: impl Into<ShortcutKind>, content: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
            metadata: Metadata::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<pbs_api::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn tagged(mut self, tag: TagId) -> Self {
        self.tags.push(tag);
        self
    }

    /// Title if present, otherwise the content
    pub fn display_name(&self) -> &str {
        self.metadata
            .get(METADATA_TITLE)
            .and_then(|v| v.as_string())
            .unwrap_or(&self.content)
    }
}

/// Changes to apply to a shortcut; `None` leaves the attribute alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShortcutUpdate {
    pub kind: Option<ShortcutKind>,
    pub content: Option<String>,
    pub metadata: Option<Metadata>,
    /// Replacement tag set
    pub tags: Option<Vec<TagId>>,
}

impl Controller {
    /// Create a shortcut, subject to the shortcut conflict policy.
    pub fn create_shortcut(&mut self, draft: ShortcutDraft) -> Result<Outcome<ShortcutId>> {
        let label = format!("Create Shortcut {}", draft.display_name());
        self.undoable_operation(&label, |ctl| ctl.create_shortcut_in_txn(draft))
    }

    pub fn update_shortcut(&mut self, id: ShortcutId, update: ShortcutUpdate) -> Result<()> {
        let label = format!("Update Shortcut {}", self.shortcut_label(id));
        self.undoable_operation(&label, |ctl| ctl.update_shortcut_in_txn(id, update))
    }

    /// Remove the shortcut from every tag and delete it.
    pub fn delete_shortcut(&mut self, id: ShortcutId) -> Result<()> {
        let label = format!("Delete Shortcut {}", self.shortcut_label(id));
        self.undoable_operation(&label, |ctl| ctl.delete_shortcut_in_txn(id))
    }

    /// Take the shortcut out of `tag` only. A shortcut losing its last tag is kept.
    pub fn remove_shortcut_from_tag(&mut self, shortcut: ShortcutId, tag: TagId) -> Result<()> {
        let label = format!("Remove Shortcut {} from Tag", self.shortcut_label(shortcut));
        self.undoable_operation(&label, |ctl| {
            if !ctl.store.require_shortcut(shortcut)?.has_tag(tag) {
                return Err(PbsError::invalid(format!(
                    "{} is not filed under {}",
                    shortcut, tag
                )));
            }
            ctl.execute(AtomicOperation::RemoveMembership { shortcut, tag })
        })
    }

    fn shortcut_label(&self, id: ShortcutId) -> String {
        match self.store.shortcut(id) {
            Some(shortcut) => shortcut.display_name().to_string(),
            None => id.to_string(),
        }
    }

    /// Tags a shortcut should end up in: existing, deduplicated, root dropped.
    fn resolve_tags(&self, tags: &[TagId]) -> Result<BTreeSet<TagId>> {
        let mut out = BTreeSet::new();
        for tag in tags {
            self.store.require_tag(*tag)?;
            if !tag.is_root() {
                out.insert(*tag);
            }
        }
        Ok(out)
    }

    fn validate_content(&self, kind: &ShortcutKind, content: &str) -> Result<()> {
        self.context.registry.require(kind)?.validate(content)
    }

    pub(super) fn create_shortcut_in_txn(&mut self, draft: ShortcutDraft) -> Result<Outcome<ShortcutId>> {
        self.validate_content(&draft.kind, &draft.content)?;
        let tags = self.resolve_tags(&draft.tags)?;

        let policy = self.context.config.conflicts.clone();
        let existing = match policy.shortcuts {
            ShortcutUniqueness::None => None,
            ShortcutUniqueness::Identity => self
                .store
                .find_by_identity(&shortcut_identity(&draft.content, &draft.metadata)),
            ShortcutUniqueness::Content => self.store.find_by_content(&draft.content),
        };
        if let Some(existing) = existing {
            let identity = shortcut_identity(&draft.content, &draft.metadata);
            let conflict = shortcut_conflict(existing, identity);
            return match decide(conflict, existing, policy.action, self.resolver.as_mut())? {
                Decision::Merge {
                    existing,
                    incoming_wins,
                } => {
                    if incoming_wins {
                        self.overwrite_shortcut(existing, draft.kind, draft.content, draft.metadata)?;
                    }
                    self.add_tags(existing, &tags)?;
                    Ok(Outcome::Merged(existing))
                }
                Decision::Skip => Ok(Outcome::Skipped),
            };
        }

        self.insert_shortcut(draft, &tags).map(Outcome::Created)
    }

    /// Create the shortcut as drafted, bypassing the conflict policy.
    pub(super) fn restore_shortcut(&mut self, draft: ShortcutDraft) -> Result<ShortcutId> {
        self.validate_content(&draft.kind, &draft.content)?;
        let tags = self.resolve_tags(&draft.tags)?;
        self.insert_shortcut(draft, &tags)
    }

    fn insert_shortcut(&mut self, draft: ShortcutDraft, tags: &BTreeSet<TagId>) -> Result<ShortcutId> {
        let id = self.store.allocate_shortcut_id();
        self.execute(AtomicOperation::CreateShortcut {
            id,
            kind: draft.kind,
            content: draft.content,
            metadata: draft.metadata,
        })?;
        self.add_tags(id, tags)?;
        Ok(id)
    }

    /// File `id` under every tag of `tags` it is not already in.
    pub(super) fn add_tags(&mut self, id: ShortcutId, tags: &BTreeSet<TagId>) -> Result<()> {
        for tag in tags {
            if !self.store.require_shortcut(id)?.has_tag(*tag) {
                self.execute(AtomicOperation::AddMembership {
                    shortcut: id,
                    tag: *tag,
                })?;
            }
        }
        Ok(())
    }

    fn overwrite_shortcut(
        &mut self,
        id: ShortcutId,
        kind: ShortcutKind,
        content: String,
        metadata: Metadata,
    ) -> Result<()> {
        let shortcut = self.store.require_shortcut(id)?;
        let kind_changed = *shortcut.kind() != kind;
        let content_changed = shortcut.content() != content;
        let metadata_changed = *shortcut.metadata() != metadata;
        if kind_changed {
            self.execute(AtomicOperation::set_shortcut_kind(&self.store, id, kind)?)?;
        }
        if content_changed {
            self.execute(AtomicOperation::set_shortcut_content(&self.store, id, content)?)?;
        }
        if metadata_changed {
            self.execute(AtomicOperation::set_shortcut_metadata(&self.store, id, metadata)?)?;
        }
        Ok(())
    }

    pub(super) fn update_shortcut_in_txn(&mut self, id: ShortcutId, update: ShortcutUpdate) -> Result<()> {
        let shortcut = self.store.require_shortcut(id)?;
        let kind = update.kind.unwrap_or_else(|| shortcut.kind().clone());
        let content = update
            .content
            .unwrap_or_else(|| shortcut.content().to_string());
        let metadata = update
            .metadata
            .unwrap_or_else(|| shortcut.metadata().clone());
        self.validate_content(&kind, &content)?;
        self.overwrite_shortcut(id, kind, content, metadata)?;

        if let Some(tags) = update.tags {
            let wanted = self.resolve_tags(&tags)?;
            self.replace_tags(id, &wanted)?;
        }
        Ok(())
    }

    /// Make the tag set of `id` equal to `wanted` with one membership change per
    /// element of the symmetric difference.
    fn replace_tags(&mut self, id: ShortcutId, wanted: &BTreeSet<TagId>) -> Result<()> {
        let current = self.store.require_shortcut(id)?.tags().clone();
        for tag in current.difference(wanted) {
            self.execute(AtomicOperation::RemoveMembership {
                shortcut: id,
                tag: *tag,
            })?;
        }
        for tag in wanted.difference(&current) {
            self.execute(AtomicOperation::AddMembership {
                shortcut: id,
                tag: *tag,
            })?;
        }
        Ok(())
    }

    pub(super) fn delete_shortcut_in_txn(&mut self, id: ShortcutId) -> Result<()> {
        let tags = self.store.require_shortcut(id)?.tags().clone();
        for tag in tags {
            self.execute(AtomicOperation::RemoveMembership { shortcut: id, tag })?;
        }
        self.execute(AtomicOperation::remove_shortcut(&self.store, id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbs_api::Value;

    fn tag(ctl: &mut Controller, name: &str) -> TagId {
        ctl.create_tag(TagId::ROOT, name, None).unwrap().id().unwrap()
    }

    #[test]
    fn test_create_files_under_tags() {
        let mut ctl = Controller::default();
        let work = tag(&mut ctl, "Work");
        let id = ctl
            .create_shortcut(
                ShortcutDraft::new("url", "http://example.com")
                    .with_metadata("title", "Ex")
                    .tagged(work)
                    .tagged(TagId::ROOT),
            )
            .unwrap()
            .id()
            .unwrap();

        let shortcut = ctl.find_shortcut(id).unwrap();
        assert_eq!(shortcut.tags().iter().copied().collect::<Vec<_>>(), vec![work]);
        assert_eq!(shortcut.metadata().get("title"), Some(&Value::from("Ex")));
    }

    #[test]
    fn test_labels_name_the_shortcut() {
        let mut ctl = Controller::default();
        let id = ctl
            .create_shortcut(ShortcutDraft::new("url", "https://docs.rs").with_metadata("title", "Docs"))
            .unwrap()
            .id()
            .unwrap();
        assert_eq!(ctl.next_undo_label(), Some("Create Shortcut Docs"));

        ctl.delete_shortcut(id).unwrap();
        assert_eq!(
            ctl.undo_labels(),
            vec!["Delete Shortcut Docs", "Create Shortcut Docs"]
        );
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let mut ctl = Controller::default();
        let err = ctl
            .create_shortcut(ShortcutDraft::new("gopher", "gopher://x"))
            .unwrap_err();
        assert!(matches!(err, PbsError::UnknownShortcutType { .. }));
    }

    #[test]
    fn test_replace_tags_touches_only_the_difference() {
        let mut ctl = Controller::default();
        let a = tag(&mut ctl, "A");
        let b = tag(&mut ctl, "B");
        let c = tag(&mut ctl, "C");
        let id = ctl
            .create_shortcut(ShortcutDraft::new("shell", "ls").tagged(a).tagged(b))
            .unwrap()
            .id()
            .unwrap();

        ctl.update_shortcut(
            id,
            ShortcutUpdate {
                tags: Some(vec![b, c]),
                ..Default::default()
            },
        )
        .unwrap();

        let tags: Vec<TagId> = ctl.find_shortcut(id).unwrap().tags().iter().copied().collect();
        assert_eq!(tags, vec![b, c]);

        ctl.undo().unwrap();
        let tags: Vec<TagId> = ctl.find_shortcut(id).unwrap().tags().iter().copied().collect();
        assert_eq!(tags, vec![a, b]);
    }

    #[test]
    fn test_remove_last_tag_keeps_orphan() {
        let mut ctl = Controller::default();
        let work = tag(&mut ctl, "Work");
        let id = ctl
            .create_shortcut(ShortcutDraft::new("shell", "make").tagged(work))
            .unwrap()
            .id()
            .unwrap();

        ctl.remove_shortcut_from_tag(id, work).unwrap();
        assert!(ctl.find_shortcut(id).unwrap().is_orphan());
        assert!(ctl.remove_shortcut_from_tag(id, work).is_err());
    }

    #[test]
    fn test_delete_and_undo_restores_same_id() {
        let mut ctl = Controller::default();
        let work = tag(&mut ctl, "Work");
        let id = ctl
            .create_shortcut(ShortcutDraft::new("shell", "make").tagged(work))
            .unwrap()
            .id()
            .unwrap();

        ctl.delete_shortcut(id).unwrap();
        assert!(ctl.find_shortcut(id).is_none());
        ctl.undo().unwrap();
        assert!(ctl.find_shortcut(id).unwrap().has_tag(work));
    }

    #[test]
    fn test_update_validates_against_new_kind() {
        let mut ctl = Controller::default();
        let id = ctl
            .create_shortcut(ShortcutDraft::new("shell", "echo hi"))
            .unwrap()
            .id()
            .unwrap();
        let err = ctl
            .update_shortcut(
                id,
                ShortcutUpdate {
                    kind: Some(ShortcutKind::url()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, PbsError::InvalidOperation { .. }));
        assert_eq!(ctl.find_shortcut(id).unwrap().kind(), &ShortcutKind::shell());
    }
}

//! Atomic operations: the smallest reversible changes to the model
//!
//! Every variant records both the old and the new state it touches, so `apply`
//! and `revert` are exact inverses. Operations are the only callers of the store's
//! mutating primitives.

use serde::{Deserialize, Serialize};

use pbs_api::{
    Change, Icon, Metadata, ModelChanges, PbsError, Result, ShortcutId, ShortcutKind, TagId,
};

use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AtomicOperation {
    /// Insert a leaf tag under `parent` at `index`
    CreateTag {
        id: TagId,
        parent: TagId,
        index: usize,
        name: String,
        icon: Option<Icon>,
    },
    /// Remove a leaf tag that sits under `parent` at `index`
    RemoveTag {
        id: TagId,
        parent: TagId,
        index: usize,
        name: String,
        icon: Option<Icon>,
    },
    /// Reparent a tag. `to_index` is the position after detaching from `from_parent`.
    MoveTag {
        id: TagId,
        from_parent: TagId,
        from_index: usize,
        to_parent: TagId,
        to_index: usize,
    },
    RenameTag {
        id: TagId,
        from: String,
        to: String,
    },
    SetTagIcon {
        id: TagId,
        from: Option<Icon>,
        to: Option<Icon>,
    },
    /// Insert an untagged shortcut
    CreateShortcut {
        id: ShortcutId,
        kind: ShortcutKind,
        content: String,
        metadata: Metadata,
    },
    /// Remove an untagged shortcut
    RemoveShortcut {
        id: ShortcutId,
        kind: ShortcutKind,
        content: String,
        metadata: Metadata,
    },
    SetShortcutKind {
        id: ShortcutId,
        from: ShortcutKind,
        to: ShortcutKind,
    },
    SetShortcutContent {
        id: ShortcutId,
        from: String,
        to: String,
    },
    SetShortcutMetadata {
        id: ShortcutId,
        from: Metadata,
        to: Metadata,
    },
    AddMembership {
        shortcut: ShortcutId,
        tag: TagId,
    },
    RemoveMembership {
        shortcut: ShortcutId,
        tag: TagId,
    },
}

impl AtomicOperation {
    // ------------------------------------------------------------------
    // Constructors capturing the current state
    // ------------------------------------------------------------------

    /// Removal of a leaf tag, recording where it sits.
    pub fn remove_tag(store: &Store, id: TagId) -> Result<Self> {
        if id.is_root() {
            return Err(PbsError::RootTag { action: "deleted" });
        }
        let tag = store.require_tag(id)?;
        let parent = tag
            .parent()
            .ok_or_else(|| PbsError::dangling(format!("{} has no parent", id)))?;
        let index = store
            .require_tag(parent)?
            .child_index(id)
            .ok_or_else(|| PbsError::dangling(format!("{} missing from its parent", id)))?;
        Ok(AtomicOperation::RemoveTag {
            id,
            parent,
            index,
            name: tag.name().to_string(),
            icon: tag.icon().cloned(),
        })
    }

    /// Move of `id` under `to_parent`, appended after its existing children.
    pub fn move_tag(store: &Store, id: TagId, to_parent: TagId) -> Result<Self> {
        if id.is_root() {
            return Err(PbsError::RootTag { action: "moved" });
        }
        let tag = store.require_tag(id)?;
        let target = store.require_tag(to_parent)?;
        if id == to_parent || store.is_descendant_of(to_parent, id) {
            return Err(PbsError::CyclicMove {
                id,
                target_parent: to_parent,
            });
        }
        let from_parent = tag
            .parent()
            .ok_or_else(|| PbsError::dangling(format!("{} has no parent", id)))?;
        let from_index = store
            .require_tag(from_parent)?
            .child_index(id)
            .ok_or_else(|| PbsError::dangling(format!("{} missing from its parent", id)))?;
        let to_index = if from_parent == to_parent {
            target.children().len() - 1
        } else {
            target.children().len()
        };
        Ok(AtomicOperation::MoveTag {
            id,
            from_parent,
            from_index,
            to_parent,
            to_index,
        })
    }

    pub fn rename_tag(store: &Store, id: TagId, name: impl Into<String>) -> Result<Self> {
        Ok(AtomicOperation::RenameTag {
            id,
            from: store.require_tag(id)?.name().to_string(),
            to: name.into(),
        })
    }

    pub fn set_tag_icon(store: &Store, id: TagId, icon: Option<Icon>) -> Result<Self> {
        Ok(AtomicOperation::SetTagIcon {
            id,
            from: store.require_tag(id)?.icon().cloned(),
            to: icon,
        })
    }

    /// Removal of a shortcut whose tag memberships are already gone.
    pub fn remove_shortcut(store: &Store, id: ShortcutId) -> Result<Self> {
        let shortcut = store.require_shortcut(id)?;
        Ok(AtomicOperation::RemoveShortcut {
            id,
            kind: shortcut.kind().clone(),
            content: shortcut.content().to_string(),
            metadata: shortcut.metadata().clone(),
        })
    }

    pub fn set_shortcut_kind(store: &Store, id: ShortcutId, kind: ShortcutKind) -> Result<Self> {
        Ok(AtomicOperation::SetShortcutKind {
            id,
            from: store.require_shortcut(id)?.kind().clone(),
            to: kind,
        })
    }

    pub fn set_shortcut_content(
        store: &Store,
        id: ShortcutId,
        content: impl Into<String>,
    ) -> Result<Self> {
        Ok(AtomicOperation::SetShortcutContent {
            id,
            from: store.require_shortcut(id)?.content().to_string(),
            to: content.into(),
        })
    }

    pub fn set_shortcut_metadata(store: &Store, id: ShortcutId, metadata: Metadata) -> Result<Self> {
        Ok(AtomicOperation::SetShortcutMetadata {
            id,
            from: store.require_shortcut(id)?.metadata().clone(),
            to: metadata,
        })
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    /// Perform the change (do / redo).
    pub(crate) fn apply(&self, store: &mut Store) -> Result<()> {
        match self {
            AtomicOperation::CreateTag {
                id,
                parent,
                index,
                name,
                icon,
            } => store.insert_tag(*id, *parent, *index, name.clone(), icon.clone()),
            AtomicOperation::RemoveTag { id, .. } => store.remove_tag(*id),
            AtomicOperation::MoveTag {
                id,
                to_parent,
                to_index,
                ..
            } => store.move_tag(*id, *to_parent, *to_index),
            AtomicOperation::RenameTag { id, to, .. } => store.set_tag_name(*id, to.clone()),
            AtomicOperation::SetTagIcon { id, to, .. } => store.set_tag_icon(*id, to.clone()),
            AtomicOperation::CreateShortcut {
                id,
                kind,
                content,
                metadata,
            } => store.insert_shortcut(*id, kind.clone(), content.clone(), metadata.clone()),
            AtomicOperation::RemoveShortcut { id, .. } => store.remove_shortcut(*id),
            AtomicOperation::SetShortcutKind { id, to, .. } => {
                store.set_shortcut_kind(*id, to.clone())
            }
            AtomicOperation::SetShortcutContent { id, to, .. } => {
                store.set_shortcut_content(*id, to.clone())
            }
            AtomicOperation::SetShortcutMetadata { id, to, .. } => {
                store.set_shortcut_metadata(*id, to.clone())
            }
            AtomicOperation::AddMembership { shortcut, tag } => {
                store.add_membership(*shortcut, *tag)
            }
            AtomicOperation::RemoveMembership { shortcut, tag } => {
                store.remove_membership(*shortcut, *tag)
            }
        }
    }

    /// Undo the change.
    pub(crate) fn revert(&self, store: &mut Store) -> Result<()> {
        self.invert().apply(store)
    }

    /// The operation whose `apply` is this operation's `revert`.
    pub fn invert(&self) -> AtomicOperation {
        match self.clone() {
            AtomicOperation::CreateTag {
                id,
                parent,
                index,
                name,
                icon,
            } => AtomicOperation::RemoveTag {
                id,
                parent,
                index,
                name,
                icon,
            },
            AtomicOperation::RemoveTag {
                id,
                parent,
                index,
                name,
                icon,
            } => AtomicOperation::CreateTag {
                id,
                parent,
                index,
                name,
                icon,
            },
            AtomicOperation::MoveTag {
                id,
                from_parent,
                from_index,
                to_parent,
                to_index,
            } => AtomicOperation::MoveTag {
                id,
                from_parent: to_parent,
                from_index: to_index,
                to_parent: from_parent,
                to_index: from_index,
            },
            AtomicOperation::RenameTag { id, from, to } => AtomicOperation::RenameTag {
                id,
                from: to,
                to: from,
            },
            AtomicOperation::SetTagIcon { id, from, to } => AtomicOperation::SetTagIcon {
                id,
                from: to,
                to: from,
            },
            AtomicOperation::CreateShortcut {
                id,
                kind,
                content,
                metadata,
            } => AtomicOperation::RemoveShortcut {
                id,
                kind,
                content,
                metadata,
            },
            AtomicOperation::RemoveShortcut {
                id,
                kind,
                content,
                metadata,
            } => AtomicOperation::CreateShortcut {
                id,
                kind,
                content,
                metadata,
            },
            AtomicOperation::SetShortcutKind { id, from, to } => {
                AtomicOperation::SetShortcutKind {
                    id,
                    from: to,
                    to: from,
                }
            }
            AtomicOperation::SetShortcutContent { id, from, to } => {
                AtomicOperation::SetShortcutContent {
                    id,
                    from: to,
                    to: from,
                }
            }
            AtomicOperation::SetShortcutMetadata { id, from, to } => {
                AtomicOperation::SetShortcutMetadata {
                    id,
                    from: to,
                    to: from,
                }
            }
            AtomicOperation::AddMembership { shortcut, tag } => {
                AtomicOperation::RemoveMembership { shortcut, tag }
            }
            AtomicOperation::RemoveMembership { shortcut, tag } => {
                AtomicOperation::AddMembership { shortcut, tag }
            }
        }
    }

    /// Record the entities this operation touches, as seen after `apply`.
    pub fn record_changes(&self, changes: &mut ModelChanges) {
        match self {
            AtomicOperation::CreateTag { id, .. } => changes.record_tag(Change::Created { id: *id }),
            AtomicOperation::RemoveTag { id, .. } => changes.record_tag(Change::Deleted { id: *id }),
            AtomicOperation::MoveTag {
                id,
                from_parent,
                to_parent,
                ..
            } => {
                changes.record_tag(Change::Updated { id: *id });
                changes.record_tag(Change::Updated { id: *from_parent });
                changes.record_tag(Change::Updated { id: *to_parent });
            }
            AtomicOperation::RenameTag { id, .. } | AtomicOperation::SetTagIcon { id, .. } => {
                changes.record_tag(Change::Updated { id: *id })
            }
            AtomicOperation::CreateShortcut { id, .. } => {
                changes.record_shortcut(Change::Created { id: *id })
            }
            AtomicOperation::RemoveShortcut { id, .. } => {
                changes.record_shortcut(Change::Deleted { id: *id })
            }
            AtomicOperation::SetShortcutKind { id, .. }
            | AtomicOperation::SetShortcutContent { id, .. }
            | AtomicOperation::SetShortcutMetadata { id, .. } => {
                changes.record_shortcut(Change::Updated { id: *id })
            }
            AtomicOperation::AddMembership { shortcut, .. }
            | AtomicOperation::RemoveMembership { shortcut, .. } => {
                changes.record_shortcut(Change::Updated { id: *shortcut })
            }
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            AtomicOperation::CreateTag { .. } => "create_tag",
            AtomicOperation::RemoveTag { .. } => "remove_tag",
            AtomicOperation::MoveTag { .. } => "move_tag",
            AtomicOperation::RenameTag { .. } => "rename_tag",
            AtomicOperation::SetTagIcon { .. } => "set_tag_icon",
            AtomicOperation::CreateShortcut { .. } => "create_shortcut",
            AtomicOperation::RemoveShortcut { .. } => "remove_shortcut",
            AtomicOperation::SetShortcutKind { .. } => "set_shortcut_kind",
            AtomicOperation::SetShortcutContent { .. } => "set_shortcut_content",
            AtomicOperation::SetShortcutMetadata { .. } => "set_shortcut_metadata",
            AtomicOperation::AddMembership { .. } => "add_membership",
            AtomicOperation::RemoveMembership { .. } => "remove_membership",
        }
    }
}

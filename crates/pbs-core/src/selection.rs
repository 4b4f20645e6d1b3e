//! Transient selection of tags and shortcuts
//!
//! The primary sets hold what the caller chose. The secondary sets are derived from
//! the primary sets and the store (descendant tags, shortcuts filed in selected
//! subtrees) and are recomputed on every change; they cannot be edited directly.

use std::collections::{BTreeSet, HashMap, HashSet};

use pbs_api::{
    PbsError, PortableSelection, PortableShortcut, PortableTag, Result, ShortcutId, TagId,
};

use crate::store::Store;

/// A shortcut together with the tag it was chosen from (the root for orphans).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectedShortcut {
    pub shortcut: ShortcutId,
    pub context: TagId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    primary_tags: Vec<TagId>,
    secondary_tags: Vec<TagId>,
    primary_shortcuts: Vec<SelectedShortcut>,
    secondary_shortcuts: Vec<SelectedShortcut>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything in the store: every top-level tag and every orphan shortcut.
    pub fn all(store: &Store) -> Self {
        let mut selection = Self::new();
        selection.select_root(store);
        selection
    }

    /// Add `tag` to the primary set.
    ///
    /// Selecting the root selects everything. Selecting a tag already implied by
    /// another primary tag is a no-op; primary tags below `tag` are absorbed.
    pub fn select_tag(&mut self, store: &Store, tag: TagId) -> Result<()> {
        store.require_tag(tag)?;
        if tag.is_root() {
            self.select_root(store);
            return Ok(());
        }
        if self.primary_tags.contains(&tag) || self.secondary_tags.contains(&tag) {
            return Ok(());
        }
        self.primary_tags
            .retain(|primary| !store.is_descendant_of(*primary, tag));
        self.primary_tags.push(tag);
        self.recompute(store);
        Ok(())
    }

    /// Add `shortcut`, chosen from `context`, to the primary set.
    pub fn select_shortcut(&mut self, store: &Store, shortcut: ShortcutId, context: TagId) -> Result<()> {
        let record = store.require_shortcut(shortcut)?;
        store.require_tag(context)?;
        if !context.is_root() && !record.has_tag(context) {
            return Err(PbsError::invalid(format!(
                "{} is not filed under {}",
                shortcut, context
            )));
        }
        let selected = SelectedShortcut { shortcut, context };
        if self.primary_shortcuts.contains(&selected) || self.secondary_shortcuts.contains(&selected)
        {
            return Ok(());
        }
        self.primary_shortcuts.push(selected);
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn select_root(&mut self, store: &Store) {
        self.clear();
        self.primary_tags = store.children(TagId::ROOT).to_vec();
        self.primary_shortcuts = store
            .orphan_shortcuts()
            .map(|s| SelectedShortcut {
                shortcut: s.id(),
                context: TagId::ROOT,
            })
            .collect();
        self.recompute(store);
    }

    /// Drop primaries that no longer exist and rebuild the secondary sets from the
    /// current store.
    pub fn recompute(&mut self, store: &Store) {
        self.primary_tags.retain(|t| store.contains_tag(*t));
        let primaries = self.primary_tags.clone();
        self.primary_tags
            .retain(|t| !primaries.iter().any(|other| store.is_descendant_of(*t, *other)));
        self.primary_shortcuts.retain(|s| {
            store.shortcut(s.shortcut).is_some_and(|record| {
                s.context.is_root() || (store.contains_tag(s.context) && record.has_tag(s.context))
            })
        });

        let mut secondary_tags = Vec::new();
        let mut secondary_shortcuts = Vec::new();
        let mut seen_pairs = HashSet::new();
        for tag in &self.primary_tags {
            let subtree = store.collect_subtree(*tag);
            secondary_tags.extend(subtree.tags);
            for (shortcut, context) in subtree.shortcuts {
                let selected = SelectedShortcut { shortcut, context };
                if seen_pairs.insert(selected) {
                    secondary_shortcuts.push(selected);
                }
            }
        }

        self.primary_shortcuts.retain(|s| !seen_pairs.contains(s));
        self.secondary_tags = secondary_tags;
        self.secondary_shortcuts = secondary_shortcuts;
    }

    pub fn primary_tags(&self) -> &[TagId] {
        &self.primary_tags
    }

    pub fn secondary_tags(&self) -> &[TagId] {
        &self.secondary_tags
    }

    pub fn primary_shortcuts(&self) -> &[SelectedShortcut] {
        &self.primary_shortcuts
    }

    pub fn secondary_shortcuts(&self) -> &[SelectedShortcut] {
        &self.secondary_shortcuts
    }

    pub fn is_empty(&self) -> bool {
        self.primary_tags.is_empty() && self.primary_shortcuts.is_empty()
    }

    pub fn is_single_tag(&self) -> bool {
        self.primary_tags.len() == 1 && self.primary_shortcuts.is_empty()
    }

    pub fn is_single_shortcut(&self) -> bool {
        self.primary_tags.is_empty() && self.primary_shortcuts.len() == 1
    }

    /// Whether `tag` is selected directly or implied by a selected ancestor
    pub fn contains_tag(&self, tag: TagId) -> bool {
        self.primary_tags.contains(&tag) || self.secondary_tags.contains(&tag)
    }

    pub fn contains_shortcut(&self, shortcut: ShortcutId) -> bool {
        self.primary_shortcuts
            .iter()
            .chain(&self.secondary_shortcuts)
            .any(|s| s.shortcut == shortcut)
    }

    /// Distinct shortcuts of both sets, in selection order
    pub fn shortcut_ids(&self) -> Vec<ShortcutId> {
        let mut seen = HashSet::new();
        self.primary_shortcuts
            .iter()
            .chain(&self.secondary_shortcuts)
            .map(|s| s.shortcut)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Fixed classification of the primary sets, used in command labels.
    pub fn describe(&self, store: &Store) -> String {
        match (self.primary_tags.len(), self.primary_shortcuts.len()) {
            (0, 0) => "Empty".to_string(),
            (1, 0) => match store.tag(self.primary_tags[0]) {
                Some(tag) => format!("Tag {}", tag.name()),
                None => "Tag".to_string(),
            },
            (_, 0) => "Multiple Tags".to_string(),
            (0, 1) => match store.shortcut(self.primary_shortcuts[0].shortcut) {
                Some(shortcut) => format!("Shortcut {}", shortcut.display_name()),
                None => "Shortcut".to_string(),
            },
            (0, _) => "Multiple Shortcuts".to_string(),
            _ => "Multiple".to_string(),
        }
    }

    /// Encode the selection without arena ids.
    ///
    /// Selected tag subtrees are listed in pre-order (parents first). Every selected
    /// shortcut is listed once, keeping only its memberships inside the copied tags.
    pub fn to_portable(&self, store: &Store) -> Result<PortableSelection> {
        let mut keys: HashMap<TagId, u32> = HashMap::new();
        let mut tags = Vec::new();

        for primary in &self.primary_tags {
            for id in store.subtree_tags(*primary) {
                let tag = store.require_tag(id)?;
                let parent = if id == *primary {
                    None
                } else {
                    tag.parent().and_then(|p| keys.get(&p).copied())
                };
                let key = tags.len() as u32;
                keys.insert(id, key);
                tags.push(PortableTag {
                    key,
                    parent,
                    name: tag.name().to_string(),
                    icon: tag.icon().cloned(),
                });
            }
        }

        let direct: BTreeSet<ShortcutId> = self.primary_shortcuts.iter().map(|s| s.shortcut).collect();
        let mut shortcuts = Vec::new();
        for id in self.shortcut_ids() {
            let shortcut = store.require_shortcut(id)?;
            let tag_keys = shortcut
                .tags()
                .iter()
                .filter_map(|t| keys.get(t).copied())
                .collect();
            shortcuts.push(PortableShortcut {
                kind: shortcut.kind().clone(),
                content: shortcut.content().to_string(),
                metadata: shortcut.metadata().clone(),
                tags: tag_keys,
                at_target: direct.contains(&id),
            });
        }

        Ok(PortableSelection {
            tags,
            shortcuts,
            ..Default::default()
        })
    }
}

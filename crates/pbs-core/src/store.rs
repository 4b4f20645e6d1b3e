//! Arena holding the tag tree and the shortcut collection
//!
//! Everything is addressed by id. The public surface is read-only; the mutating
//! primitives are `pub(crate)` and reached only through
//! [`AtomicOperation`](crate::operation::AtomicOperation), so every change to the
//! model is recorded in a transaction.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use pbs_api::{Icon, Metadata, PbsError, Result, ShortcutId, ShortcutKind, TagId};

use crate::shortcut::Shortcut;
use crate::tag::Tag;

/// Descendants of a tag and the shortcuts filed anywhere in its subtree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subtree {
    /// Descendant tags in pre-order, excluding the starting tag
    pub tags: Vec<TagId>,
    /// Every (shortcut, owning tag) pair within the subtree, starting tag included
    pub shortcuts: Vec<(ShortcutId, TagId)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSnapshot {
    pub id: TagId,
    pub name: String,
    pub icon: Option<Icon>,
    pub parent: Option<TagId>,
    pub children: Vec<TagId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcutSnapshot {
    pub id: ShortcutId,
    pub kind: ShortcutKind,
    pub content: String,
    pub metadata: Metadata,
    pub tags: Vec<TagId>,
}

/// Structural image of the store, ordered by id. Id counters are not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub tags: Vec<TagSnapshot>,
    pub shortcuts: Vec<ShortcutSnapshot>,
}

#[derive(Debug, Clone)]
pub struct Store {
    tags: BTreeMap<TagId, Tag>,
    shortcuts: BTreeMap<ShortcutId, Shortcut>,
    /// Reverse membership index: tag -> shortcuts filed under it
    shortcuts_by_tag: HashMap<TagId, BTreeSet<ShortcutId>>,
    next_tag_id: u64,
    next_shortcut_id: u64,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create a store holding only the root tag.
    pub fn new() -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(TagId::ROOT, Tag::new(TagId::ROOT, String::new(), None, None));
        Self {
            tags,
            shortcuts: BTreeMap::new(),
            shortcuts_by_tag: HashMap::new(),
            next_tag_id: 1,
            next_shortcut_id: 1,
        }
    }

    /// Reserve a fresh tag id. Ids are never handed out twice.
    pub fn allocate_tag_id(&mut self) -> TagId {
        let id = TagId(self.next_tag_id);
        self.next_tag_id += 1;
        id
    }

    /// Reserve a fresh shortcut id.
    pub fn allocate_shortcut_id(&mut self) -> ShortcutId {
        let id = ShortcutId(self.next_shortcut_id);
        self.next_shortcut_id += 1;
        id
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn root(&self) -> &Tag {
        &self.tags[&TagId::ROOT]
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tags.get(&id)
    }

    pub fn shortcut(&self, id: ShortcutId) -> Option<&Shortcut> {
        self.shortcuts.get(&id)
    }

    pub fn require_tag(&self, id: TagId) -> Result<&Tag> {
        self.tags.get(&id).ok_or(PbsError::TagNotFound { id })
    }

    pub fn require_shortcut(&self, id: ShortcutId) -> Result<&Shortcut> {
        self.shortcuts
            .get(&id)
            .ok_or(PbsError::ShortcutNotFound { id })
    }

    pub fn contains_tag(&self, id: TagId) -> bool {
        self.tags.contains_key(&id)
    }

    pub fn contains_shortcut(&self, id: ShortcutId) -> bool {
        self.shortcuts.contains_key(&id)
    }

    /// All tags, root included, ordered by id
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    pub fn shortcuts(&self) -> impl Iterator<Item = &Shortcut> {
        self.shortcuts.values()
    }

    /// Number of tags, root included
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn shortcut_count(&self) -> usize {
        self.shortcuts.len()
    }

    pub fn children(&self, id: TagId) -> &[TagId] {
        self.tags.get(&id).map(|t| t.children()).unwrap_or(&[])
    }

    /// Shortcuts filed directly under `tag`
    pub fn shortcuts_in(&self, tag: TagId) -> impl Iterator<Item = ShortcutId> + '_ {
        self.shortcuts_by_tag
            .get(&tag)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Shortcuts without any tag, in id order
    pub fn orphan_shortcuts(&self) -> impl Iterator<Item = &Shortcut> {
        self.shortcuts.values().filter(|s| s.is_orphan())
    }

    /// Whether `tag` lies strictly below `ancestor`. Walks the parent chain.
    pub fn is_descendant_of(&self, tag: TagId, ancestor: TagId) -> bool {
        let mut current = self.tags.get(&tag).and_then(|t| t.parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.tags.get(&id).and_then(|t| t.parent);
        }
        false
    }

    /// Names from the first level below the root down to `tag`.
    pub fn path(&self, tag: TagId) -> Vec<String> {
        let mut names = Vec::new();
        let mut current = self.tags.get(&tag);
        while let Some(t) = current {
            if t.is_root() {
                break;
            }
            names.push(t.name.clone());
            current = t.parent.and_then(|p| self.tags.get(&p));
        }
        names.reverse();
        names
    }

    /// Pre-order listing of `tag` and all its descendants.
    pub fn subtree_tags(&self, tag: TagId) -> Vec<TagId> {
        let mut out = Vec::new();
        let mut stack = vec![tag];
        while let Some(id) = stack.pop() {
            if let Some(t) = self.tags.get(&id) {
                out.push(id);
                stack.extend(t.children.iter().rev().copied());
            }
        }
        out
    }

    /// Gather the descendants of `tag` and every shortcut filed in its subtree,
    /// each paired with the tag it was found under.
    pub fn collect_subtree(&self, tag: TagId) -> Subtree {
        let all = self.subtree_tags(tag);
        let shortcuts = all
            .iter()
            .flat_map(|t| self.shortcuts_in(*t).map(move |s| (s, *t)))
            .collect();
        Subtree {
            tags: all.into_iter().skip(1).collect(),
            shortcuts,
        }
    }

    /// Sibling under `parent` matching `name` and, when `icon` is given, that icon.
    pub fn find_child(&self, parent: TagId, name: &str, icon: Option<Option<&Icon>>) -> Option<TagId> {
        self.children(parent).iter().copied().find(|child| {
            self.tags.get(child).is_some_and(|t| {
                t.name == name && icon.map_or(true, |icon| t.icon.as_ref() == icon)
            })
        })
    }

    /// Tags whose name equals `name`, anywhere in the tree
    pub fn find_tags_by_name(&self, name: &str) -> Vec<TagId> {
        self.tags
            .values()
            .filter(|t| !t.is_root() && t.name == name)
            .map(|t| t.id)
            .collect()
    }

    pub fn find_by_identity(&self, identity: &str) -> Option<ShortcutId> {
        self.shortcuts
            .values()
            .find(|s| s.identity() == identity)
            .map(|s| s.id)
    }

    pub fn find_by_content(&self, content: &str) -> Option<ShortcutId> {
        self.shortcuts
            .values()
            .find(|s| s.content == content)
            .map(|s| s.id)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            tags: self
                .tags
                .values()
                .map(|t| TagSnapshot {
                    id: t.id,
                    name: t.name.clone(),
                    icon: t.icon.clone(),
                    parent: t.parent,
                    children: t.children.clone(),
                })
                .collect(),
            shortcuts: self
                .shortcuts
                .values()
                .map(|s| ShortcutSnapshot {
                    id: s.id,
                    kind: s.kind.clone(),
                    content: s.content.clone(),
                    metadata: s.metadata.clone(),
                    tags: s.tags.iter().copied().collect(),
                })
                .collect(),
        }
    }

    /// Verify the structural invariants of the model: mutual parent/children
    /// consistency, reachability of every tag from the root, and no shortcut
    /// referring to a missing tag.
    pub fn check_integrity(&self) -> Result<()> {
        let fail = |message: String| Err(PbsError::Integrity { message });

        if self.root().parent.is_some() {
            return fail("root tag has a parent".to_string());
        }

        for tag in self.tags.values() {
            if tag.is_root() {
                continue;
            }
            let Some(parent_id) = tag.parent else {
                return fail(format!("{} has no parent", tag.id));
            };
            let Some(parent) = self.tags.get(&parent_id) else {
                return fail(format!("{} has missing parent {}", tag.id, parent_id));
            };
            if parent.children.iter().filter(|c| **c == tag.id).count() != 1 {
                return fail(format!("{} is not listed once by its parent", tag.id));
            }
            for child in &tag.children {
                if self.tags.get(child).and_then(|c| c.parent) != Some(tag.id) {
                    return fail(format!("{} lists {} which points elsewhere", tag.id, child));
                }
            }
        }

        let reachable: HashSet<TagId> = self.subtree_tags(TagId::ROOT).into_iter().collect();
        if reachable.len() != self.tags.len() {
            return fail("some tags are not reachable from the root".to_string());
        }

        for shortcut in self.shortcuts.values() {
            for tag in &shortcut.tags {
                if tag.is_root() || !reachable.contains(tag) {
                    return fail(format!("{} refers to dangling {}", shortcut.id, tag));
                }
                let indexed = self
                    .shortcuts_by_tag
                    .get(tag)
                    .is_some_and(|set| set.contains(&shortcut.id));
                if !indexed {
                    return fail(format!("{} missing from index of {}", shortcut.id, tag));
                }
            }
        }

        for (tag, set) in &self.shortcuts_by_tag {
            for id in set {
                if !self.shortcuts.get(id).is_some_and(|s| s.tags.contains(tag)) {
                    return fail(format!("index of {} lists stale {}", tag, id));
                }
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutating primitives, reserved for atomic operations
    // ------------------------------------------------------------------

    fn tag_mut(&mut self, id: TagId) -> Result<&mut Tag> {
        self.tags
            .get_mut(&id)
            .ok_or_else(|| PbsError::dangling(format!("{} does not exist", id)))
    }

    fn shortcut_mut(&mut self, id: ShortcutId) -> Result<&mut Shortcut> {
        self.shortcuts
            .get_mut(&id)
            .ok_or_else(|| PbsError::dangling(format!("{} does not exist", id)))
    }

    /// Insert a new leaf tag under `parent` at `index` (clamped to the child count).
    pub(crate) fn insert_tag(
        &mut self,
        id: TagId,
        parent: TagId,
        index: usize,
        name: String,
        icon: Option<Icon>,
    ) -> Result<()> {
        if self.tags.contains_key(&id) {
            return Err(PbsError::dangling(format!("{} already exists", id)));
        }
        let parent_tag = self.tag_mut(parent)?;
        let index = index.min(parent_tag.children.len());
        parent_tag.children.insert(index, id);
        self.tags.insert(id, Tag::new(id, name, icon, Some(parent)));
        Ok(())
    }

    /// Remove a leaf tag nothing is filed under.
    pub(crate) fn remove_tag(&mut self, id: TagId) -> Result<()> {
        if id.is_root() {
            return Err(PbsError::dangling("attempt to remove the root tag"));
        }
        let tag = self
            .tags
            .get(&id)
            .ok_or_else(|| PbsError::dangling(format!("{} does not exist", id)))?;
        if !tag.is_leaf() {
            return Err(PbsError::dangling(format!("{} still has children", id)));
        }
        if self.shortcuts_by_tag.get(&id).is_some_and(|s| !s.is_empty()) {
            return Err(PbsError::dangling(format!("{} still has shortcuts", id)));
        }
        let parent = tag.parent;
        if let Some(parent) = parent {
            self.tag_mut(parent)?.children.retain(|c| *c != id);
        }
        self.tags.remove(&id);
        self.shortcuts_by_tag.remove(&id);
        Ok(())
    }

    /// Detach `id` from its parent and attach it under `new_parent` at `index`.
    pub(crate) fn move_tag(&mut self, id: TagId, new_parent: TagId, index: usize) -> Result<()> {
        if id == new_parent || self.is_descendant_of(new_parent, id) {
            return Err(PbsError::dangling(format!(
                "moving {} under {} would create a cycle",
                id, new_parent
            )));
        }
        if !self.tags.contains_key(&new_parent) {
            return Err(PbsError::dangling(format!("{} does not exist", new_parent)));
        }
        let old_parent = self
            .tag_mut(id)?
            .parent
            .ok_or_else(|| PbsError::dangling("attempt to move the root tag"))?;
        self.tag_mut(old_parent)?.children.retain(|c| *c != id);
        let parent_tag = self.tag_mut(new_parent)?;
        let index = index.min(parent_tag.children.len());
        parent_tag.children.insert(index, id);
        self.tag_mut(id)?.parent = Some(new_parent);
        Ok(())
    }

    pub(crate) fn set_tag_name(&mut self, id: TagId, name: String) -> Result<()> {
        self.tag_mut(id)?.name = name;
        Ok(())
    }

    pub(crate) fn set_tag_icon(&mut self, id: TagId, icon: Option<Icon>) -> Result<()> {
        self.tag_mut(id)?.icon = icon;
        Ok(())
    }

    /// Insert a new shortcut with no tags.
    pub(crate) fn insert_shortcut(
        &mut self,
        id: ShortcutId,
        kind: ShortcutKind,
        content: String,
        metadata: Metadata,
    ) -> Result<()> {
        if self.shortcuts.contains_key(&id) {
            return Err(PbsError::dangling(format!("{} already exists", id)));
        }
        self.shortcuts
            .insert(id, Shortcut::new(id, kind, content, metadata));
        Ok(())
    }

    /// Remove a shortcut that no longer belongs to any tag.
    pub(crate) fn remove_shortcut(&mut self, id: ShortcutId) -> Result<()> {
        let shortcut = self
            .shortcuts
            .get(&id)
            .ok_or_else(|| PbsError::dangling(format!("{} does not exist", id)))?;
        if !shortcut.is_orphan() {
            return Err(PbsError::dangling(format!("{} still has tags", id)));
        }
        self.shortcuts.remove(&id);
        Ok(())
    }

    pub(crate) fn set_shortcut_kind(&mut self, id: ShortcutId, kind: ShortcutKind) -> Result<()> {
        self.shortcut_mut(id)?.kind = kind;
        Ok(())
    }

    pub(crate) fn set_shortcut_content(&mut self, id: ShortcutId, content: String) -> Result<()> {
        self.shortcut_mut(id)?.content = content;
        Ok(())
    }

    pub(crate) fn set_shortcut_metadata(&mut self, id: ShortcutId, metadata: Metadata) -> Result<()> {
        self.shortcut_mut(id)?.metadata = metadata;
        Ok(())
    }

    pub(crate) fn add_membership(&mut self, shortcut: ShortcutId, tag: TagId) -> Result<()> {
        if tag.is_root() || !self.tags.contains_key(&tag) {
            return Err(PbsError::dangling(format!("cannot file under {}", tag)));
        }
        if !self.shortcut_mut(shortcut)?.tags.insert(tag) {
            return Err(PbsError::dangling(format!("{} already in {}", shortcut, tag)));
        }
        self.shortcuts_by_tag.entry(tag).or_default().insert(shortcut);
        Ok(())
    }

    pub(crate) fn remove_membership(&mut self, shortcut: ShortcutId, tag: TagId) -> Result<()> {
        if !self.shortcut_mut(shortcut)?.tags.remove(&tag) {
            return Err(PbsError::dangling(format!("{} not in {}", shortcut, tag)));
        }
        if let Some(set) = self.shortcuts_by_tag.get_mut(&tag) {
            set.remove(&shortcut);
            if set.is_empty() {
                self.shortcuts_by_tag.remove(&tag);
            }
        }
        Ok(())
    }
}

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use pbs_api::{PortableSelection, Result, TagId};
use pbs_core::{shortcut_identity, Selection};
use tracing::info;

use super::{Controller, ShortcutDraft};
use crate::conflict::Outcome;

/// What a paste or an import did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteReport {
    pub created_tags: usize,
    pub merged_tags: usize,
    pub skipped_tags: usize,
    pub created_shortcuts: usize,
    pub merged_shortcuts: usize,
    pub skipped_shortcuts: usize,
    /// The paste moved a local selection instead of copying
    pub moved: bool,
}

impl PasteReport {
    fn count_tag(&mut self, outcome: Outcome<TagId>) {
        match outcome {
            Outcome::Created(_) => self.created_tags += 1,
            Outcome::Merged(_) => self.merged_tags += 1,
            Outcome::Skipped => self.skipped_tags += 1,
        }
    }

    fn count_shortcut<Id>(&mut self, outcome: Outcome<Id>) {
        match outcome {
            Outcome::Created(_) => self.created_shortcuts += 1,
            Outcome::Merged(_) => self.merged_shortcuts += 1,
            Outcome::Skipped => self.skipped_shortcuts += 1,
        }
    }
}

/// How pasted data meets the existing model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PasteMode {
    /// Tags and shortcuts go through the conflict policies
    Merge,
    /// A saved document: every tag and shortcut is rebuilt as written
    Restore,
}

impl Controller {
    /// Portable encoding of `selection`
    pub fn to_portable(&self, selection: &Selection) -> Result<PortableSelection> {
        selection.to_portable(&self.store)
    }

    /// Paste `portable` under `target`.
    ///
    /// When `local` is the selection the data was cut from in this process, the
    /// paste moves it instead. Otherwise tags are created through the tag conflict
    /// policy (a skipped tag skips its subtree) and shortcuts identical to an
    /// existing one are merged into it.
    pub fn create_from_portable(
        &mut self,
        portable: &PortableSelection,
        target: TagId,
        local: Option<&Selection>,
    ) -> Result<PasteReport> {
        portable.validate()?;
        self.undoable_operation("Paste", |ctl| match local {
            Some(selection) if !selection.is_empty() => {
                ctl.move_selection_in_txn(selection, target)?;
                Ok(PasteReport {
                    moved: true,
                    ..Default::default()
                })
            }
            _ => ctl.paste_in_txn(portable, target, PasteMode::Merge),
        })
    }

    fn paste_in_txn(
        &mut self,
        portable: &PortableSelection,
        target: TagId,
        mode: PasteMode,
    ) -> Result<PasteReport> {
        self.store.require_tag(target)?;
        let mut report = PasteReport::default();

        // Portable key -> created or merged tag; `None` when skipped
        let mut tags: HashMap<u32, Option<TagId>> = HashMap::new();
        for tag in &portable.tags {
            let parent = match tag.parent {
                None => Some(target),
                Some(key) => tags.get(&key).copied().flatten(),
            };
            let Some(parent) = parent else {
                tags.insert(tag.key, None);
                report.skipped_tags += 1;
                continue;
            };
            let outcome = match mode {
                PasteMode::Merge => self.create_tag_in_txn(parent, &tag.name, tag.icon.clone())?,
                PasteMode::Restore => {
                    Outcome::Created(self.append_tag(parent, &tag.name, tag.icon.clone())?)
                }
            };
            report.count_tag(outcome);
            tags.insert(tag.key, outcome.id());
        }

        for shortcut in &portable.shortcuts {
            let mut resolved: BTreeSet<TagId> = shortcut
                .tags
                .iter()
                .filter_map(|key| tags.get(key).copied().flatten())
                .collect();
            if shortcut.at_target && !target.is_root() {
                resolved.insert(target);
            }
            if resolved.is_empty() && !shortcut.tags.is_empty() && !shortcut.at_target {
                // Every tag it was copied with was skipped
                report.skipped_shortcuts += 1;
                continue;
            }

            let draft = ShortcutDraft {
                kind: shortcut.kind.clone(),
                content: shortcut.content.clone(),
                metadata: shortcut.metadata.clone(),
                tags: resolved.iter().copied().collect(),
            };
            if mode == PasteMode::Restore {
                self.restore_shortcut(draft)?;
                report.created_shortcuts += 1;
                continue;
            }

            let identity = shortcut_identity(&shortcut.content, &shortcut.metadata);
            if let Some(existing) = self.store.find_by_identity(&identity) {
                self.add_tags(existing, &resolved)?;
                report.merged_shortcuts += 1;
                continue;
            }

            let outcome = self.create_shortcut_in_txn(draft)?;
            report.count_shortcut(outcome);
        }

        info!(
            "Pasted under {}: {} tags, {} shortcuts created",
            target, report.created_tags, report.created_shortcuts
        );
        Ok(report)
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// The whole model as a portable selection of the root
    pub fn export_document(&self) -> Result<PortableSelection> {
        Selection::all(&self.store).to_portable(&self.store)
    }

    /// Rebuild an exported model under the root as one undoable step.
    ///
    /// The document is restored as written: sibling tags sharing a name and
    /// identical shortcuts stay separate, whatever the conflict policy says.
    pub fn import_document(&mut self, document: &PortableSelection) -> Result<PasteReport> {
        document.validate()?;
        self.undoable_operation("Import", |ctl| {
            ctl.paste_in_txn(document, TagId::ROOT, PasteMode::Restore)
        })
    }

    /// Write the model as JSON and make `path` the current document
    pub fn save_document(&mut self, path: &Path) -> anyhow::Result<()> {
        let json = self.export_document()?.to_json()?;
        fs::write(path, json)
            .map_err(|e| anyhow::anyhow!("Failed to write document {}: {}", path.display(), e))?;
        self.context.set_current_file(path);
        info!("Saved {}", path.display());
        Ok(())
    }

    /// Import a JSON document and make `path` the current document
    pub fn load_document(&mut self, path: &Path) -> anyhow::Result<PasteReport> {
        let json = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read document {}: {}", path.display(), e))?;
        let document = PortableSelection::from_json(&json)
            .map_err(|e| anyhow::anyhow!("Invalid document {}: {}", path.display(), e))?;
        let report = self.import_document(&document)?;
        self.context.set_current_file(path);
        info!("Loaded {}", path.display());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::TagUpdate;
    use pbs_api::{PortableShortcut, PortableTag, ShortcutKind};

    fn portable_tree() -> PortableSelection {
        PortableSelection {
            tags: vec![
                PortableTag {
                    key: 0,
                    parent: None,
                    name: "Work".into(),
                    icon: None,
                },
                PortableTag {
                    key: 1,
                    parent: Some(0),
                    name: "Rust".into(),
                    icon: None,
                },
            ],
            shortcuts: vec![PortableShortcut {
                kind: ShortcutKind::url(),
                content: "https://crates.io".into(),
                metadata: Default::default(),
                tags: vec![1],
                at_target: false,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_paste_builds_subtree_under_target() {
        let mut ctl = Controller::default();
        let report = ctl
            .create_from_portable(&portable_tree(), TagId::ROOT, None)
            .unwrap();
        assert_eq!(report.created_tags, 2);
        assert_eq!(report.created_shortcuts, 1);

        let rust = ctl.find_tags_by_name("Rust")[0];
        assert_eq!(ctl.store().path(rust), vec!["Work", "Rust"]);
        assert_eq!(ctl.store().shortcuts_in(rust).count(), 1);
        assert_eq!(ctl.undo_labels(), vec!["Paste"]);
    }

    #[test]
    fn test_second_paste_merges() {
        let mut ctl = Controller::default();
        ctl.create_from_portable(&portable_tree(), TagId::ROOT, None)
            .unwrap();
        let report = ctl
            .create_from_portable(&portable_tree(), TagId::ROOT, None)
            .unwrap();

        assert_eq!(report.merged_tags, 2);
        assert_eq!(report.merged_shortcuts, 1);
        assert_eq!(ctl.store().tag_count(), 3);
        assert_eq!(ctl.store().shortcut_count(), 1);
        // Nothing changed, so nothing was pushed
        assert_eq!(ctl.undo_labels(), vec!["Paste"]);
    }

    #[test]
    fn test_save_and_load_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        let mut source = Controller::default();
        source
            .create_from_portable(&portable_tree(), TagId::ROOT, None)
            .unwrap();
        source.save_document(&path).unwrap();

        let mut target = Controller::default();
        target.load_document(&path).unwrap();
        assert_eq!(target.export_document().unwrap(), source.export_document().unwrap());
        assert_eq!(target.context().current_file.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_load_keeps_siblings_sharing_a_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        let mut source = Controller::default();
        let a = source.create_tag(TagId::ROOT, "A", None).unwrap().id().unwrap();
        let b = source.create_tag(TagId::ROOT, "B", None).unwrap().id().unwrap();
        source
            .create_shortcut(ShortcutDraft::new("shell", "ls").tagged(a))
            .unwrap();
        source
            .create_shortcut(ShortcutDraft::new("shell", "top").tagged(b))
            .unwrap();
        source.update_tag(b, TagUpdate::rename("A")).unwrap();
        source.save_document(&path).unwrap();

        let mut target = Controller::default();
        let report = target.load_document(&path).unwrap();
        assert_eq!(report.created_tags, 2);
        assert_eq!(report.merged_tags, 0);
        assert_eq!(target.store().tag_count(), source.store().tag_count());

        let siblings = target.store().children(TagId::ROOT).to_vec();
        assert_eq!(siblings.len(), 2);
        for tag in siblings {
            assert_eq!(target.store().shortcuts_in(tag).count(), 1);
        }
        assert_eq!(target.export_document().unwrap(), source.export_document().unwrap());
    }
}

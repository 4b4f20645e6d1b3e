use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

use pbs_api::{Metadata, ShortcutId, ShortcutKind, TagId, METADATA_ICON, METADATA_TITLE};

/// Deterministic identity of a shortcut payload.
///
/// Lowercase hex SHA-256 over the canonical JSON encoding of `(content, metadata)`.
/// Kind and tag membership do not take part, so two shortcuts with the same content
/// and metadata are duplicates wherever they are filed.
pub fn shortcut_identity(content: &str, metadata: &Metadata) -> String {
    let encoded = serde_json::to_vec(&(content, metadata)).unwrap_or_default();
    format!("{:x}", Sha256::digest(&encoded))
}

/// A typed item of content (URL, shell command, ...) filed under zero or more tags.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortcut {
    pub(crate) id: ShortcutId,
    pub(crate) kind: ShortcutKind,
    pub(crate) content: String,
    pub(crate) metadata: Metadata,
    pub(crate) tags: BTreeSet<TagId>,
}

impl Shortcut {
    pub(crate) fn new(id: ShortcutId, kind: ShortcutKind, content: String, metadata: Metadata) -> Self {
        Self {
            id,
            kind,
            content,
            metadata,
            tags: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> ShortcutId {
        self.id
    }

    pub fn kind(&self) -> &ShortcutKind {
        &self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn tags(&self) -> &BTreeSet<TagId> {
        &self.tags
    }

    pub fn has_tag(&self, tag: TagId) -> bool {
        self.tags.contains(&tag)
    }

    /// Orphans are shown under the root tag.
    pub fn is_orphan(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.get(METADATA_TITLE).and_then(|v| v.as_string())
    }

    pub fn icon(&self) -> Option<&str> {
        self.metadata.get(METADATA_ICON).and_then(|v| v.as_string())
    }

    /// Title if present, otherwise the raw content.
    pub fn display_name(&self) -> &str {
        self.title().unwrap_or(&self.content)
    }

    /// Recomputed on every call; content and metadata may have changed since the last one.
    pub fn identity(&self) -> String {
        shortcut_identity(&self.content, &self.metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(title: &str) -> Metadata {
        let mut m = Metadata::new();
        m.insert(METADATA_TITLE.to_string(), title.into());
        m
    }

    #[test]
    fn test_identity_ignores_tags_and_kind() {
        let mut a = Shortcut::new(
            ShortcutId(1),
            ShortcutKind::url(),
            "http://example.com".into(),
            metadata("Ex"),
        );
        let b = Shortcut::new(
            ShortcutId(2),
            ShortcutKind::shell(),
            "http://example.com".into(),
            metadata("Ex"),
        );
        let before = a.identity();
        a.tags.insert(TagId(5));
        assert_eq!(a.identity(), before);
        assert_eq!(a.identity(), b.identity());
        assert_eq!(before.len(), 64);
    }

    #[test]
    fn test_identity_tracks_content_and_metadata() {
        let mut s = Shortcut::new(
            ShortcutId(1),
            ShortcutKind::url(),
            "http://example.com".into(),
            metadata("Ex"),
        );
        let original = s.identity();

        s.content = "http://example.org".into();
        let after_content = s.identity();
        assert_ne!(after_content, original);

        s.metadata = metadata("Other");
        assert_ne!(s.identity(), after_content);
    }

    #[test]
    fn test_display_name_falls_back_to_content() {
        let s = Shortcut::new(
            ShortcutId(1),
            ShortcutKind::shell(),
            "ls -la".into(),
            Metadata::new(),
        );
        assert_eq!(s.display_name(), "ls -la");
        assert!(s.is_orphan());
    }
}

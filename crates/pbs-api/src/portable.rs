//! Portable selection format
//!
//! A portable selection carries tags and shortcuts without any object or arena
//! references: tags are numbered with local structural keys and shortcuts refer to
//! those keys. It is what crosses the clipboard, drag-and-drop and file boundaries.
//!
//! Tags are listed parent-before-child. A tag without `parent` is a top of the
//! copied forest and is attached to the paste target.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{PbsError, Result};
use crate::ids::{Icon, ShortcutKind};
use crate::value::Metadata;

pub const PORTABLE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableTag {
    /// Structural key, unique within the selection
    pub key: u32,
    /// Key of the parent tag, `None` for tops of the copied forest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableShortcut {
    pub kind: ShortcutKind,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Keys of copied tags this shortcut belongs to
    #[serde(default)]
    pub tags: Vec<u32>,
    /// The shortcut was chosen directly and attaches to the paste target
    #[serde(default)]
    pub at_target: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortableSelection {
    pub version: u32,
    #[serde(default)]
    pub tags: Vec<PortableTag>,
    #[serde(default)]
    pub shortcuts: Vec<PortableShortcut>,
}

impl Default for PortableSelection {
    fn default() -> Self {
        Self {
            version: PORTABLE_FORMAT_VERSION,
            tags: Vec::new(),
            shortcuts: Vec::new(),
        }
    }
}

impl PortableSelection {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.shortcuts.is_empty()
    }

    /// Check structural soundness: unique keys, parents listed before children,
    /// shortcut tag keys resolvable.
    pub fn validate(&self) -> Result<()> {
        if self.version != PORTABLE_FORMAT_VERSION {
            return Err(PbsError::InvalidPortable {
                message: format!("unsupported format version {}", self.version),
            });
        }

        let mut seen: HashSet<u32> = HashSet::new();
        for tag in &self.tags {
            if let Some(parent) = tag.parent {
                if !seen.contains(&parent) {
                    return Err(PbsError::InvalidPortable {
                        message: format!(
                            "tag {} refers to parent {} which is not listed before it",
                            tag.key, parent
                        ),
                    });
                }
            }
            if !seen.insert(tag.key) {
                return Err(PbsError::InvalidPortable {
                    message: format!("duplicate tag key {}", tag.key),
                });
            }
        }

        for shortcut in &self.shortcuts {
            if let Some(key) = shortcut.tags.iter().find(|k| !seen.contains(k)) {
                return Err(PbsError::InvalidPortable {
                    message: format!("shortcut refers to unknown tag key {}", key),
                });
            }
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate a portable selection.
    pub fn from_json(s: &str) -> Result<Self> {
        let selection: PortableSelection = serde_json::from_str(s)?;
        selection.validate()?;
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(key: u32, parent: Option<u32>, name: &str) -> PortableTag {
        PortableTag {
            key,
            parent,
            name: name.to_string(),
            icon: None,
        }
    }

    #[test]
    fn test_child_before_parent_is_rejected() {
        let selection = PortableSelection {
            tags: vec![tag(1, Some(0), "child"), tag(0, None, "parent")],
            ..Default::default()
        };
        let err = selection.validate().unwrap_err();
        assert!(matches!(err, PbsError::InvalidPortable { .. }));
    }

    #[test]
    fn test_unknown_shortcut_tag_key_is_rejected() {
        let selection = PortableSelection {
            tags: vec![tag(0, None, "Work")],
            shortcuts: vec![PortableShortcut {
                kind: ShortcutKind::url(),
                content: "http://example.com".into(),
                metadata: Metadata::new(),
                tags: vec![0, 9],
                at_target: false,
            }],
            ..Default::default()
        };
        assert!(selection.validate().is_err());
    }

    #[test]
    fn test_from_json_validates() {
        let json = r#"{"version":1,"tags":[{"key":0,"name":"Work"},{"key":1,"parent":0,"name":"Docs"}],
            "shortcuts":[{"kind":"url","content":"http://example.com","tags":[1]}]}"#;
        let selection = PortableSelection::from_json(json).unwrap();
        assert_eq!(selection.tags.len(), 2);
        assert!(!selection.shortcuts[0].at_target);

        assert!(PortableSelection::from_json(r#"{"version":7}"#).is_err());
    }
}

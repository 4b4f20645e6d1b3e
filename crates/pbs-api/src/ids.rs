use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind id of the built-in URL shortcut type.
pub const URL_KIND: &str = "url";

/// Kind id of the built-in shell command shortcut type.
pub const SHELL_KIND: &str = "shell";

/// Stable handle of a tag inside the store arena.
///
/// Ids are allocated from a monotonically increasing counter and never reused,
/// so undoing a delete restores the tag under the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub u64);

impl TagId {
    /// The synthetic root of the tag tree. It has no parent and cannot be deleted.
    pub const ROOT: TagId = TagId(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag:{}", self.0)
    }
}

/// Stable handle of a shortcut inside the store arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortcutId(pub u64);

impl fmt::Display for ShortcutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shortcut:{}", self.0)
    }
}

/// Opaque reference to an image resource (theme icon name, file path, data URI).
///
/// The core never decodes icons; it only compares and stores them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Icon(String);

impl Icon {
    pub fn new(resource: impl Into<String>) -> Self {
        Icon(resource.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Icon {
    fn from(s: &str) -> Self {
        Icon::new(s)
    }
}

/// Identifies the type handler responsible for a shortcut (URL, shell command, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortcutKind(String);

impl ShortcutKind {
    pub fn new(kind: impl Into<String>) -> Self {
        ShortcutKind(kind.into())
    }

    pub fn url() -> Self {
        Self::new(URL_KIND)
    }

    pub fn shell() -> Self {
        Self::new(SHELL_KIND)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortcutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShortcutKind {
    fn from(s: &str) -> Self {
        ShortcutKind::new(s)
    }
}

use std::fmt;

use crate::ids::{ShortcutId, TagId};

pub type Result<T> = std::result::Result<T, PbsError>;

/// A creation that collides with an existing entity under the active uniqueness policy.
#[derive(Debug, Clone, PartialEq)]
pub enum Conflict {
    /// A sibling tag with the same key already exists under `parent`.
    Tag {
        parent: TagId,
        existing: TagId,
        name: String,
    },
    /// A shortcut with the same key already exists.
    Shortcut {
        existing: ShortcutId,
        identity: String,
    },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::Tag {
                parent,
                existing,
                name,
            } => write!(f, "tag '{}' already exists under {} as {}", name, parent, existing),
            Conflict::Shortcut { existing, identity } => {
                write!(f, "shortcut {} already exists ({})", existing, identity)
            }
        }
    }
}

/// Errors returned by the PBS core
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PbsError {
    #[error("Tag not found: {id}")]
    TagNotFound { id: TagId },

    #[error("Shortcut not found: {id}")]
    ShortcutNotFound { id: ShortcutId },

    #[error("The root tag cannot be {action}")]
    RootTag { action: &'static str },

    #[error("Cyclic move detected: cannot move tag {id} to descendant {target_parent}")]
    CyclicMove { id: TagId, target_parent: TagId },

    #[error("Conflict: {conflict}")]
    Conflict { conflict: Conflict },

    #[error("Operation cancelled: {reason}")]
    Cancelled { reason: String },

    #[error("Dangling reference: {message}")]
    DanglingReference { message: String },

    #[error("Transaction '{label}' could not be replayed: {message}")]
    CorruptTransaction { label: String, message: String },

    #[error("Unknown shortcut type: {kind}")]
    UnknownShortcutType { kind: String },

    #[error("Invalid portable selection: {message}")]
    InvalidPortable { message: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Integrity violation: {message}")]
    Integrity { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl PbsError {
    pub fn dangling(message: impl Into<String>) -> Self {
        PbsError::DanglingReference {
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        PbsError::InvalidOperation {
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole enclosing transaction by user request.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, PbsError::Cancelled { .. })
    }
}

impl From<serde_json::Error> for PbsError {
    fn from(err: serde_json::Error) -> Self {
        PbsError::Serialization {
            message: err.to_string(),
        }
    }
}

//! Shared vocabulary for the PBS core
//!
//! This crate holds the types every layer agrees on:
//! - identifiers for tags and shortcuts
//! - metadata values and shortcut kinds
//! - the error enum returned by every fallible operation
//! - change notifications delivered to observers
//! - the portable selection format used across process boundaries

pub mod change;
pub mod error;
pub mod ids;
pub mod portable;
pub mod value;

pub use change::{Change, ChangeOrigin, ModelChanges};
pub use error::{Conflict, PbsError, Result};
pub use ids::{Icon, ShortcutId, ShortcutKind, TagId, SHELL_KIND, URL_KIND};
pub use portable::{PortableSelection, PortableShortcut, PortableTag, PORTABLE_FORMAT_VERSION};
pub use value::{Metadata, Value, METADATA_ICON, METADATA_TITLE};

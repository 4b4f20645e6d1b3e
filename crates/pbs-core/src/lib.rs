//! Core model and undo engine for PBS
//!
//! This crate provides:
//! - `Store`: the arena owning the tag tree and the shortcut collection
//! - `AtomicOperation`: the only way to mutate the store, each with an exact inverse
//! - `Transaction` / `UndoStack`: named operation groups and their undo/redo history
//! - `Selection`: primary/secondary selection sets and their portable encoding

pub mod operation;
pub mod selection;
pub mod shortcut;
pub mod store;
pub mod tag;
pub mod transaction;
pub mod undo;

pub use operation::AtomicOperation;
pub use selection::{SelectedShortcut, Selection};
pub use shortcut::{shortcut_identity, Shortcut};
pub use store::{ShortcutSnapshot, Store, StoreSnapshot, Subtree, TagSnapshot};
pub use tag::Tag;
pub use transaction::{Transaction, TransactionStatus};
pub use undo::UndoStack;

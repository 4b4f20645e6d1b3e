//! PBS: bookmarks and shell shortcuts filed under a tag tree, with undo/redo
//!
//! The model and undo engine live in `pbs-core`; this crate wires them to the
//! outside world:
//! - `Controller`: transactional operations, conflict policy, notifications
//! - `ShortcutTypeRegistry`: per-kind summaries, validation and launch plans
//! - `PbsConfig` / `AppContext`: YAML configuration and application context
//! - `logging::init_logging`: tracing subscriber setup

pub mod config;
pub mod conflict;
pub mod context;
pub mod controller;
pub mod logging;
pub mod observer;
pub mod registry;

pub use config::{
    ConflictAction, ConflictPolicy, LoggingConfig, PbsConfig, ShortcutUniqueness, TagUniqueness,
};
pub use conflict::{ConflictResolver, FixedResolver, Outcome, Resolution};
pub use context::AppContext;
pub use controller::{Controller, PasteReport, ShortcutDraft, ShortcutUpdate, TagUpdate};
pub use observer::{ModelObserver, ObserverId, ObserverSet};
pub use registry::{Invocation, ShellHandler, ShortcutTypeHandler, ShortcutTypeRegistry, UrlHandler};

pub use pbs_api::*;
pub use pbs_core::{Selection, SelectedShortcut, Shortcut, Store, StoreSnapshot, Tag};

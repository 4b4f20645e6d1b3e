//! Shortcut type handlers
//!
//! Each shortcut kind (URL, shell command, ...) is served by a handler registered at
//! startup. The core only asks handlers for summaries, content validation and a
//! launch plan; actually launching is left to the platform layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use pbs_api::{PbsError, Result, ShortcutKind};
use pbs_core::Shortcut;

/// Program and arguments the platform layer should spawn to run a shortcut
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

pub trait ShortcutTypeHandler {
    fn kind(&self) -> ShortcutKind;

    /// Name shown to the user, e.g. "Web page"
    fn display_name(&self) -> &str;

    /// One-line description of a shortcut of this kind
    fn summarize(&self, shortcut: &Shortcut) -> String {
        match shortcut.title() {
            Some(title) => format!("{} ({})", title, shortcut.content()),
            None => shortcut.content().to_string(),
        }
    }

    fn validate(&self, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(PbsError::invalid(format!(
                "{} shortcut needs content",
                self.display_name()
            )));
        }
        Ok(())
    }

    fn invocation(&self, shortcut: &Shortcut) -> Result<Invocation>;
}

pub struct UrlHandler {
    opener: String,
}

impl UrlHandler {
    pub fn new(opener: impl Into<String>) -> Self {
        Self {
            opener: opener.into(),
        }
    }
}

impl ShortcutTypeHandler for UrlHandler {
    fn kind(&self) -> ShortcutKind {
        ShortcutKind::url()
    }

    fn display_name(&self) -> &str {
        "URL"
    }

    fn validate(&self, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() || content.contains(char::is_whitespace) {
            return Err(PbsError::invalid(format!("'{}' is not a URL", content)));
        }
        Ok(())
    }

    fn invocation(&self, shortcut: &Shortcut) -> Result<Invocation> {
        Ok(Invocation {
            program: self.opener.clone(),
            args: vec![shortcut.content().to_string()],
        })
    }
}

pub struct ShellHandler;

impl ShortcutTypeHandler for ShellHandler {
    fn kind(&self) -> ShortcutKind {
        ShortcutKind::shell()
    }

    fn display_name(&self) -> &str {
        "Shell command"
    }

    fn summarize(&self, shortcut: &Shortcut) -> String {
        match shortcut.title() {
            Some(title) => format!("{} $ {}", title, shortcut.content()),
            None => format!("$ {}", shortcut.content()),
        }
    }

    fn invocation(&self, shortcut: &Shortcut) -> Result<Invocation> {
        Ok(Invocation {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), shortcut.content().to_string()],
        })
    }
}

/// Handlers keyed by shortcut kind
#[derive(Clone, Default)]
pub struct ShortcutTypeRegistry {
    handlers: BTreeMap<ShortcutKind, Arc<dyn ShortcutTypeHandler>>,
}

impl std::fmt::Debug for ShortcutTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortcutTypeRegistry")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ShortcutTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the URL and shell handlers
    pub fn with_builtins(url_opener: &str) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(UrlHandler::new(url_opener)));
        registry.register(Arc::new(ShellHandler));
        registry
    }

    /// Register a handler, replacing any previous handler of the same kind
    pub fn register(&mut self, handler: Arc<dyn ShortcutTypeHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: &ShortcutKind) -> Option<&Arc<dyn ShortcutTypeHandler>> {
        self.handlers.get(kind)
    }

    pub fn require(&self, kind: &ShortcutKind) -> Result<&Arc<dyn ShortcutTypeHandler>> {
        self.get(kind).ok_or_else(|| PbsError::UnknownShortcutType {
            kind: kind.to_string(),
        })
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ShortcutKind> {
        self.handlers.keys()
    }

    /// Summary from the kind's handler; title or content for unknown kinds
    pub fn summarize(&self, shortcut: &Shortcut) -> String {
        match self.get(shortcut.kind()) {
            Some(handler) => handler.summarize(shortcut),
            None => shortcut.display_name().to_string(),
        }
    }
}

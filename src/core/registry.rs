//! Logger registry: owns the logger tree and resolves routes
//!
//! Every logger node lives in an arena inside the registry. Parent edges are
//! arena indices, so the registry is the only owner of the tree. Handler
//! lists are copy-on-write snapshots: a dispatch clones the route under the
//! read lock and runs the handlers after releasing it, so configuration
//! changes never block on slow sinks and never expose a half-updated list.

use super::{
    error::{Result, RouterError},
    error_channel::ErrorChannel,
    formatter::TemplateFormatter,
    handler::Handler,
    level::Level,
    logger::Logger,
};
use crate::sinks::ConsoleSink;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name of the root logger; `""` refers to it as well
pub const ROOT_LOGGER_NAME: &str = "root";

/// Level the root logger starts with
pub const DEFAULT_ROOT_LEVEL: Level = Level::Warning;

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Reject dotted names with empty segments
pub(crate) fn validate_logger_name(name: &str) -> Result<()> {
    if name.is_empty() || name == ROOT_LOGGER_NAME {
        return Ok(());
    }
    if name.split('.').any(|segment| segment.trim().is_empty()) {
        return Err(RouterError::InvalidLoggerName(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct LoggerId(usize);

impl LoggerId {
    pub(crate) const ROOT: LoggerId = LoggerId(0);
}

struct LoggerNode {
    name: Arc<str>,
    parent: Option<LoggerId>,
    level: Option<Level>,
    propagate: bool,
    handlers: Arc<[Arc<Handler>]>,
}

impl LoggerNode {
    fn new(name: Arc<str>, parent: Option<LoggerId>, level: Option<Level>) -> Self {
        Self {
            name,
            parent,
            level,
            propagate: true,
            handlers: Arc::from(Vec::new()),
        }
    }
}

struct Tree {
    nodes: Vec<LoggerNode>,
    by_name: HashMap<Arc<str>, LoggerId>,
}

impl Tree {
    fn node(&self, id: LoggerId) -> &LoggerNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: LoggerId) -> &mut LoggerNode {
        &mut self.nodes[id.0]
    }

    fn insert(&mut self, name: &str, parent: LoggerId) -> LoggerId {
        let id = LoggerId(self.nodes.len());
        let name: Arc<str> = Arc::from(name);
        self.nodes
            .push(LoggerNode::new(Arc::clone(&name), Some(parent), None));
        self.by_name.insert(name, id);
        id
    }
}

struct RegistryInner {
    tree: RwLock<Tree>,
    disabled: RwLock<Option<Level>>,
    last_resort: Option<Arc<Handler>>,
    errors: ErrorChannel,
}

/// Owner of a logger tree
///
/// A registry is cheap to clone; clones share the same tree. Most programs
/// use [`Registry::global`], while tests and embedded components can build
/// isolated registries of their own.
///
/// # Example
///
/// ```
/// use log_router::prelude::*;
///
/// let registry = Registry::new();
/// let db = registry.get_logger("app.db").unwrap();
///
/// assert_eq!(db.parent().unwrap().name(), "app");
/// assert_eq!(db.effective_level(), Level::Warning);
/// assert_eq!(registry.get_logger("app.db").unwrap(), db);
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::builder().assemble()
    }

    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The process-wide registry, created on first use
    pub fn global() -> &'static Registry {
        &GLOBAL_REGISTRY
    }

    pub fn root(&self) -> Logger {
        let name = Arc::clone(&self.inner.tree.read().node(LoggerId::ROOT).name);
        Logger::new(self.clone(), LoggerId::ROOT, name)
    }

    /// Look up a logger by dotted name, creating it and any missing ancestors
    ///
    /// `""` and `"root"` return the root logger. Names with empty segments
    /// (`"a..b"`, `".a"`, `"a."`) are rejected.
    pub fn get_logger(&self, name: &str) -> Result<Logger> {
        if name.is_empty() || name == ROOT_LOGGER_NAME {
            return Ok(self.root());
        }
        validate_logger_name(name)?;

        if let Some(logger) = self.lookup(name) {
            return Ok(logger);
        }

        let mut tree = self.inner.tree.write();
        let mut parent = LoggerId::ROOT;
        let mut end = 0;
        for segment in name.split('.') {
            end += segment.len();
            let prefix = &name[..end];
            let existing = tree.by_name.get(prefix).copied();
            parent = match existing {
                Some(id) => id,
                None => tree.insert(prefix, parent),
            };
            // Skip the dot separating this segment from the next
            end += 1;
        }

        let name = Arc::clone(&tree.node(parent).name);
        Ok(Logger::new(self.clone(), parent, name))
    }

    fn lookup(&self, name: &str) -> Option<Logger> {
        let tree = self.inner.tree.read();
        tree.by_name.get(name).map(|id| {
            let name = Arc::clone(&tree.node(*id).name);
            Logger::new(self.clone(), *id, name)
        })
    }

    /// Names of every logger created so far, root first
    pub fn logger_names(&self) -> Vec<String> {
        self.inner
            .tree
            .read()
            .nodes
            .iter()
            .map(|node| node.name.to_string())
            .collect()
    }

    /// Suppress every call at or below `level` on all loggers of this registry
    pub fn disable(&self, level: Level) {
        *self.inner.disabled.write() = Some(level);
    }

    pub fn enable_all(&self) {
        *self.inner.disabled.write() = None;
    }

    pub fn disabled_level(&self) -> Option<Level> {
        *self.inner.disabled.read()
    }

    /// Channel given to handlers this registry creates itself
    pub fn error_channel(&self) -> &ErrorChannel {
        &self.inner.errors
    }

    /// Handler used when a record's route contains no handler at all
    pub fn last_resort(&self) -> Option<&Arc<Handler>> {
        self.inner.last_resort.as_ref()
    }

    /// Every distinct handler attached anywhere in the tree
    pub fn attached_handlers(&self) -> Vec<Arc<Handler>> {
        let tree = self.inner.tree.read();
        let mut unique: Vec<Arc<Handler>> = Vec::new();
        for handler in tree.nodes.iter().flat_map(|node| node.handlers.iter()) {
            if !unique.iter().any(|seen| Arc::ptr_eq(seen, handler)) {
                unique.push(Arc::clone(handler));
            }
        }
        unique
    }

    /// Flush every attached handler; the first error is returned after all were tried
    pub fn flush_all(&self) -> Result<()> {
        let mut first_error = None;
        for handler in self.attached_handlers() {
            if let Err(e) = handler.flush() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Flush and close every attached handler and the last-resort handler
    pub fn shutdown(&self) -> Result<()> {
        let mut first_error = None;
        let handlers = self
            .attached_handlers()
            .into_iter()
            .chain(self.inner.last_resort.iter().cloned());
        for handler in handlers {
            if let Err(e) = handler.flush().and_then(|_| handler.close()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    // ---- node access used by `Logger` ----

    pub(crate) fn parent_of(&self, id: LoggerId) -> Option<Logger> {
        let tree = self.inner.tree.read();
        tree.node(id).parent.map(|parent| {
            let name = Arc::clone(&tree.node(parent).name);
            Logger::new(self.clone(), parent, name)
        })
    }

    pub(crate) fn level_of(&self, id: LoggerId) -> Option<Level> {
        self.inner.tree.read().node(id).level
    }

    pub(crate) fn set_level_of(&self, id: LoggerId, level: Option<Level>) -> Result<()> {
        if id == LoggerId::ROOT && level.is_none() {
            return Err(RouterError::config(
                "root logger",
                "the root logger must keep an explicit level",
            ));
        }
        self.inner.tree.write().node_mut(id).level = level;
        Ok(())
    }

    /// Own level, or the nearest ancestor's explicit level
    pub(crate) fn effective_level_of(&self, id: LoggerId) -> Level {
        let tree = self.inner.tree.read();
        let mut current = Some(id);
        while let Some(cid) = current {
            let node = tree.node(cid);
            if let Some(level) = node.level {
                return level;
            }
            current = node.parent;
        }
        DEFAULT_ROOT_LEVEL
    }

    pub(crate) fn propagate_of(&self, id: LoggerId) -> bool {
        self.inner.tree.read().node(id).propagate
    }

    pub(crate) fn set_propagate_of(&self, id: LoggerId, propagate: bool) {
        self.inner.tree.write().node_mut(id).propagate = propagate;
    }

    pub(crate) fn handlers_of(&self, id: LoggerId) -> Arc<[Arc<Handler>]> {
        Arc::clone(&self.inner.tree.read().node(id).handlers)
    }

    pub(crate) fn attach(&self, id: LoggerId, handler: Arc<Handler>) {
        let mut tree = self.inner.tree.write();
        let node = tree.node_mut(id);
        let mut next: Vec<Arc<Handler>> = node.handlers.iter().cloned().collect();
        next.push(handler);
        node.handlers = next.into();
    }

    pub(crate) fn detach_all(&self, id: LoggerId) -> Vec<Arc<Handler>> {
        let mut tree = self.inner.tree.write();
        let node = tree.node_mut(id);
        let removed = node.handlers.to_vec();
        node.handlers = Arc::from(Vec::new());
        removed
    }

    /// Remove the first attachment of `handler`; false when it was not attached
    pub(crate) fn detach(&self, id: LoggerId, handler: &Arc<Handler>) -> bool {
        let mut tree = self.inner.tree.write();
        let node = tree.node_mut(id);
        let Some(position) = node.handlers.iter().position(|h| Arc::ptr_eq(h, handler)) else {
            return false;
        };
        let mut next: Vec<Arc<Handler>> = node.handlers.iter().cloned().collect();
        next.remove(position);
        node.handlers = next.into();
        true
    }

    /// Ordered handlers a record accepted by `id` must visit
    ///
    /// The logger's own handlers in attachment order, then each ancestor's
    /// for as long as `propagate` holds on the level being left.
    pub(crate) fn route(&self, id: LoggerId) -> Vec<Arc<Handler>> {
        let tree = self.inner.tree.read();
        let mut route = Vec::new();
        let mut current = Some(id);
        while let Some(cid) = current {
            let node = tree.node(cid);
            route.extend(node.handlers.iter().cloned());
            if !node.propagate {
                break;
            }
            current = node.parent;
        }
        route
    }

    /// True when any handler is reachable through the propagation chain
    pub(crate) fn has_route(&self, id: LoggerId) -> bool {
        let tree = self.inner.tree.read();
        let mut current = Some(id);
        while let Some(cid) = current {
            let node = tree.node(cid);
            if !node.handlers.is_empty() {
                return true;
            }
            if !node.propagate {
                return false;
            }
            current = node.parent;
        }
        false
    }

    pub(crate) fn same_as(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("loggers", &self.inner.tree.read().nodes.len())
            .field("disabled", &self.disabled_level())
            .field("last_resort", &self.inner.last_resort.is_some())
            .finish()
    }
}

/// Builder for [`Registry`]
///
/// # Example
/// ```
/// use log_router::prelude::*;
///
/// let errors = ErrorChannel::new(64);
/// let registry = Registry::builder()
///     .root_level(Level::Info)
///     .error_channel(errors)
///     .last_resort(None)
///     .build()
///     .unwrap();
/// assert_eq!(registry.root().effective_level(), Level::Info);
/// assert!(registry.last_resort().is_none());
/// ```
pub struct RegistryBuilder {
    root_level: Level,
    errors: Option<ErrorChannel>,
    last_resort: Option<Option<Arc<Handler>>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            root_level: DEFAULT_ROOT_LEVEL,
            errors: None,
            last_resort: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn root_level(mut self, level: Level) -> Self {
        self.root_level = level;
        self
    }

    /// Channel for sink failures of handlers built by the registry
    #[must_use = "builder methods return a new value"]
    pub fn error_channel(mut self, errors: ErrorChannel) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Replace (or with `None`, remove) the default stderr last-resort handler
    ///
    /// A supplied handler keeps the error channel it was built with; the
    /// registry's channel only applies to the default handler.
    #[must_use = "builder methods return a new value"]
    pub fn last_resort(mut self, handler: Option<Arc<Handler>>) -> Self {
        self.last_resort = Some(handler);
        self
    }

    /// Build the registry
    ///
    /// Fails with `MissingFormatter` when the supplied last-resort handler
    /// has no formatter, since every record falling back to it would fail.
    pub fn build(self) -> Result<Registry> {
        if let Some(Some(handler)) = &self.last_resort {
            if !handler.has_formatter() {
                return Err(RouterError::missing_formatter(handler.name()));
            }
        }
        Ok(self.assemble())
    }

    fn assemble(self) -> Registry {
        let errors = self
            .errors
            .unwrap_or_else(|| ErrorChannel::global().clone());
        let last_resort = self.last_resort.unwrap_or_else(|| {
            Some(
                Handler::builder(ConsoleSink::stderr())
                    .name("last-resort")
                    .level(Level::Warning)
                    .formatter(TemplateFormatter::message_only())
                    .error_channel(errors.clone())
                    .build(),
            )
        });

        let root_name: Arc<str> = Arc::from(ROOT_LOGGER_NAME);
        let mut by_name = HashMap::new();
        by_name.insert(Arc::clone(&root_name), LoggerId::ROOT);
        let tree = Tree {
            nodes: vec![LoggerNode::new(root_name, None, Some(self.root_level))],
            by_name,
        };

        Registry {
            inner: Arc::new(RegistryInner {
                tree: RwLock::new(tree),
                disabled: RwLock::new(None),
                last_resort,
                errors,
            }),
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_registry() -> Registry {
        Registry::builder().last_resort(None).build().unwrap()
    }

    #[test]
    fn test_ancestors_created_lazily() {
        let registry = quiet_registry();
        registry.get_logger("a.b.c").unwrap();

        assert_eq!(registry.logger_names(), vec!["root", "a", "a.b", "a.b.c"]);
    }

    #[test]
    fn test_same_name_same_logger() {
        let registry = quiet_registry();
        let first = registry.get_logger("svc.api").unwrap();
        let second = registry.get_logger("svc.api").unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.logger_names().len(), 3);
    }

    #[test]
    fn test_root_aliases() {
        let registry = quiet_registry();
        assert_eq!(registry.get_logger("").unwrap(), registry.root());
        assert_eq!(registry.get_logger("root").unwrap(), registry.root());
        assert!(registry.root().parent().is_none());
    }

    #[test]
    fn test_invalid_names() {
        let registry = quiet_registry();
        for name in ["a..b", ".a", "a.", " . "] {
            assert!(
                matches!(registry.get_logger(name), Err(RouterError::InvalidLoggerName(_))),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_registries_are_isolated() {
        let first = quiet_registry();
        let second = quiet_registry();
        first.get_logger("only.here").unwrap();

        assert_eq!(second.logger_names(), vec!["root"]);
        assert_ne!(first.root(), second.root());
    }

    #[test]
    fn test_root_level_cannot_be_cleared() {
        let registry = quiet_registry();
        let err = registry.root().clear_level().unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(registry.root().level(), Some(DEFAULT_ROOT_LEVEL));
    }

    #[test]
    fn test_default_last_resort() {
        let registry = Registry::new();
        let last_resort = registry.last_resort().expect("default last resort");
        assert_eq!(last_resort.level(), Level::Warning);
        assert_eq!(last_resort.name(), "last-resort");
    }

    #[test]
    fn test_last_resort_without_formatter_is_rejected() {
        let bare = Handler::builder(crate::sinks::MemorySink::new())
            .name("bare")
            .build();
        let result = Registry::builder()
            .error_channel(ErrorChannel::new(8))
            .last_resort(Some(bare))
            .build();

        match result {
            Err(RouterError::MissingFormatter { handler }) => assert_eq!(handler, "bare"),
            other => panic!("expected MissingFormatter, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_disable() {
        let registry = quiet_registry();
        registry.disable(Level::Info);
        assert_eq!(registry.disabled_level(), Some(Level::Info));
        registry.enable_all();
        assert_eq!(registry.disabled_level(), None);
    }
}

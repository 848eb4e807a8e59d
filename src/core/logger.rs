//! Named loggers and record dispatch

use super::{
    error::{Result, RouterError},
    error_channel::SinkFailure,
    fields::{Extra, Message},
    handler::Handler,
    level::Level,
    record::LogRecord,
    registry::{LoggerId, Registry},
};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;

/// Handle to a named node in a registry's logger tree
///
/// Handles are cheap to clone and compare equal when they refer to the same
/// node of the same registry. All state (level, handlers, propagation) lives
/// in the registry, so every handle observes changes made through any other.
#[derive(Clone)]
pub struct Logger {
    registry: Registry,
    id: LoggerId,
    name: Arc<str>,
}

impl Logger {
    pub(crate) fn new(registry: Registry, id: LoggerId, name: Arc<str>) -> Self {
        Self { registry, id, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.id == LoggerId::ROOT
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn parent(&self) -> Option<Logger> {
        self.registry.parent_of(self.id)
    }

    /// Logger named `<this name>.<suffix>`
    pub fn get_child(&self, suffix: &str) -> Result<Logger> {
        if self.is_root() {
            self.registry.get_logger(suffix)
        } else {
            self.registry.get_logger(&format!("{}.{}", self.name, suffix))
        }
    }

    /// Explicitly set level, if any
    pub fn level(&self) -> Option<Level> {
        self.registry.level_of(self.id)
    }

    pub fn set_level(&self, level: Level) {
        // Only clearing the root level can fail
        let _ = self.registry.set_level_of(self.id, Some(level));
    }

    /// Fall back to the nearest ancestor's level; not allowed on the root
    pub fn clear_level(&self) -> Result<()> {
        self.registry.set_level_of(self.id, None)
    }

    pub fn effective_level(&self) -> Level {
        self.registry.effective_level_of(self.id)
    }

    pub fn propagate(&self) -> bool {
        self.registry.propagate_of(self.id)
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.registry.set_propagate_of(self.id, propagate);
    }

    /// Attach a handler after this logger's existing ones
    ///
    /// Attaching the same handler twice is allowed and makes it emit every
    /// record twice. A handler without a formatter is rejected.
    pub fn add_handler(&self, handler: Arc<Handler>) -> Result<()> {
        if !handler.has_formatter() {
            return Err(RouterError::missing_formatter(handler.name()));
        }
        self.registry.attach(self.id, handler);
        Ok(())
    }

    /// Detach the first attachment of `handler`
    ///
    /// Returns `HandlerNotFound` when the handler is not attached here.
    pub fn remove_handler(&self, handler: &Arc<Handler>) -> Result<()> {
        if self.registry.detach(self.id, handler) {
            Ok(())
        } else {
            Err(RouterError::handler_not_found(self.name(), handler.name()))
        }
    }

    /// Detach every handler of this logger, returning them in order
    pub fn clear_handlers(&self) -> Vec<Arc<Handler>> {
        self.registry.detach_all(self.id)
    }

    /// This logger's own handlers in attachment order
    pub fn handlers(&self) -> Vec<Arc<Handler>> {
        self.registry.handlers_of(self.id).to_vec()
    }

    /// Whether any handler is reachable from here, following propagation
    pub fn has_handlers(&self) -> bool {
        self.registry.has_route(self.id)
    }

    pub fn is_enabled_for(&self, level: Level) -> bool {
        if self
            .registry
            .disabled_level()
            .is_some_and(|disabled| level <= disabled)
        {
            return false;
        }
        level >= self.effective_level()
    }

    pub fn log(&self, level: Level, message: impl Into<Message>) {
        self.log_with(level, message, Extra::new());
    }

    /// Log with extra contextual fields
    ///
    /// Returns before building a record when `level` is below the effective
    /// level, so disabled calls cost one level lookup.
    pub fn log_with(&self, level: Level, message: impl Into<Message>, extra: Extra) {
        if !self.is_enabled_for(level) {
            return;
        }
        let record = LogRecord::new(level, self.name(), message).with_extra(extra);
        self.dispatch(&record);
    }

    /// Log with a level given by name, e.g. from configuration or user input
    pub fn log_named(&self, level: &str, message: impl Into<Message>) -> Result<()> {
        let level: Level = level.parse()?;
        self.log(level, message);
        Ok(())
    }

    pub fn debug(&self, message: impl Into<Message>) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: impl Into<Message>) {
        self.log(Level::Info, message);
    }

    pub fn warning(&self, message: impl Into<Message>) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: impl Into<Message>) {
        self.log(Level::Error, message);
    }

    pub fn critical(&self, message: impl Into<Message>) {
        self.log(Level::Critical, message);
    }

    /// Hand an already accepted record to every handler on the route
    ///
    /// The route is this logger's handlers, then each ancestor's while
    /// propagation holds. Ancestor levels are not consulted; only handler
    /// levels and filters decide from here on. With an empty route the
    /// registry's last-resort handler, if any, gets the record.
    pub fn dispatch(&self, record: &LogRecord) {
        let route = self.registry.route(self.id);
        if route.is_empty() {
            if let Some(last_resort) = self.registry.last_resort() {
                Self::deliver(last_resort, record);
            }
            return;
        }
        for handler in &route {
            Self::deliver(handler, record);
        }
    }

    fn deliver(handler: &Handler, record: &LogRecord) {
        if let Err(error) = handler.handle(record) {
            handler.error_channel().report(SinkFailure {
                handler: handler.name().to_string(),
                logger: record.logger_name().to_string(),
                level: record.level(),
                error,
                at: Utc::now(),
            });
        }
    }
}

impl PartialEq for Logger {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.registry.same_as(&other.registry)
    }
}

impl Eq for Logger {}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("propagate", &self.propagate())
            .finish()
    }
}

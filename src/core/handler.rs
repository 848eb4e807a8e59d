//! Handlers: per-destination threshold, filters, formatter and sink

use super::{
    error::{Result, RouterError},
    error_channel::{ErrorChannel, SinkFailure},
    filter::Filter,
    formatter::Formatter,
    level::Level,
    metrics::HandlerMetrics,
    record::LogRecord,
    sink::Sink,
};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Decides per record whether to emit, and performs the emission
///
/// Handlers are shared as `Arc<Handler>` and may be attached to several
/// loggers. All writes to the sink go through one mutex, so records handled
/// concurrently are written whole, one after another.
pub struct Handler {
    name: String,
    level: RwLock<Level>,
    filters: RwLock<Arc<[Arc<dyn Filter>]>>,
    formatter: RwLock<Option<Arc<dyn Formatter>>>,
    sink: Mutex<Box<dyn Sink>>,
    auto_flush: bool,
    closed: AtomicBool,
    errors: ErrorChannel,
    metrics: HandlerMetrics,
}

impl Handler {
    /// Create a builder for a handler writing to `sink`
    ///
    /// # Example
    /// ```
    /// use log_router::prelude::*;
    ///
    /// let handler = Handler::builder(MemorySink::new())
    ///     .name("audit")
    ///     .level(Level::Warning)
    ///     .formatter(TemplateFormatter::new("{level}:{message}").unwrap())
    ///     .build();
    /// assert_eq!(handler.level(), Level::Warning);
    /// ```
    #[must_use]
    pub fn builder<S: Sink + 'static>(sink: S) -> HandlerBuilder {
        HandlerBuilder::new(Box::new(sink))
    }

    /// Like [`Handler::builder`], for sinks chosen at runtime
    #[must_use]
    pub fn builder_boxed(sink: Box<dyn Sink>) -> HandlerBuilder {
        HandlerBuilder::new(sink)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        *self.level.read()
    }

    pub fn set_level(&self, level: Level) {
        *self.level.write() = level;
    }

    pub fn add_filter<F: Filter + 'static>(&self, filter: F) {
        self.add_shared_filter(Arc::new(filter));
    }

    pub fn add_shared_filter(&self, filter: Arc<dyn Filter>) {
        let mut filters = self.filters.write();
        let mut next: Vec<Arc<dyn Filter>> = filters.iter().cloned().collect();
        next.push(filter);
        *filters = next.into();
    }

    pub fn clear_filters(&self) {
        *self.filters.write() = Arc::from(Vec::new());
    }

    pub fn filter_count(&self) -> usize {
        self.filters.read().len()
    }

    pub fn set_formatter<F: Formatter + 'static>(&self, formatter: F) {
        self.set_shared_formatter(Arc::new(formatter));
    }

    /// Install a formatter that may also be used by other handlers
    pub fn set_shared_formatter(&self, formatter: Arc<dyn Formatter>) {
        *self.formatter.write() = Some(formatter);
    }

    pub fn has_formatter(&self) -> bool {
        self.formatter.read().is_some()
    }

    pub fn metrics(&self) -> &HandlerMetrics {
        &self.metrics
    }

    pub fn error_channel(&self) -> &ErrorChannel {
        &self.errors
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Handle one record
    ///
    /// Records below the handler's level or rejected by a filter are dropped
    /// silently; the formatter and sink are not touched. Sink failures are
    /// reported on the error channel and never returned. The only error is a
    /// missing formatter, which is a configuration mistake.
    pub fn handle(&self, record: &LogRecord) -> Result<()> {
        if record.level() < self.level() {
            self.metrics.record_below_level();
            return Ok(());
        }

        let filters = Arc::clone(&self.filters.read());
        if !filters.iter().all(|filter| filter.accepts(record)) {
            self.metrics.record_filtered();
            return Ok(());
        }

        let formatter = self
            .formatter
            .read()
            .clone()
            .ok_or_else(|| RouterError::missing_formatter(&self.name))?;
        if self.is_closed() {
            self.report(record, RouterError::SinkClosed(self.name.clone()));
            return Ok(());
        }
        let text = formatter.format(record);

        match self.write(&text) {
            Ok(()) => {
                self.metrics.record_emitted();
            }
            Err(e) => self.report(record, e),
        }
        Ok(())
    }

    /// Write under the sink lock, isolating panics raised by the sink
    fn write(&self, text: &str) -> Result<()> {
        let mut sink = self.sink.lock();
        // `close` flips the flag while holding this lock
        if self.is_closed() {
            return Err(RouterError::SinkClosed(self.name.clone()));
        }
        let auto_flush = self.auto_flush;
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| -> Result<()> {
            sink.write(text)?;
            if auto_flush {
                sink.flush()?;
            }
            Ok(())
        }));

        outcome.unwrap_or_else(|panic_info| {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            Err(RouterError::sink_panicked(sink.name(), panic_msg))
        })
    }

    fn report(&self, record: &LogRecord, error: RouterError) {
        self.metrics.record_sink_failure();
        self.errors.report(SinkFailure {
            handler: self.name.clone(),
            logger: record.logger_name().to_string(),
            level: record.level(),
            error,
            at: Utc::now(),
        });
    }

    pub fn flush(&self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.sink.lock().flush()
    }

    /// Flush and release the sink
    ///
    /// Closing twice is a no-op. Records handled after closing are reported
    /// as `SinkClosed` failures.
    pub fn close(&self) -> Result<()> {
        let mut sink = self.sink.lock();
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        sink.close()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("filters", &self.filter_count())
            .field("has_formatter", &self.has_formatter())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Builder for [`Handler`]
pub struct HandlerBuilder {
    name: Option<String>,
    level: Level,
    filters: Vec<Arc<dyn Filter>>,
    formatter: Option<Arc<dyn Formatter>>,
    sink: Box<dyn Sink>,
    auto_flush: bool,
    errors: Option<ErrorChannel>,
}

impl HandlerBuilder {
    fn new(sink: Box<dyn Sink>) -> Self {
        Self {
            name: None,
            level: Level::Debug,
            filters: Vec::new(),
            formatter: None,
            sink,
            auto_flush: true,
            errors: None,
        }
    }

    /// Name used in failure reports; defaults to the sink's name
    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn filter<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn shared_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn shared_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Flush the sink after every record (default: on)
    #[must_use = "builder methods return a new value"]
    pub fn auto_flush(mut self, auto_flush: bool) -> Self {
        self.auto_flush = auto_flush;
        self
    }

    /// Channel receiving sink failures; defaults to [`ErrorChannel::global`]
    #[must_use = "builder methods return a new value"]
    pub fn error_channel(mut self, errors: ErrorChannel) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn build(self) -> Arc<Handler> {
        let name = self.name.unwrap_or_else(|| self.sink.name().to_string());
        Arc::new(Handler {
            name,
            level: RwLock::new(self.level),
            filters: RwLock::new(self.filters.into()),
            formatter: RwLock::new(self.formatter),
            sink: Mutex::new(self.sink),
            auto_flush: self.auto_flush,
            closed: AtomicBool::new(false),
            errors: self.errors.unwrap_or_else(|| ErrorChannel::global().clone()),
            metrics: HandlerMetrics::new(),
        })
    }
}

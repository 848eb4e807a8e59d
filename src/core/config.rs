//! Declarative router configuration
//!
//! A [`RouterConfig`] describes named formatters, filters and handlers, and
//! which loggers use them. It is usually loaded from JSON:
//!
//! ```json
//! {
//!   "formatters": { "plain": { "kind": "template", "template": "{level}:{message}" } },
//!   "handlers": { "console": { "sink": { "kind": "console" }, "formatter": "plain" } },
//!   "loggers": { "app": { "level": "INFO", "handlers": ["console"] } }
//! }
//! ```
//!
//! Applying a configuration first builds every component and checks every
//! reference. The registry is only touched once all of that succeeded.

use super::{
    error::{Result, RouterError},
    fields::FieldValue,
    filter::{FieldFilter, Filter, LevelRangeFilter, NameFilter, SampleFilter},
    formatter::{Formatter, JsonFormatter, LogfmtFormatter, TemplateFormatter},
    handler::Handler,
    level::Level,
    registry::{validate_logger_name, Registry},
    sink::Sink,
    timestamp::TimestampFormat,
};
use crate::sinks::{ConsoleSink, ConsoleStream, MemoryBuffer, MemorySink};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn default_true() -> bool {
    true
}

/// Top-level configuration document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    pub formatters: BTreeMap<String, FormatterConfig>,
    pub filters: BTreeMap<String, FilterConfig>,
    pub handlers: BTreeMap<String, HandlerConfig>,
    pub loggers: BTreeMap<String, LoggerConfig>,
    pub root: Option<LoggerConfig>,

    /// Suppress every call at or below this level, registry-wide
    pub disable: Option<Level>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum FormatterConfig {
    Template {
        template: String,
        #[serde(default)]
        timestamp: TimestampFormat,
        #[serde(default)]
        colors: bool,
    },
    Json {
        #[serde(default)]
        timestamp: TimestampFormat,
    },
    Logfmt {
        #[serde(default)]
        timestamp: TimestampFormat,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum FilterConfig {
    LevelRange {
        min: Option<Level>,
        max: Option<Level>,
    },
    Name {
        name: String,
    },
    /// Presence check, or equality when `equals` is given
    Field {
        key: String,
        equals: Option<FieldValue>,
    },
    /// Exactly one of `every_nth` and `rate` must be set
    Sample {
        every_nth: Option<u64>,
        rate: Option<f64>,
        always_keep: Option<Level>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerConfig {
    pub sink: SinkConfig,
    #[serde(default)]
    pub level: Option<Level>,
    pub formatter: Option<String>,
    #[serde(default)]
    pub filters: Vec<String>,
    #[serde(default = "default_true")]
    pub auto_flush: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum SinkConfig {
    Console {
        #[serde(default)]
        stream: ConsoleStream,
    },
    File {
        path: PathBuf,
        #[serde(default = "default_true")]
        append: bool,
        #[serde(default = "default_true")]
        lock: bool,
    },
    /// In-process buffer, reachable through [`AppliedConfig::memory_buffer`]
    Memory {},
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggerConfig {
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub handlers: Vec<String>,
    #[serde(default = "default_true")]
    pub propagate: bool,
}

/// Handlers created by [`RouterConfig::apply`]
#[derive(Debug, Default)]
pub struct AppliedConfig {
    handlers: BTreeMap<String, Arc<Handler>>,
    memory_buffers: BTreeMap<String, MemoryBuffer>,
}

impl AppliedConfig {
    pub fn handler(&self, name: &str) -> Option<&Arc<Handler>> {
        self.handlers.get(name)
    }

    pub fn handlers(&self) -> impl Iterator<Item = (&str, &Arc<Handler>)> {
        self.handlers.iter().map(|(name, h)| (name.as_str(), h))
    }

    /// Buffer behind a handler configured with a memory sink
    pub fn memory_buffer(&self, handler: &str) -> Option<&MemoryBuffer> {
        self.memory_buffers.get(handler)
    }
}

impl RouterConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            RouterError::io_operation("read config", path.display().to_string(), e)
        })?;
        Self::from_json_str(&json)
    }

    /// Check every cross reference without building anything
    pub fn validate(&self) -> Result<()> {
        for (name, handler) in &self.handlers {
            let component = format!("handler '{}'", name);
            match &handler.formatter {
                None => {
                    return Err(RouterError::config(component, "no formatter configured"));
                }
                Some(formatter) if !self.formatters.contains_key(formatter) => {
                    return Err(RouterError::config(
                        component,
                        format!("unknown formatter '{}'", formatter),
                    ));
                }
                Some(_) => {}
            }
            if let Some(filter) = handler.filters.iter().find(|f| !self.filters.contains_key(*f)) {
                return Err(RouterError::config(
                    component,
                    format!("unknown filter '{}'", filter),
                ));
            }
        }

        let loggers = self
            .loggers
            .iter()
            .map(|(name, logger)| (name.as_str(), logger))
            .chain(self.root.iter().map(|root| ("root", root)));
        for (name, logger) in loggers {
            validate_logger_name(name)?;
            if let Some(handler) = logger.handlers.iter().find(|h| !self.handlers.contains_key(*h)) {
                return Err(RouterError::config(
                    format!("logger '{}'", name),
                    format!("unknown handler '{}'", handler),
                ));
            }
        }
        Ok(())
    }

    /// Build every component, then configure `registry`
    ///
    /// Configured loggers lose the handlers they had before; loggers the
    /// configuration does not mention are left alone. Without a `disable`
    /// entry any earlier suppression is lifted. Sink failures of the new
    /// handlers go to the registry's error channel.
    pub fn apply(&self, registry: &Registry) -> Result<AppliedConfig> {
        self.validate()?;

        let mut formatters: BTreeMap<&str, Arc<dyn Formatter>> = BTreeMap::new();
        for (name, config) in &self.formatters {
            formatters.insert(name, build_formatter(name, config)?);
        }

        let mut filters: BTreeMap<&str, Arc<dyn Filter>> = BTreeMap::new();
        for (name, config) in &self.filters {
            filters.insert(name, build_filter(name, config)?);
        }

        let mut applied = AppliedConfig::default();
        for (name, config) in &self.handlers {
            let (sink, buffer) = build_sink(name, &config.sink)?;
            let mut builder = Handler::builder_boxed(sink)
                .name(name.clone())
                .level(config.level.unwrap_or(Level::Debug))
                .auto_flush(config.auto_flush)
                .error_channel(registry.error_channel().clone());
            if let Some(formatter) = config.formatter.as_deref().and_then(|f| formatters.get(f)) {
                builder = builder.shared_formatter(Arc::clone(formatter));
            }
            for filter in config.filters.iter().filter_map(|f| filters.get(f.as_str())) {
                builder = builder.shared_filter(Arc::clone(filter));
            }
            if let Some(buffer) = buffer {
                applied.memory_buffers.insert(name.clone(), buffer);
            }
            applied.handlers.insert(name.clone(), builder.build());
        }

        // Everything is built and checked; configure the tree
        let loggers = self
            .root
            .iter()
            .map(|root| ("", root))
            .chain(self.loggers.iter().map(|(name, logger)| (name.as_str(), logger)));
        for (name, config) in loggers {
            let logger = registry.get_logger(name)?;
            if let Some(level) = config.level {
                logger.set_level(level);
            }
            logger.set_propagate(config.propagate);
            logger.clear_handlers();
            for handler in config.handlers.iter().filter_map(|h| applied.handlers.get(h)) {
                logger.add_handler(Arc::clone(handler))?;
            }
        }

        match self.disable {
            Some(level) => registry.disable(level),
            None => registry.enable_all(),
        }
        Ok(applied)
    }
}

fn build_formatter(name: &str, config: &FormatterConfig) -> Result<Arc<dyn Formatter>> {
    Ok(match config {
        FormatterConfig::Template {
            template,
            timestamp,
            colors,
        } => {
            let formatter = TemplateFormatter::new(template.as_str())
                .map_err(|e| RouterError::config(format!("formatter '{}'", name), e.to_string()))?
                .with_timestamp_format(timestamp.clone());
            #[cfg(feature = "console")]
            let formatter = formatter.with_colors(*colors);
            #[cfg(not(feature = "console"))]
            let _ = colors;
            Arc::new(formatter)
        }
        FormatterConfig::Json { timestamp } => {
            Arc::new(JsonFormatter::new().with_timestamp_format(timestamp.clone()))
        }
        FormatterConfig::Logfmt { timestamp } => {
            Arc::new(LogfmtFormatter::new().with_timestamp_format(timestamp.clone()))
        }
    })
}

fn build_filter(name: &str, config: &FilterConfig) -> Result<Arc<dyn Filter>> {
    Ok(match config {
        FilterConfig::LevelRange { min, max } => Arc::new(LevelRangeFilter::new(*min, *max)),
        FilterConfig::Name { name } => Arc::new(NameFilter::new(name.as_str())),
        FilterConfig::Field { key, equals } => Arc::new(match equals {
            Some(value) => FieldFilter::equals(key.as_str(), value.clone()),
            None => FieldFilter::present(key.as_str()),
        }),
        FilterConfig::Sample {
            every_nth,
            rate,
            always_keep,
        } => {
            let sample = match (every_nth, rate) {
                (Some(n), None) => SampleFilter::every_nth(*n),
                (None, Some(rate)) => SampleFilter::rate(*rate),
                _ => {
                    return Err(RouterError::config(
                        format!("filter '{}'", name),
                        "sample filters need exactly one of every_nth and rate",
                    ))
                }
            };
            Arc::new(match always_keep {
                Some(level) => sample.always_keep(*level),
                None => sample,
            })
        }
    })
}

/// Open the sink; file open failures surface as I/O errors
#[cfg_attr(feature = "file", allow(unused_variables))]
fn build_sink(handler: &str, config: &SinkConfig) -> Result<(Box<dyn Sink>, Option<MemoryBuffer>)> {
    match config {
        SinkConfig::Console { stream } => Ok((Box::new(ConsoleSink::new(*stream)), None)),
        SinkConfig::Memory {} => {
            let sink = MemorySink::new();
            let buffer = sink.buffer();
            Ok((Box::new(sink), Some(buffer)))
        }
        #[cfg(feature = "file")]
        SinkConfig::File { path, append, lock } => {
            let sink = if *append {
                crate::sinks::FileSink::new(path.clone())?
            } else {
                crate::sinks::FileSink::truncate(path.clone())?
            };
            Ok((Box::new(sink.with_locking(*lock)), None))
        }
        #[cfg(not(feature = "file"))]
        SinkConfig::File { .. } => Err(RouterError::config(
            format!("handler '{}'", handler),
            "file sinks require the `file` feature",
        )),
    }
}

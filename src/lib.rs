//! # Log Router
//!
//! Hierarchical, name-based log routing in the spirit of a classic
//! logger/handler/formatter pipeline.
//!
//! ## Features
//!
//! - **Named Loggers**: Dotted names form a tree; children inherit levels
//! - **Propagation**: Records climb to ancestor handlers unless stopped
//! - **Handlers**: Per-destination level, filter chain, formatter and sink
//! - **Thread Safe**: Whole records per write, reconfiguration while logging
//! - **Isolated Failures**: Broken sinks are reported, never propagated to callers
//!
//! ## Example
//!
//! ```
//! use log_router::prelude::*;
//!
//! let registry = Registry::builder().last_resort(None).build().unwrap();
//! let app = registry.get_logger("app").unwrap();
//! app.set_level(Level::Info);
//!
//! let sink = MemorySink::new();
//! let buffer = sink.buffer();
//! let handler = Handler::builder(sink)
//!     .formatter(TemplateFormatter::new("{level}:{message}").unwrap())
//!     .build();
//! app.add_handler(handler).unwrap();
//!
//! app.info("ready");
//! app.debug("not shown");
//! assert_eq!(buffer.lines(), vec!["INFO:ready"]);
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        AppliedConfig, ErrorChannel, Extra, FieldFilter, FieldValue, Filter, FnFilter, Formatter,
        Handler, HandlerBuilder, HandlerMetrics, JsonFormatter, Level, LevelRangeFilter,
        LogRecord, LogfmtFormatter, Logger, Message, NameFilter, Registry, RegistryBuilder,
        Result, RouterConfig, RouterError, SampleFilter, Sink, SinkFailure, TemplateFormatter,
        TimestampFormat,
    };
    pub use crate::sinks::{ConsoleSink, ConsoleStream, MemoryBuffer, MemorySink};

    #[cfg(feature = "file")]
    pub use crate::sinks::FileSink;
}

pub use crate::core::{
    AppliedConfig, ErrorChannel, Extra, FieldFilter, FieldValue, Filter, FnFilter, Formatter,
    Handler, HandlerBuilder, HandlerMetrics, JsonFormatter, Level, LevelRangeFilter, LogRecord,
    LogfmtFormatter, Logger, Message, NameFilter, Registry, RegistryBuilder, Result,
    RouterConfig, RouterError, SampleFilter, Sink, SinkFailure, TemplateFormatter,
    TimestampFormat, DEFAULT_ROOT_LEVEL, ROOT_LOGGER_NAME,
};
#[cfg(feature = "file")]
pub use sinks::FileSink;
pub use sinks::{ConsoleSink, ConsoleStream, MemoryBuffer, MemorySink};

/// Logger of the process-wide registry, created on first use
pub fn get_logger(name: &str) -> Result<Logger> {
    Registry::global().get_logger(name)
}

/// Root logger of the process-wide registry
pub fn root_logger() -> Logger {
    Registry::global().root()
}

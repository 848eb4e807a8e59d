//! Core router types and traits

pub mod config;
pub mod error;
pub mod error_channel;
pub mod fields;
pub mod filter;
pub mod formatter;
pub mod handler;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod record;
pub mod registry;
pub mod sink;
pub mod timestamp;

pub use config::{
    AppliedConfig, FilterConfig, FormatterConfig, HandlerConfig, LoggerConfig, RouterConfig,
    SinkConfig,
};
pub use error::{Result, RouterError};
pub use error_channel::{ErrorChannel, SinkFailure, DEFAULT_ERROR_CAPACITY};
pub use fields::{Extra, FieldValue, Message};
pub use filter::{FieldFilter, Filter, FnFilter, LevelRangeFilter, NameFilter, SampleFilter};
pub use formatter::{Formatter, JsonFormatter, LogfmtFormatter, TemplateFormatter};
pub use handler::{Handler, HandlerBuilder};
pub use level::Level;
pub use logger::Logger;
pub use metrics::HandlerMetrics;
pub use record::LogRecord;
pub use registry::{Registry, RegistryBuilder, DEFAULT_ROOT_LEVEL, ROOT_LOGGER_NAME};
pub use sink::Sink;
pub use timestamp::TimestampFormat;

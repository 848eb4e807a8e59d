//! Error types for the log router

pub type Result<T> = std::result::Result<T, RouterError>;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Severity name or value outside the five known levels
    #[error("Unknown log level: '{0}'")]
    UnknownLevel(String),

    /// Handler used (or attached) before a formatter was set
    #[error("Handler '{handler}' has no formatter")]
    MissingFormatter { handler: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Logger name with empty dotted segments
    #[error("Invalid logger name: '{0}'")]
    InvalidLoggerName(String),

    /// Detach of a handler that is not attached
    #[error("Handler '{handler}' is not attached to logger '{logger}'")]
    HandlerNotFound { logger: String, handler: String },

    /// Write to a sink after it was closed
    #[error("Sink '{0}' is closed")]
    SinkClosed(String),

    /// Sink panicked while writing
    #[error("Sink '{sink}' panicked: {message}")]
    SinkPanicked { sink: String, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RouterError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        RouterError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        RouterError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn missing_formatter(handler: impl Into<String>) -> Self {
        RouterError::MissingFormatter {
            handler: handler.into(),
        }
    }

    pub fn handler_not_found(logger: impl Into<String>, handler: impl Into<String>) -> Self {
        RouterError::HandlerNotFound {
            logger: logger.into(),
            handler: handler.into(),
        }
    }

    pub fn sink_panicked(sink: impl Into<String>, message: impl Into<String>) -> Self {
        RouterError::SinkPanicked {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// True for programmer errors that are raised at the point of misuse
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RouterError::UnknownLevel(_)
                | RouterError::MissingFormatter { .. }
                | RouterError::InvalidConfiguration { .. }
                | RouterError::InvalidLoggerName(_)
        )
    }

    /// True for destination failures, which are reported out of band
    pub fn is_sink(&self) -> bool {
        matches!(
            self,
            RouterError::SinkClosed(_)
                | RouterError::SinkPanicked { .. }
                | RouterError::IoOperation { .. }
                | RouterError::Io(_)
        )
    }
}

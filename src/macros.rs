//! Logging macros for ergonomic log message formatting.
//!
//! The macros check `is_enabled_for` first and only run `format!` when the
//! record will actually be dispatched, so disabled calls cost no allocation.
//!
//! # Examples
//!
//! ```
//! use log_router::prelude::*;
//! use log_router::info;
//!
//! let registry = Registry::builder().root_level(Level::Info).build().unwrap();
//! let logger = registry.get_logger("server").unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message at the given level with automatic formatting.
///
/// # Examples
///
/// ```
/// # use log_router::prelude::*;
/// # let logger = Registry::new().get_logger("app").unwrap();
/// use log_router::log;
/// log!(logger, Level::Error, "Simple message");
/// log!(logger, Level::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.is_enabled_for(level) {
            logger.log(level, format!($($arg)+));
        }
    }};
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use log_router::prelude::*;
/// # let logger = Registry::new().get_logger("app").unwrap();
/// # logger.set_level(Level::Debug);
/// use log_router::debug;
/// debug!(logger, "Cache miss for key {}", "user:42");
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use log_router::prelude::*;
/// # let logger = Registry::new().get_logger("app").unwrap();
/// use log_router::warning;
/// warning!(logger, "Disk usage at {}%", 91);
/// ```
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::Critical, $($arg)+)
    };
}

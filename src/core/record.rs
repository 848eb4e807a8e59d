//! Log record structure

use super::fields::{Extra, Message};
use super::level::Level;
use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::cell::RefCell;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn current_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn current_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// A single log event
///
/// Records are built once per accepted log call and never change afterwards;
/// every handler on the route sees the same record by shared reference.
#[derive(Debug, Clone)]
pub struct LogRecord {
    level: Level,
    message: Message,
    logger_name: String,
    timestamp: DateTime<Utc>,
    thread_id: String,
    thread_name: Option<String>,
    extra: Extra,
}

impl LogRecord {
    pub fn new(level: Level, logger_name: impl Into<String>, message: impl Into<Message>) -> Self {
        Self {
            level,
            message: message.into(),
            logger_name: logger_name.into(),
            timestamp: Utc::now(),
            thread_id: current_thread_id(),
            thread_name: current_thread_name(),
            extra: Extra::new(),
        }
    }

    #[must_use]
    pub fn with_extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }

    /// Pin the capture time, mainly for reproducible output in tests
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Rendered message with control characters escaped
    ///
    /// Newlines, carriage returns and tabs are replaced by escape sequences
    /// so that a message cannot forge additional log lines.
    pub fn message(&self) -> Cow<'_, str> {
        let rendered = self.message.render();
        if rendered.contains(['\n', '\r', '\t']) {
            Cow::Owned(
                rendered
                    .replace('\n', "\\n")
                    .replace('\r', "\\r")
                    .replace('\t', "\\t"),
            )
        } else {
            rendered
        }
    }

    /// The unrendered message template and its arguments
    pub fn raw_message(&self) -> &Message {
        &self.message
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    pub fn timestamp(&self) -> &DateTime<Utc> {
        &self.timestamp
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }

    /// Thread name when set, otherwise the thread id
    pub fn thread(&self) -> &str {
        self.thread_name.as_deref().unwrap_or(&self.thread_id)
    }

    pub fn extra(&self) -> &Extra {
        &self.extra
    }
}

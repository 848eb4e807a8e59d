//! Out-of-band reporting of sink failures
//!
//! A failing destination must never surface through the caller's `log`
//! call. Handlers report the failure here instead; whoever cares (a health
//! check, a test, an operator thread) drains the channel.

use super::error::RouterError;
use super::level::Level;
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default capacity of an error channel
pub const DEFAULT_ERROR_CAPACITY: usize = 1024;

static GLOBAL_ERRORS: Lazy<ErrorChannel> = Lazy::new(ErrorChannel::default);

/// A record lost by one handler
#[derive(Debug)]
pub struct SinkFailure {
    pub handler: String,
    pub logger: String,
    pub level: Level,
    pub error: RouterError,
    pub at: DateTime<Utc>,
}

impl fmt::Display for SinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "handler '{}' lost a {} record from '{}': {}",
            self.handler, self.level, self.logger, self.error
        )
    }
}

/// Bounded, cloneable channel of [`SinkFailure`] reports
///
/// `report` never blocks. When the channel is full the failure is printed to
/// stderr and counted as an overflow instead.
#[derive(Debug, Clone)]
pub struct ErrorChannel {
    sender: Sender<SinkFailure>,
    receiver: Receiver<SinkFailure>,
    overflow: Arc<AtomicU64>,
}

impl ErrorChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            overflow: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The process-wide channel used by handlers that were not given one
    pub fn global() -> &'static ErrorChannel {
        &GLOBAL_ERRORS
    }

    pub fn report(&self, failure: SinkFailure) {
        match self.sender.try_send(failure) {
            Ok(()) => {}
            Err(TrySendError::Full(failure)) | Err(TrySendError::Disconnected(failure)) => {
                self.overflow.fetch_add(1, Ordering::Relaxed);
                eprintln!("[LOG ROUTER ERROR] {}", failure);
            }
        }
    }

    pub fn try_recv(&self) -> Option<SinkFailure> {
        self.receiver.try_recv().ok()
    }

    /// Take every pending report
    pub fn drain(&self) -> Vec<SinkFailure> {
        self.receiver.try_iter().collect()
    }

    /// Direct access for callers that want to block or `select!` on reports
    pub fn receiver(&self) -> &Receiver<SinkFailure> {
        &self.receiver
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Reports that did not fit and went to stderr instead
    pub fn overflow_count(&self) -> u64 {
        self.overflow.load(Ordering::Relaxed)
    }
}

impl Default for ErrorChannel {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_CAPACITY)
    }
}

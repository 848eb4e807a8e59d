//! In-memory sink capturing formatted lines

use crate::core::{Result, RouterError, Sink};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Shared {
    lines: Mutex<Vec<String>>,
    failing: AtomicBool,
    closed: AtomicBool,
    writes: AtomicU64,
    flushes: AtomicU64,
}

/// Sink keeping every line in memory
///
/// The sink itself moves into a handler; keep a [`MemoryBuffer`] from
/// [`MemorySink::buffer`] to read what was written. The buffer can also make
/// the sink fail, which simulates an unavailable destination.
///
/// # Example
///
/// ```
/// use log_router::{MemorySink, Sink};
///
/// let mut sink = MemorySink::new();
/// let buffer = sink.buffer();
/// sink.write("hello").unwrap();
/// assert_eq!(buffer.lines(), vec!["hello".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    shared: Arc<Shared>,
}

/// Read side of a [`MemorySink`]
#[derive(Debug, Clone)]
pub struct MemoryBuffer {
    shared: Arc<Shared>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> MemoryBuffer {
        MemoryBuffer {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl MemoryBuffer {
    pub fn lines(&self) -> Vec<String> {
        self.shared.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.shared.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.shared.lines.lock().clear();
    }

    /// Make subsequent writes fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.shared.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of write attempts, including failed ones
    pub fn write_count(&self) -> u64 {
        self.shared.writes.load(Ordering::SeqCst)
    }

    pub fn flush_count(&self) -> u64 {
        self.shared.flushes.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

impl Sink for MemorySink {
    fn write(&mut self, text: &str) -> Result<()> {
        self.shared.writes.fetch_add(1, Ordering::SeqCst);
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(RouterError::SinkClosed("memory".to_string()));
        }
        if self.shared.failing.load(Ordering::SeqCst) {
            return Err(RouterError::io_operation(
                "writing to memory sink",
                "destination unavailable",
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink marked as failing"),
            ));
        }
        self.shared.lines.lock().push(text.to_string());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.shared.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush()?;
        self.shared.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

//! Sink trait for log output destinations

use super::error::Result;

/// Opaque write target for formatted log text
///
/// A sink receives one fully formatted record per `write` call. The owning
/// handler serialises calls, so implementations need no locking of their own
/// for in-process callers.
pub trait Sink: Send {
    fn write(&mut self, text: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;

    /// Flush and release the destination. Later writes must fail.
    fn close(&mut self) -> Result<()> {
        self.flush()
    }

    fn name(&self) -> &str;
}

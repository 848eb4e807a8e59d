//! Sink implementations

pub mod console;
#[cfg(feature = "file")]
pub mod file;
pub mod memory;

pub use console::{ConsoleSink, ConsoleStream};
#[cfg(feature = "file")]
pub use file::FileSink;
pub use memory::{MemoryBuffer, MemorySink};

pub use crate::core::Sink;

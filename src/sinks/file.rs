//! File sink implementation

use crate::core::{Result, RouterError, Sink};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends one line per record to a file
///
/// Output goes through a `BufWriter`; the owning handler flushes after every
/// record unless auto-flush is turned off. Each write takes an exclusive
/// advisory lock on the file and flushes before releasing it, so several
/// processes can append to the same file without interleaving lines.
/// `with_locking(false)` turns that off for files with a single writer.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    name: String,
    writer: Option<BufWriter<File>>,
    locking: bool,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(path.into(), true)
    }

    /// Open the file truncating any previous content
    pub fn truncate(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(path.into(), false)
    }

    fn open(path: PathBuf, append: bool) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.open(&path).map_err(|e| {
            RouterError::io_operation(
                "opening log file",
                format!("cannot open '{}'", path.display()),
                e,
            )
        })?;

        Ok(Self {
            name: format!("file:{}", path.display()),
            path,
            writer: Some(BufWriter::new(file)),
            locking: true,
        })
    }

    #[must_use]
    pub fn with_locking(mut self, locking: bool) -> Self {
        self.locking = locking;
        self
    }

    pub fn is_locking(&self) -> bool {
        self.locking
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>> {
        let name = &self.name;
        self.writer
            .as_mut()
            .ok_or_else(|| RouterError::SinkClosed(name.clone()))
    }

    fn write_locked(writer: &mut BufWriter<File>, line: &[u8]) -> std::io::Result<()> {
        writer.get_ref().lock_exclusive()?;
        let result = writer.write_all(line).and_then(|_| writer.flush());
        let unlocked = writer.get_ref().unlock();
        result.and(unlocked)
    }
}

impl Sink for FileSink {
    fn write(&mut self, text: &str) -> Result<()> {
        let locking = self.locking;
        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');

        let writer = self.writer()?;
        if locking {
            Self::write_locked(writer, line.as_bytes())?;
        } else {
            writer.write_all(line.as_bytes())?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}

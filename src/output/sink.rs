//! Append-only line sinks for extracted records

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Destination for newline-terminated record lines
pub trait RecordSink {
    /// Appends one complete line (including its trailing newline)
    ///
    /// The line must be flushed before this returns.
    fn append_line(&mut self, line: &[u8]) -> io::Result<()>;

    /// Discards everything after the first `lines` complete lines
    ///
    /// A trailing partial line is always discarded. Returns the number of
    /// complete lines kept, which is smaller than `lines` if the sink holds fewer.
    fn rewind_to(&mut self, lines: u64) -> io::Result<u64>;
}

/// A record file opened for appending, synced after every line
#[derive(Debug)]
pub struct FileSink {
    file: File,
    path: PathBuf,
}

impl FileSink {
    /// Opens (creating if needed) a record file for appending
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }
}

impl RecordSink for FileSink {
    fn append_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.file.write_all(line)?;
        self.file.flush()?;
        self.file.sync_data()
    }

    fn rewind_to(&mut self, lines: u64) -> io::Result<u64> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut line = Vec::new();
        let mut kept = 0u64;
        let mut offset = 0u64;

        while kept < lines {
            line.clear();
            let read = reader.read_until(b'\n', &mut line)?;
            if read == 0 || line.last() != Some(&b'\n') {
                break;
            }
            kept += 1;
            offset += read as u64;
        }

        if self.file.metadata()?.len() > offset {
            self.file.set_len(offset)?;
            self.file.sync_data()?;
        }

        Ok(kept)
    }
}

/// Shared in-memory sink, cloned handles see the same buffer
///
/// Optionally fails every append after a fixed number of lines, to exercise
/// write-failure handling.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
    fail_after: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that accepts `lines` appends and rejects the rest
    pub fn failing_after(lines: usize) -> Self {
        Self {
            buffer: Arc::default(),
            fail_after: Some(lines),
        }
    }

    /// Returns the complete lines written so far, without newlines
    pub fn lines(&self) -> Vec<String> {
        let buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buffer)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Returns the raw buffer contents
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn line_count(buffer: &[u8]) -> usize {
        buffer.iter().filter(|b| **b == b'\n').count()
    }
}

impl RecordSink for MemorySink {
    fn append_line(&mut self, line: &[u8]) -> io::Result<()> {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(limit) = self.fail_after {
            if Self::line_count(&buffer) >= limit {
                return Err(io::Error::new(io::ErrorKind::Other, "sink is full"));
            }
        }
        buffer.extend_from_slice(line);
        Ok(())
    }

    fn rewind_to(&mut self, lines: u64) -> io::Result<u64> {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        let mut kept = 0u64;
        let mut offset = 0usize;

        for (i, byte) in buffer.iter().enumerate() {
            if kept == lines {
                break;
            }
            if *byte == b'\n' {
                kept += 1;
                offset = i + 1;
            }
        }

        buffer.truncate(offset);
        Ok(kept)
    }
}

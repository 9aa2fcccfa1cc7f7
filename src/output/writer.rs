//! JSON-lines record writer

use crate::extract::Record;
use crate::output::sink::RecordSink;
use thiserror::Error;

/// Errors that end a crawl while writing records
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to append record: {0}")]
    Io(#[from] std::io::Error),
}

/// Serializes records as one JSON object per line
///
/// Every successful [`write`](RecordWriter::write) has reached the sink as a
/// complete line before it returns, so the output is valid up to its last
/// line even if the process dies.
#[derive(Debug)]
pub struct RecordWriter<S: RecordSink> {
    sink: S,
}

impl<S: RecordSink> RecordWriter<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Appends one record as a JSON line
    pub fn write(&mut self, record: &Record) -> Result<(), WriteError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.sink.append_line(&line)?;
        Ok(())
    }

    /// Drops a trailing partial line and returns the number of complete lines
    ///
    /// Used before a new crawl appends to output that may already hold lines.
    pub fn settle(&mut self) -> Result<u64, WriteError> {
        Ok(self.sink.rewind_to(u64::MAX)?)
    }

    /// Truncates the sink to the record lines a checkpoint accounts for
    pub fn rewind_to(&mut self, records: u64) -> Result<u64, WriteError> {
        let kept = self.sink.rewind_to(records)?;
        if kept < records {
            tracing::warn!(
                expected = records,
                found = kept,
                "Output holds fewer records than the checkpoint recorded"
            );
        }
        Ok(kept)
    }
}

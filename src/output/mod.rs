//! Output module for record streams and crawl summaries
//!
//! This module handles:
//! - Appending records as durable JSON lines
//! - Rewinding the output to a checkpointed record count
//! - Printing run and checkpoint summaries

mod sink;
mod summary;
mod writer;

pub use sink::{FileSink, MemorySink, RecordSink};
pub use summary::{format_checkpoint, format_report, print_checkpoint, print_report};
pub use writer::{RecordWriter, WriteError};

use std::io::Write;

use crate::error::SinkError;

/// Accepts one integer per beat.
///
/// `emit` is synchronous and runs on the heartbeat's task. A writer that
/// blocks (for example a full stdout pipe) holds up the beat, and a
/// cancellation requested meanwhile takes effect as soon as `emit` returns.
pub trait IntegerSink {
    /// Delivers `value`; on `Ok` the value is visible to readers, not
    /// buffered.
    fn emit(&mut self, value: i64) -> Result<(), SinkError>;
}

/// Writes each value as a decimal line and flushes immediately.
#[derive(Debug)]
pub struct LineSink<W> {
    writer: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> IntegerSink for LineSink<W> {
    fn emit(&mut self, value: i64) -> Result<(), SinkError> {
        writeln!(self.writer, "{value}").map_err(SinkError::Write)?;
        self.writer.flush().map_err(SinkError::Flush)
    }
}

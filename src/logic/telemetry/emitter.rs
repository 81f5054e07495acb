//! JSON-lines telemetry emitter
//!
//! Writes one `OutputRecord` per line and flushes after each so a
//! downstream reader sees records as they are produced.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Stdout, Write};
use std::path::Path;

use super::record::OutputRecord;
use crate::logic::pipeline::{OutputSink, SinkError};

pub struct TelemetryEmitter<W: Write> {
    writer: W,
    emitted: u64,
}

impl TelemetryEmitter<BufWriter<File>> {
    /// Append to `path`, creating parent directories as needed
    pub fn create(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        log::info!("Writing telemetry to {}", path.display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl TelemetryEmitter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TelemetryEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, emitted: 0 }
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> OutputSink for TelemetryEmitter<W> {
    fn emit(&mut self, record: &OutputRecord) -> Result<(), SinkError> {
        let line = record.to_json_line()?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.emitted += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

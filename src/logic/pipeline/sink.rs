//! Downstream sinks
//!
//! The pipeline writes every frame to the audit sink and every evaluated
//! frame to the output sink. Both are trait objects so the binary can pick
//! files or stdio and tests can capture or fail on demand.

use thiserror::Error;

use crate::logic::radio::NormalizedFrame;
use crate::logic::telemetry::OutputRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Receives every normalized frame, resolved or not
pub trait AuditSink: Send {
    fn record(&mut self, frame: &NormalizedFrame) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Receives one output record per evaluated frame, in arrival order
pub trait OutputSink: Send {
    fn emit(&mut self, record: &OutputRecord) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

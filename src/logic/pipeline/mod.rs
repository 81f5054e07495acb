//! Pipeline Module - Per-Frame Detection Flow
//!
//! normalize -> resolve device -> evaluate -> audit -> emit, one frame at
//! a time, in arrival order.
//!
//! # Architecture
//! - `source.rs`: `FrameSource` and the queue/replay sources
//! - `sink.rs`: `AuditSink`, `OutputSink`, `SinkError`
//!
//! # Failure Strategy
//! - Audit write failure: reported, frame still evaluated and emitted
//! - Output failure: record kept in a bounded ordered backlog, retried
//!   before the next emission and on `flush()`
//! - Source failure: ends `run()`

pub mod sink;
pub mod source;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::constants::{DEFAULT_IDLE_SLEEP_MS, DEFAULT_MAX_BACKLOG, DEFAULT_MAX_BATCH};
use crate::logic::config::Config;
use crate::logic::detector::{AnomalyDetector, Verdict};
use crate::logic::radio::{normalize, RawFrame};
use crate::logic::registry::DeviceRegistry;
use crate::logic::resolver::{DevAddrResolver, DeviceResolver, NoResolver};
use crate::logic::shutdown::Shutdown;
use crate::logic::telemetry::OutputRecord;

pub use sink::{AuditSink, OutputSink, SinkError};
pub use source::{FeedSource, FrameSource, QueueSource, ReplaySource, SourceError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Audit log write failed: {0}")]
    Audit(#[source] SinkError),

    #[error("Output emission failed, {pending} record(s) pending: {source}")]
    Emit {
        #[source]
        source: SinkError,
        pending: usize,
    },
}

// ============================================================================
// STATISTICS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub frames: u64,
    pub verdicts: u64,
    pub anomalies: u64,
    pub unresolved: u64,
    pub emitted: u64,
    pub emit_failures: u64,
    pub audit_failures: u64,
    /// Backlog records discarded because the backlog was full
    pub dropped: u64,
    /// Frames left unprocessed in the batch interrupted by shutdown
    pub skipped_on_shutdown: u64,
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct DetectionPipeline {
    registry: Arc<DeviceRegistry>,
    detector: AnomalyDetector,
    resolver: Box<dyn DeviceResolver>,
    audit: Option<Box<dyn AuditSink>>,
    output: Box<dyn OutputSink>,
    backlog: VecDeque<OutputRecord>,
    max_backlog: usize,
    max_batch: usize,
    idle_sleep: Duration,
    stats: PipelineStats,
}

impl DetectionPipeline {
    pub fn new(
        registry: Arc<DeviceRegistry>,
        detector: AnomalyDetector,
        output: Box<dyn OutputSink>,
    ) -> Self {
        Self {
            registry,
            detector,
            resolver: Box::new(DevAddrResolver),
            audit: None,
            output,
            backlog: VecDeque::new(),
            max_backlog: DEFAULT_MAX_BACKLOG,
            max_batch: DEFAULT_MAX_BATCH,
            idle_sleep: Duration::from_millis(DEFAULT_IDLE_SLEEP_MS),
            stats: PipelineStats::default(),
        }
    }

    /// Detector, resolver and batching as configured; audit is attached separately
    pub fn from_config(
        config: &Config,
        registry: Arc<DeviceRegistry>,
        output: Box<dyn OutputSink>,
    ) -> Self {
        let detector =
            AnomalyDetector::new(config.tolerance).with_overrides(config.tolerance_overrides.clone());
        let resolver: Box<dyn DeviceResolver> = if config.resolve_dev_addr {
            Box::new(DevAddrResolver)
        } else {
            Box::new(NoResolver)
        };

        Self::new(registry, detector, output)
            .with_resolver(resolver)
            .with_batching(config.max_batch, config.idle_sleep)
            .with_max_backlog(config.max_backlog)
    }

    pub fn with_resolver(mut self, resolver: Box<dyn DeviceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_audit(mut self, audit: Box<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_batching(mut self, max_batch: usize, idle_sleep: Duration) -> Self {
        self.max_batch = max_batch.max(1);
        self.idle_sleep = idle_sleep;
        self
    }

    pub fn with_max_backlog(mut self, max_backlog: usize) -> Self {
        self.max_backlog = max_backlog.max(1);
        self
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Run one raw frame through the whole pipeline.
    ///
    /// The frame is evaluated and emitted even when the audit write fails;
    /// that failure is reported afterwards as `PipelineError::Audit`.
    pub fn process(&mut self, raw: &RawFrame) -> Result<Option<Verdict>, PipelineError> {
        self.stats.frames += 1;

        let frame = normalize(raw);
        let device_id = self.resolver.resolve(&frame);
        let frame = frame.with_device_id(device_id);

        let verdict = self.detector.evaluate(&frame, &self.registry);

        let audit_result = match self.audit.as_mut() {
            Some(audit) => audit.record(&frame),
            None => Ok(()),
        };
        if audit_result.is_err() {
            self.stats.audit_failures += 1;
        }

        match &verdict {
            None => {
                self.stats.unresolved += 1;
                log::trace!("Unresolved frame on {} Hz, audit only", frame.frequency_hz);
            }
            Some(v) => {
                self.stats.verdicts += 1;
                if !v.within_tolerance {
                    self.stats.anomalies += 1;
                }
                self.enqueue(OutputRecord::from_frame(&frame, Some(v)));
                if let Err(source) = self.drain_backlog() {
                    self.stats.emit_failures += 1;
                    return Err(PipelineError::Emit {
                        source,
                        pending: self.backlog.len(),
                    });
                }
            }
        }

        audit_result.map_err(PipelineError::Audit)?;
        Ok(verdict)
    }

    fn enqueue(&mut self, record: OutputRecord) {
        if self.backlog.len() >= self.max_backlog {
            self.backlog.pop_front();
            self.stats.dropped += 1;
            log::warn!(
                "Output backlog full ({} records), dropping the oldest",
                self.max_backlog
            );
        }
        self.backlog.push_back(record);
    }

    /// Emit pending records in order, stopping at the first failure
    fn drain_backlog(&mut self) -> Result<(), SinkError> {
        while let Some(record) = self.backlog.front() {
            self.output.emit(record)?;
            self.backlog.pop_front();
            self.stats.emitted += 1;
        }
        Ok(())
    }

    /// Retry the backlog and flush both sinks
    pub fn flush(&mut self) -> Result<(), PipelineError> {
        self.drain_backlog().map_err(|source| PipelineError::Emit {
            source,
            pending: self.backlog.len(),
        })?;
        self.output.flush().map_err(|source| PipelineError::Emit { source, pending: 0 })?;
        if let Some(audit) = self.audit.as_mut() {
            audit.flush().map_err(PipelineError::Audit)?;
        }
        Ok(())
    }

    /// Drain `source` until it is exhausted or shutdown is requested.
    ///
    /// Per-frame sink errors are logged and processing continues; only a
    /// source failure ends the run early. Pending output is flushed on exit.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        shutdown: &Shutdown,
    ) -> Result<PipelineStats, PipelineError> {
        log::info!(
            "Detection pipeline running (batch {}, idle sleep {:?})",
            self.max_batch,
            self.idle_sleep
        );

        let result = self.run_batches(source, shutdown);

        if let Err(e) = self.flush() {
            log::error!("Final flush failed: {}", e);
        }
        result.map(|_| self.stats.clone())
    }

    fn run_batches(
        &mut self,
        source: &mut dyn FrameSource,
        shutdown: &Shutdown,
    ) -> Result<(), PipelineError> {
        while !shutdown.is_requested() {
            if source.is_exhausted() {
                log::info!("Frame source exhausted");
                return Ok(());
            }

            let batch = source.receive(self.max_batch)?;
            if batch.is_empty() {
                std::thread::sleep(self.idle_sleep);
                continue;
            }

            for (i, raw) in batch.iter().enumerate() {
                if shutdown.is_requested() {
                    let skipped = batch.len() - i;
                    self.stats.skipped_on_shutdown += skipped as u64;
                    log::warn!("Shutdown requested, {} frame(s) of the current batch not processed", skipped);
                    return Ok(());
                }
                match self.process(raw) {
                    Ok(_) => {}
                    Err(PipelineError::Audit(e)) => log::error!("Audit log write failed: {}", e),
                    Err(e) => log::error!("{}", e),
                }
            }
        }
        log::info!("Shutdown requested, pipeline stopped");
        Ok(())
    }
}

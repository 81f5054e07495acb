//! Audit log writer
//!
//! Append-only CSV files, one line per received frame, rotated on age.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::format::{format_line, HEADER};
use crate::logic::gateway::GatewayId;
use crate::logic::pipeline::{AuditSink, SinkError};
use crate::logic::radio::NormalizedFrame;

pub struct AuditLog {
    writer: BufWriter<File>,
    current_file: PathBuf,
    base_dir: PathBuf,
    gateway_id: GatewayId,
    rotate_interval: Option<Duration>,
    opened_at: DateTime<Utc>,
    packets_in_file: u64,
}

impl AuditLog {
    /// Open a log file in `base_dir`; `rotate_interval = None` never rotates
    pub fn new(
        base_dir: PathBuf,
        gateway_id: GatewayId,
        rotate_interval: Option<Duration>,
    ) -> std::io::Result<Self> {
        Self::open_at(base_dir, gateway_id, rotate_interval, Utc::now())
    }

    pub fn open_at(
        base_dir: PathBuf,
        gateway_id: GatewayId,
        rotate_interval: Option<Duration>,
        now: DateTime<Utc>,
    ) -> std::io::Result<Self> {
        std::fs::create_dir_all(&base_dir)?;
        let (current_file, writer) = Self::open_file(&base_dir, gateway_id, now)?;

        Ok(Self {
            writer,
            current_file,
            base_dir,
            gateway_id,
            rotate_interval,
            opened_at: now,
            packets_in_file: 0,
        })
    }

    /// `pktlog_<gateway>_<yyyymmddThhmmssZ>.csv`, appended to if it exists
    fn open_file(
        base_dir: &Path,
        gateway_id: GatewayId,
        now: DateTime<Utc>,
    ) -> std::io::Result<(PathBuf, BufWriter<File>)> {
        let filename = format!("pktlog_{}_{}.csv", gateway_id, now.format("%Y%m%dT%H%M%SZ"));
        let file_path = base_dir.join(filename);

        let file = OpenOptions::new().create(true).append(true).open(&file_path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = BufWriter::new(file);
        if is_empty {
            writeln!(writer, "{}", HEADER)?;
            writer.flush()?;
        }

        log::info!("Now writing to audit log {}", file_path.display());
        Ok((file_path, writer))
    }

    /// Write one frame, rotating first if the current file is too old
    pub fn record_at(&mut self, frame: &NormalizedFrame, now: DateTime<Utc>) -> std::io::Result<()> {
        if self.rotation_due(now) {
            self.rotate(now)?;
        }

        writeln!(self.writer, "{}", format_line(self.gateway_id, frame))?;
        self.writer.flush()?;
        self.packets_in_file += 1;
        Ok(())
    }

    fn rotation_due(&self, now: DateTime<Utc>) -> bool {
        match self.rotate_interval {
            Some(interval) => (now - self.opened_at)
                .to_std()
                .map(|age| age > interval)
                .unwrap_or(false),
            None => false,
        }
    }

    fn rotate(&mut self, now: DateTime<Utc>) -> std::io::Result<()> {
        self.writer.flush()?;
        log::info!(
            "Audit log {} closed, {} packet(s) recorded",
            self.current_file.display(),
            self.packets_in_file
        );

        let (path, writer) = Self::open_file(&self.base_dir, self.gateway_id, now)?;
        self.writer = writer;
        self.current_file = path;
        self.opened_at = now;
        self.packets_in_file = 0;
        Ok(())
    }

    pub fn current_file(&self) -> &Path {
        &self.current_file
    }

    pub fn packets_in_file(&self) -> u64 {
        self.packets_in_file
    }
}

impl AuditSink for AuditLog {
    fn record(&mut self, frame: &NormalizedFrame) -> Result<(), SinkError> {
        self.record_at(frame, Utc::now())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for AuditLog {
    fn drop(&mut self) {
        let _ = self.writer.flush();
        log::debug!(
            "Audit log {} closed, {} packet(s) recorded",
            self.current_file.display(),
            self.packets_in_file
        );
    }
}

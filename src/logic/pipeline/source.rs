//! Frame sources
//!
//! The concentrator itself lives outside this crate. Frames reach the
//! pipeline through `FrameSource`, fetched in batches the way the gateway
//! HAL hands them over.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};

use thiserror::Error;

use crate::logic::radio::RawFrame;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Frame source I/O error: {0}")]
    Io(#[from] io::Error),
}

pub trait FrameSource {
    /// Fetch up to `max` frames; an empty batch means nothing is pending
    fn receive(&mut self, max: usize) -> Result<Vec<RawFrame>, SourceError>;

    /// True once no further frame will ever arrive
    fn is_exhausted(&self) -> bool {
        false
    }
}

// ============================================================================
// IN-MEMORY QUEUE
// ============================================================================

/// Frames pushed by the caller, drained in FIFO order
#[derive(Debug, Default)]
pub struct QueueSource {
    frames: VecDeque<RawFrame>,
    closed: bool,
}

impl QueueSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: RawFrame) {
        self.frames.push_back(frame);
    }

    /// No more pushes; the source reports exhaustion once drained
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn pending(&self) -> usize {
        self.frames.len()
    }
}

impl FromIterator<RawFrame> for QueueSource {
    fn from_iter<I: IntoIterator<Item = RawFrame>>(iter: I) -> Self {
        Self {
            frames: iter.into_iter().collect(),
            closed: true,
        }
    }
}

impl FrameSource for QueueSource {
    fn receive(&mut self, max: usize) -> Result<Vec<RawFrame>, SourceError> {
        let n = max.min(self.frames.len());
        Ok(self.frames.drain(..n).collect())
    }

    fn is_exhausted(&self) -> bool {
        self.closed && self.frames.is_empty()
    }
}

// ============================================================================
// JSON-LINES DECODING
// ============================================================================

/// Line bookkeeping shared by the JSON-lines sources.
///
/// Lines are handled as bytes: invalid UTF-8 is just another malformed
/// line, logged and skipped like broken JSON.
#[derive(Debug, Default)]
struct LineDecoder {
    line_no: u64,
    skipped: u64,
}

impl LineDecoder {
    fn decode(&mut self, line: &[u8]) -> Option<RawFrame> {
        self.line_no += 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        match serde_json::from_slice::<RawFrame>(line) {
            Ok(frame) => Some(frame),
            Err(e) => {
                self.skipped += 1;
                log::warn!("Skipping malformed frame on line {}: {}", self.line_no, e);
                None
            }
        }
    }
}

// ============================================================================
// JSON-LINES REPLAY
// ============================================================================

/// Raw frames recorded as one JSON object per line, read in the caller's
/// thread. Meant for files, where a read never waits on a producer.
///
/// Blank lines are ignored; malformed lines are logged and skipped.
pub struct ReplaySource<R: BufRead> {
    reader: R,
    decoder: LineDecoder,
    buf: Vec<u8>,
    /// Read error held back until the frames before it are handed over
    pending_error: Option<io::Error>,
    eof: bool,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        log::info!("Replaying frames from {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            decoder: LineDecoder::default(),
            buf: Vec::new(),
            pending_error: None,
            eof: false,
        }
    }

    /// Lines dropped because they did not parse
    pub fn skipped(&self) -> u64 {
        self.decoder.skipped
    }
}

impl<R: BufRead> FrameSource for ReplaySource<R> {
    fn receive(&mut self, max: usize) -> Result<Vec<RawFrame>, SourceError> {
        if let Some(e) = self.pending_error.take() {
            self.eof = true;
            return Err(e.into());
        }

        let mut batch = Vec::with_capacity(max);
        while batch.len() < max && !self.eof {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.eof = true,
                Ok(_) => batch.extend(self.decoder.decode(&self.buf)),
                Err(e) if batch.is_empty() => {
                    self.eof = true;
                    return Err(e.into());
                }
                Err(e) => {
                    self.pending_error = Some(e);
                    break;
                }
            }
        }

        Ok(batch)
    }

    fn is_exhausted(&self) -> bool {
        self.eof && self.pending_error.is_none()
    }
}

// ============================================================================
// LIVE FEED
// ============================================================================

/// JSON-lines frames from a stream that may stay silent for a long time
/// (stdin fed by a concentrator bridge).
///
/// A reader thread pushes lines into a bounded channel; `receive` only
/// drains what has already arrived and never blocks, so the pipeline keeps
/// checking for shutdown while the feed is idle.
pub struct FeedSource {
    lines: Receiver<io::Result<Vec<u8>>>,
    decoder: LineDecoder,
    disconnected: bool,
}

impl FeedSource {
    /// Start the reader thread over `reader`
    pub fn spawn<R>(reader: R, capacity: usize) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        std::thread::Builder::new()
            .name("frame-feed".into())
            .spawn(move || read_lines(reader, tx))?;

        Ok(Self {
            lines: rx,
            decoder: LineDecoder::default(),
            disconnected: false,
        })
    }

    pub fn stdin(capacity: usize) -> io::Result<Self> {
        log::info!("Reading frames from stdin");
        Self::spawn(BufReader::new(io::stdin()), capacity)
    }

    /// Lines dropped because they did not parse
    pub fn skipped(&self) -> u64 {
        self.decoder.skipped
    }
}

fn read_lines<R: BufRead>(mut reader: R, tx: SyncSender<io::Result<Vec<u8>>>) {
    loop {
        let mut line = Vec::new();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => return,
            Ok(_) => {
                if tx.send(Ok(line)).is_err() {
                    return;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        }
    }
}

impl FrameSource for FeedSource {
    fn receive(&mut self, max: usize) -> Result<Vec<RawFrame>, SourceError> {
        let mut batch = Vec::with_capacity(max);
        while batch.len() < max {
            match self.lines.try_recv() {
                Ok(Ok(line)) => batch.extend(self.decoder.decode(&line)),
                // Nothing follows an error: the reader thread has stopped
                Ok(Err(e)) if batch.is_empty() => {
                    self.disconnected = true;
                    return Err(e.into());
                }
                Ok(Err(e)) => {
                    log::error!("Frame feed failed after {} line(s): {}", self.decoder.line_no, e);
                    self.disconnected = true;
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            }
        }
        Ok(batch)
    }

    fn is_exhausted(&self) -> bool {
        self.disconnected
    }
}

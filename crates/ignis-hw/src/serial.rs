//! Line-oriented serial hardware link.
//!
//! Wire protocol (ASCII lines, bit-exact with the embedded controller):
//! - inbound telemetry: `SENSOR:<name>:<float_value>\n`; any
//!   `<kind>:<name>:<float_value>` triple is accepted with the kind
//!   preserved, and a malformed numeric payload is logged and the line
//!   discarded (non-fatal)
//! - outbound command: `CMD:<command>:<value>\n`, or `CMD:<command>\n`
//!   when the command carries no value
//!
//! The link is generic over a [`SerialTransport`] so the same code runs
//! against a real port or an in-memory pipe in tests. Resource failures
//! (open, write) are logged and reported as `bool` returns; they never
//! panic and never poison the link.

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Capacity of the inbound frame queue.
const FRAME_QUEUE_CAPACITY: usize = 100;

/// Bounded wait for the reader thread on disconnect.
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Back-off after a transport read error.
const READ_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// One parsed inbound telemetry line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub timestamp: DateTime<Utc>,
    /// Line kind, e.g. `SENSOR`.
    pub kind: String,
    /// Channel name, e.g. `chamber_pressure`.
    pub name: String,
    pub value: f64,
}

/// Parse one inbound line into a frame.
///
/// Lines with fewer than three `:`-separated fields are ignored; extra
/// fields beyond the third are ignored too (the value is always the third
/// field). A third field that does not parse as a float is logged at
/// `warn` and the line discarded.
pub fn parse_telemetry_line(line: &str) -> Option<TelemetryFrame> {
    let parts: Vec<&str> = line.split(':').collect();
    if parts.len() < 3 {
        return None;
    }

    let value: f64 = match parts[2].parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(line, "invalid value received");
            return None;
        }
    };

    Some(TelemetryFrame {
        timestamp: Utc::now(),
        kind: parts[0].to_string(),
        name: parts[1].to_string(),
        value,
    })
}

/// Encode one outbound command line, newline included.
pub fn encode_command(command: &str, value: Option<f64>) -> String {
    match value {
        Some(value) => format!("CMD:{command}:{value}\n"),
        None => format!("CMD:{command}\n"),
    }
}

/// Transport the link runs over: opened into an owned reader half for the
/// read thread and a writer half for command sends.
pub trait SerialTransport {
    type Reader: Read + Send + 'static;
    type Writer: Write;

    fn open(&mut self) -> std::io::Result<(Self::Reader, Self::Writer)>;
}

/// Serial hardware link: a background reader thread feeding a bounded
/// lossy frame queue, plus synchronous command writes.
pub struct SerialLink<T: SerialTransport> {
    transport: T,
    writer: Option<T::Writer>,
    frames_tx: Sender<TelemetryFrame>,
    frames_rx: Receiver<TelemetryFrame>,
    stop: Arc<AtomicBool>,
    read_thread: Option<JoinHandle<()>>,
}

impl<T: SerialTransport> SerialLink<T> {
    pub fn new(transport: T) -> Self {
        let (frames_tx, frames_rx) = bounded(FRAME_QUEUE_CAPACITY);
        Self {
            transport,
            writer: None,
            frames_tx,
            frames_rx,
            stop: Arc::new(AtomicBool::new(false)),
            read_thread: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.writer.is_some()
    }

    /// Open the transport and start the reader thread. Open failures are
    /// logged and reported as `false`; connecting twice is a no-op `true`.
    pub fn connect(&mut self) -> bool {
        if self.is_connected() {
            return true;
        }

        let (reader, writer) = match self.transport.open() {
            Ok(halves) => halves,
            Err(e) => {
                error!(error = %e, "failed to connect to hardware");
                return false;
            }
        };

        self.stop.store(false, Ordering::Release);
        let stop = Arc::clone(&self.stop);
        let tx = self.frames_tx.clone();

        match thread::Builder::new()
            .name("ignis-serial-read".to_string())
            .spawn(move || read_loop(reader, tx, stop))
        {
            Ok(handle) => {
                self.read_thread = Some(handle);
                self.writer = Some(writer);
                info!("connected to hardware");
                true
            }
            Err(e) => {
                error!(error = %e, "failed to spawn serial read thread");
                false
            }
        }
    }

    /// Stop the reader thread and drop the writer half. The join waits at
    /// most [`JOIN_TIMEOUT`]; a reader stuck in a blocking read is
    /// detached rather than waited on forever.
    pub fn disconnect(&mut self) -> bool {
        if !self.is_connected() {
            return true;
        }

        self.stop.store(true, Ordering::Release);

        if let Some(handle) = self.read_thread.take() {
            let deadline = Instant::now() + JOIN_TIMEOUT;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                warn!("serial read thread did not exit within {JOIN_TIMEOUT:?}; detaching");
            }
        }

        self.writer = None;
        info!("disconnected from hardware");
        true
    }

    /// Write one command line. Returns `false` (logged) when disconnected
    /// or on a write failure.
    pub fn send_command(&mut self, command: &str, value: Option<f64>) -> bool {
        let Some(writer) = self.writer.as_mut() else {
            error!("not connected to hardware");
            return false;
        };

        let line = encode_command(command, value);
        match writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.flush())
        {
            Ok(()) => {
                debug!(command = line.trim_end(), "sent command");
                true
            }
            Err(e) => {
                error!(error = %e, "failed to send command");
                false
            }
        }
    }

    /// Pop the oldest queued frame, if any. Never blocks.
    pub fn get_latest_data(&self) -> Option<TelemetryFrame> {
        self.frames_rx.try_recv().ok()
    }
}

impl<T: SerialTransport> Drop for SerialLink<T> {
    fn drop(&mut self) {
        if self.is_connected() {
            self.disconnect();
        }
    }
}

/// Reader thread body: parse lines into frames until EOF, a stop request,
/// or the link handle goes away.
fn read_loop<R: Read>(reader: R, tx: Sender<TelemetryFrame>, stop: Arc<AtomicBool>) {
    let mut lines = BufReader::new(reader).lines();

    loop {
        if stop.load(Ordering::Acquire) {
            break;
        }

        match lines.next() {
            Some(Ok(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Some(frame) = parse_telemetry_line(line) {
                    if let Err(TrySendError::Full(_)) = tx.try_send(frame) {
                        // Queue full: stale telemetry is dropped silently
                    }
                }
            }
            Some(Err(e)) => {
                error!(error = %e, "error reading from serial");
                thread::sleep(READ_ERROR_BACKOFF);
            }
            None => break, // EOF: transport closed
        }
    }
}

//! Integration tests: serial link over an in-memory transport.

use ignis_hw::{SerialLink, SerialTransport};
use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Writer half backed by a shared byte buffer the test can inspect.
#[derive(Clone)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// In-memory transport: canned inbound bytes, captured outbound bytes.
struct MemTransport {
    input: Option<Cursor<Vec<u8>>>,
    output: SharedBuf,
}

impl MemTransport {
    fn new(input: &str) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                input: Some(Cursor::new(input.as_bytes().to_vec())),
                output: SharedBuf(Arc::clone(&buffer)),
            },
            buffer,
        )
    }
}

impl SerialTransport for MemTransport {
    type Reader = Cursor<Vec<u8>>;
    type Writer = SharedBuf;

    fn open(&mut self) -> io::Result<(Self::Reader, Self::Writer)> {
        let reader = self
            .input
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::AddrInUse, "already opened"))?;
        Ok((reader, self.output.clone()))
    }
}

/// Transport whose open always fails.
struct BrokenTransport;

impl SerialTransport for BrokenTransport {
    type Reader = Cursor<Vec<u8>>;
    type Writer = SharedBuf;

    fn open(&mut self) -> io::Result<(Self::Reader, Self::Writer)> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no such port"))
    }
}

fn collect_frames<T: SerialTransport>(
    link: &SerialLink<T>,
    expected: usize,
    timeout: Duration,
) -> Vec<ignis_hw::TelemetryFrame> {
    let deadline = Instant::now() + timeout;
    let mut frames = Vec::new();
    while frames.len() < expected && Instant::now() < deadline {
        match link.get_latest_data() {
            Some(frame) => frames.push(frame),
            None => std::thread::sleep(Duration::from_millis(5)),
        }
    }
    frames
}

#[test]
fn inbound_telemetry_is_parsed_and_malformed_lines_dropped() {
    let (transport, _outbound) = MemTransport::new(
        "SENSOR:chamber_pressure:2500000\n\
         SENSOR:thrust:not_a_number\n\
         noise\n\
         STATUS:igniter:1\n",
    );
    let mut link = SerialLink::new(transport);
    assert!(link.connect());

    let frames = collect_frames(&link, 2, Duration::from_secs(2));
    assert_eq!(frames.len(), 2, "malformed lines must be discarded");

    assert_eq!(frames[0].kind, "SENSOR");
    assert_eq!(frames[0].name, "chamber_pressure");
    assert_eq!(frames[0].value, 2_500_000.0);

    assert_eq!(frames[1].kind, "STATUS");
    assert_eq!(frames[1].name, "igniter");
    assert_eq!(frames[1].value, 1.0);

    assert!(link.disconnect());
    assert!(!link.is_connected());
}

#[test]
fn commands_hit_the_wire_in_protocol_format() {
    let (transport, outbound) = MemTransport::new("");
    let mut link = SerialLink::new(transport);
    assert!(link.connect());

    assert!(link.send_command("set_fuel_valve", Some(0.5)));
    assert!(link.send_command("abort", None));

    let written = String::from_utf8(outbound.lock().unwrap().clone()).unwrap();
    assert_eq!(written, "CMD:set_fuel_valve:0.5\nCMD:abort\n");

    assert!(link.disconnect());
}

#[test]
fn failed_open_is_reported_not_thrown() {
    let mut link = SerialLink::new(BrokenTransport);
    assert!(!link.connect());
    assert!(!link.is_connected());

    // Sending while disconnected is a logged failure, not a panic
    assert!(!link.send_command("abort", None));
}

#[test]
fn disconnect_when_not_connected_is_a_noop_success() {
    let mut link = SerialLink::new(BrokenTransport);
    assert!(link.disconnect());
}

#[test]
fn connect_twice_is_idempotent() {
    let (transport, _outbound) = MemTransport::new("SENSOR:thrust:1\n");
    let mut link = SerialLink::new(transport);
    assert!(link.connect());
    assert!(link.connect());
    assert!(link.disconnect());
}

//! Shared test utilities for serial_stream tests.
//!
//! This module provides:
//! - Loopback port builders
//! - Bounded read helpers that never hang a test run
//! - Timing assertions

#![allow(dead_code)]

use serial_stream::port::{LoopbackPort, PortBackend, PortConfig, PortError, SerialPortAdapter};
use std::time::{Duration, Instant};

/// Upper bound on how long any blocking helper may take.
pub const TEST_BUDGET: Duration = Duration::from_secs(5);

/// Open a self-looped port with default framing.
pub fn loopback(name: &str) -> LoopbackPort {
    LoopbackPort::open(PortConfig::new(name, 9600)).expect("loopback port should open")
}

/// Open a null-modem pair with default framing.
pub fn null_modem() -> (LoopbackPort, LoopbackPort) {
    LoopbackPort::pair(PortConfig::new("left", 115200), PortConfig::new("right", 115200))
        .expect("loopback pair should open")
}

/// Read until exactly `count` bytes have arrived.
///
/// Reads may return fewer bytes than asked for, so this keeps reading under
/// a short read deadline until the count is met or `budget` has passed.
pub fn read_exactly<P: SerialPortAdapter + ?Sized>(
    port: &P,
    count: usize,
    budget: Duration,
) -> Result<Vec<u8>, PortError> {
    let started = Instant::now();
    let mut collected = Vec::with_capacity(count);
    let mut buffer = [0u8; 256];

    port.set_read_deadline(Duration::from_millis(100))?;
    while collected.len() < count {
        if started.elapsed() > budget {
            return Err(PortError::DeadlineExceeded(budget));
        }
        let want = (count - collected.len()).min(buffer.len());
        match port.read_bytes(&mut buffer[..want]) {
            Ok(n) => collected.extend_from_slice(&buffer[..n]),
            Err(e) if e.is_deadline_exceeded() => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(collected)
}

/// Deterministic payload of `len` bytes.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Assert that duration is within expected range.
pub fn assert_duration_within(
    actual: Duration,
    expected: Duration,
    tolerance: Duration,
    message: &str,
) {
    let lower = expected.saturating_sub(tolerance);
    let upper = expected + tolerance;

    assert!(
        actual >= lower && actual <= upper,
        "{}: expected {:?} ± {:?}, got {:?}",
        message,
        expected,
        tolerance,
        actual
    );
}

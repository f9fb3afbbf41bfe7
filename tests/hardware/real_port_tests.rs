//! Tests requiring actual serial hardware.
//!
//! These tests are skipped if no hardware is available.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! # Set environment variables
//! export TEST_PORT=COM3                  # or /dev/ttyUSB0 on Linux
//! export TEST_BAUD=9600                  # optional, default: 9600
//! export TEST_LOOPBACK=1                 # if port has TX-RX loopback
//!
//! # Run tests
//! cargo test --features hardware-tests -- --ignored
//! ```
//!
//! # Hardware Requirements
//!
//! - **Real port tests**: Any available serial port
//! - **Loopback tests**: Port with TX and RX connected together

use super::utils::{PortTestFixture, TestPortConfig, TimingHelper};
use crate::common::{pattern, read_exactly};
use serial_stream::port::{
    open_port, Parity, PortConfig, PortError, SerialPortAdapter, StopBits, POLL_INTERVAL,
};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
#[ignore] // Run with --ignored flag
fn test_real_port_open_close() {
    let fixture = crate::skip_without_hardware!();
    println!("Testing port: {}", fixture.port_name());

    assert_eq!(fixture.port().name(), fixture.port_name());
    fixture.port().close().expect("close failed");
    fixture.port().close().expect("second close should be a no-op");

    let mut buffer = [0u8; 8];
    assert!(matches!(
        fixture.port().read_bytes(&mut buffer),
        Err(PortError::Closed)
    ));

    println!("✅ Port open/close test passed");
}

#[test]
#[ignore]
fn test_real_port_loopback_communication() {
    let fixture = crate::skip_without_loopback!();
    let port = fixture.port();

    let test_data = b"LOOPBACK TEST\r\n";
    let written = port.write_bytes(test_data).expect("Failed to write to port");
    assert_eq!(written, test_data.len());
    println!("✅ Wrote {} bytes", written);

    let received = read_exactly(port, test_data.len(), fixture.timeout())
        .expect("Failed to read from port");
    assert_eq!(
        &received[..],
        test_data,
        "Loopback data should match written data"
    );

    println!("✅ Loopback test passed");
}

#[test]
#[ignore]
fn test_real_port_concurrent_loopback() {
    let fixture = crate::skip_without_loopback!();
    let port = fixture.port();
    let payload = pattern(2048);

    let timer = TimingHelper::new("concurrent loopback");
    thread::scope(|s| {
        let reader = s.spawn(|| read_exactly(port, payload.len(), Duration::from_secs(10)));
        for chunk in payload.chunks(64) {
            port.write_bytes(chunk).expect("write failed");
        }
        let received = reader.join().unwrap().expect("read failed");
        assert!(received == payload, "loopback payload corrupted");
    });
    timer.finish();
}

#[test]
#[ignore]
fn test_real_port_deadline_behavior() {
    let fixture = crate::skip_without_hardware!();
    let port = fixture.port();

    let deadline = Duration::from_millis(100);
    port.set_read_deadline(deadline).expect("set deadline failed");

    let mut buffer = [0u8; 100];
    let start = Instant::now();
    let result = port.read_bytes(&mut buffer);
    let elapsed = start.elapsed();

    println!("   Read result: {:?}", result);
    println!("   Elapsed time: {:?}", elapsed);

    assert!(matches!(result, Err(PortError::DeadlineExceeded(_))));
    assert!(elapsed >= deadline);
    assert!(
        elapsed < Duration::from_millis(500),
        "Deadline took too long: {:?}",
        elapsed
    );

    // The port must still be usable.
    port.clear_buffers().expect("port unusable after deadline");
    println!("✅ Deadline test passed");
}

#[test]
#[ignore]
fn test_real_port_close_unblocks_reader() {
    let fixture = crate::skip_without_hardware!();
    let port = fixture.port();
    let (done_tx, done_rx) = mpsc::channel();

    thread::scope(|s| {
        s.spawn(|| {
            let mut buffer = [0u8; 16];
            done_tx.send(port.read_bytes(&mut buffer)).unwrap();
        });

        thread::sleep(Duration::from_millis(200));
        port.close().expect("close failed");

        let result = done_rx
            .recv_timeout(POLL_INTERVAL * 20)
            .expect("reader still blocked after close");
        assert!(matches!(result, Err(PortError::Closed)));
    });
}

#[test]
#[ignore]
fn test_real_port_control_lines() {
    let fixture = crate::skip_without_hardware!();
    let port = fixture.port();

    port.set_dtr(true).expect("DTR on");
    port.set_rts(true).expect("RTS on");
    let status = port.status().expect("status failed");
    println!("   Line status: {:#05x}", status.bits());
    port.set_dtr(false).expect("DTR off");
    port.set_rts(false).expect("RTS off");

    println!("✅ Control line test passed");
}

#[test]
#[ignore]
fn test_real_port_set_parity() {
    let fixture = crate::skip_without_hardware!();
    let port = fixture.port();

    port.set_parity(Parity::Even).expect("even parity");
    assert_eq!(port.config().parity(), Parity::Even);
    assert!(matches!(
        port.set_parity(Parity::Mark),
        Err(PortError::UnsupportedParity(Parity::Mark))
    ));
    assert_eq!(port.config().parity(), Parity::Even);
    port.set_parity(Parity::None).expect("no parity");
}

#[test]
#[ignore]
fn test_real_port_buffer_sizes() {
    let fixture = crate::skip_without_hardware!();
    let port = fixture.port();

    match port.bytes_to_read() {
        Some(n) => println!("   Bytes to read: {}", n),
        None => println!("   Bytes to read: Not supported"),
    }
    match port.bytes_to_write() {
        Some(n) => println!("   Bytes to write: {}", n),
        None => println!("   Bytes to write: Not supported"),
    }

    println!("✅ Buffer size check completed");
}

#[test]
#[ignore]
fn test_real_port_unsupported_settings() {
    let Some(config) = TestPortConfig::from_env() else {
        println!("⏭️  Skipping: TEST_PORT not set");
        return;
    };

    let result = open_port(config.to_port_config().with_size(4));
    assert!(matches!(result, Err(PortError::UnsupportedSize(4))));

    let result = open_port(config.to_port_config().with_stop_bits(StopBits::OnePointFive));
    assert!(matches!(
        result,
        Err(PortError::UnsupportedStopBits(StopBits::OnePointFive))
    ));
}

#[test]
#[ignore]
fn test_real_port_multiple_open_close() {
    let Some(config) = TestPortConfig::from_env() else {
        println!("⏭️  Skipping: TEST_PORT not set");
        return;
    };

    println!("Testing multiple open/close cycles on: {}", config.port_name);
    for i in 1..=5 {
        println!("   Cycle {}/5", i);

        let port = open_port(config.to_port_config());
        assert!(port.is_ok(), "Failed to open port on cycle {}", i);
        drop(port);

        thread::sleep(Duration::from_millis(100));
    }

    println!("✅ Multiple open/close test passed");
}

#[test]
#[ignore]
fn test_real_port_baud_rate_switching() {
    let Some(config) = TestPortConfig::from_env() else {
        println!("⏭️  Skipping: TEST_PORT not set");
        return;
    };

    for baud in [9600, 19200, 38400, 57600, 115200] {
        let result = open_port(PortConfig::new(config.port_name.clone(), baud));
        match result {
            Ok(port) => {
                assert_eq!(port.config().baud(), baud);
                println!("      ✅ Opened at {} baud", baud);
            }
            Err(e) => panic!("Failed to open at baud rate {}: {}", baud, e),
        }
        thread::sleep(Duration::from_millis(100));
    }
}

#[test]
fn test_fixture_absent_without_port() {
    // Only meaningful when no hardware is configured.
    if TestPortConfig::from_env().is_none() {
        assert!(PortTestFixture::setup().is_none());
    }
}

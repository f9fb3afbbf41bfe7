//! Walkthrough of every port operation on the loopback backend.
//!
//! Run with: cargo run --example port_usage

use serial_stream::config::LoggingConfig;
use serial_stream::logging;
use serial_stream::port::{
    LineStatus, LoopbackPort, Parity, PortBackend, PortConfig, PortError, SerialPortAdapter,
    MAX_TIMEOUT,
};
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init(&LoggingConfig {
        level: "serial_stream=debug".to_string(),
        ..LoggingConfig::default()
    })?;

    println!("=== Port Abstraction Example ===\n");

    println!("1. Self-looped port:");
    loopback_example()?;

    println!("\n2. Null-modem pair:");
    pair_example()?;

    println!("\n=== Example complete ===");
    Ok(())
}

fn loopback_example() -> Result<(), PortError> {
    let port = LoopbackPort::open(PortConfig::new("loop0", 9600))?;
    let config = port.config();
    println!(
        "  Opened {} at {} baud, {} data bits, parity {}, {} stop bit(s)",
        config.name(),
        config.baud(),
        config.size(),
        config.parity(),
        config.stop_bits()
    );

    let written = port.write_bytes(b"hello")?;
    let mut buffer = [0u8; 128];
    let n = port.read_bytes(&mut buffer)?;
    println!(
        "  Wrote {} bytes, read back {:?}",
        written,
        String::from_utf8_lossy(&buffer[..n])
    );

    port.set_read_deadline(Duration::from_millis(200))?;
    match port.read_bytes(&mut buffer) {
        Err(e) if e.is_deadline_exceeded() => println!("  Idle read gave up: {}", e),
        other => println!("  Unexpected read result: {:?}", other),
    }
    port.set_read_deadline(MAX_TIMEOUT)?;

    port.write_bytes(b"discard me")?;
    port.clear_buffers()?;
    println!("  Pending after clear: {:?}", port.bytes_to_read());

    port.set_parity(Parity::Odd)?;
    println!("  Parity now {}", port.config().parity());

    port.set_rts(true)?;
    port.set_dtr(true)?;
    let status = port.status()?;
    println!(
        "  Plug echoes RTS->CTS: {}, DTR->DSR: {}",
        status.contains(LineStatus::CLEAR_TO_SEND),
        status.contains(LineStatus::DATA_SET_READY)
    );

    port.close()?;
    println!("  Read after close: {:?}", port.read_bytes(&mut buffer).err());
    Ok(())
}

fn pair_example() -> Result<(), PortError> {
    let (host, device) =
        LoopbackPort::pair(PortConfig::new("host", 115200), PortConfig::new("device", 115200))?;

    thread::scope(|s| {
        let reader = s.spawn(|| -> Result<(), PortError> {
            let mut buffer = [0u8; 64];
            loop {
                match device.read_bytes(&mut buffer) {
                    Ok(n) => println!("  device got {:?}", String::from_utf8_lossy(&buffer[..n])),
                    Err(e) if e.is_end_of_stream() => {
                        println!("  device reader stopped: {}", e);
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                }
            }
        });

        let sent = ["AT\r", "ATI\r"].iter().try_for_each(|line| -> Result<(), PortError> {
            host.write_bytes(line.as_bytes())?;
            thread::sleep(Duration::from_millis(50));
            Ok(())
        });
        device.close()?;

        reader.join().unwrap_or(Ok(()))?;
        sent
    })
}

//! Minimal serial terminal.
//!
//! Prints whatever the device sends while forwarding stdin lines to it.
//!
//! ```bash
//! cargo run --example terminal -- --port /dev/ttyUSB0 --baud 115200
//! # or take everything from serial-stream.toml / SERIAL_STREAM_* variables
//! cargo run --example terminal
//! ```

use clap::Parser;
use serial_stream::config::ConfigLoader;
use serial_stream::port::{Parity, SerialPortAdapter, StopBits};
use serial_stream::{logging, open_from_settings};
use std::io::{self, BufRead, Write};
use std::thread;

#[derive(Parser, Debug)]
#[command(name = "terminal", about = "Interactive serial terminal")]
struct Args {
    /// Device name or configured alias (overrides [port].name)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate (overrides [port].baud)
    #[arg(short, long)]
    baud: Option<u32>,

    /// Data bits per frame
    #[arg(long)]
    size: Option<u8>,

    /// Parity: none, odd or even
    #[arg(long, value_parser = parse_parity)]
    parity: Option<Parity>,

    /// Use two stop bits
    #[arg(long)]
    two_stop_bits: bool,

    /// Line ending appended to each stdin line
    #[arg(long, default_value = "\r\n")]
    eol: String,
}

fn parse_parity(s: &str) -> Result<Parity, String> {
    match s.to_ascii_lowercase().as_str() {
        "none" => Ok(Parity::None),
        "odd" => Ok(Parity::Odd),
        "even" => Ok(Parity::Even),
        "mark" => Ok(Parity::Mark),
        "space" => Ok(Parity::Space),
        other => Err(format!("unknown parity '{other}'")),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut settings = ConfigLoader::load()?.into_settings();
    logging::init(&settings.logging)?;

    if let Some(port) = args.port {
        settings.port.name = Some(port);
    }
    if let Some(baud) = args.baud {
        settings.port.baud = baud;
    }
    if args.size.is_some() {
        settings.port.size = args.size;
    }
    if args.parity.is_some() {
        settings.port.parity = args.parity;
    }
    if args.two_stop_bits {
        settings.port.stop_bits = Some(StopBits::Two);
    }

    let port = open_from_settings(&settings)?;
    eprintln!("Connected to {} (Ctrl-D to quit)", port.name());

    thread::scope(|s| -> Result<(), Box<dyn std::error::Error>> {
        s.spawn(|| {
            let mut buffer = [0u8; 1024];
            let stdout = io::stdout();
            loop {
                match port.read_bytes(&mut buffer) {
                    Ok(n) => {
                        let mut out = stdout.lock();
                        let _ = out.write_all(&buffer[..n]);
                        let _ = out.flush();
                    }
                    Err(e) if e.is_deadline_exceeded() => continue,
                    Err(e) => {
                        eprintln!("\n[reader stopped: {e}]");
                        break;
                    }
                }
            }
        });

        let forwarded = forward_stdin(&port, &args.eol);
        // Unblocks the reader thread so the scope can end.
        port.close()?;
        forwarded
    })
}

fn forward_stdin(port: &impl SerialPortAdapter, eol: &str) -> Result<(), Box<dyn std::error::Error>> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        port.write_bytes(format!("{line}{eol}").as_bytes())?;
    }
    Ok(())
}

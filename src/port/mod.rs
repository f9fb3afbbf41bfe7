//! Port abstraction layer for serial communication.
//!
//! Provides the port contract ([`SerialPortAdapter`], [`PortBackend`]), the
//! configuration normalizer, and two backends: the native [`SyncSerialPort`]
//! and the virtual [`LoopbackPort`] used for testing without hardware.

pub mod config;
mod deadline;
pub mod error;
pub mod loopback;
pub mod sync_port;
pub mod traits;

pub use config::{
    PortConfig, ResolvedPortConfig, DEFAULT_DATA_SIZE, DEFAULT_PARITY, DEFAULT_STOP_BITS,
    MAX_TIMEOUT,
};
pub use deadline::POLL_INTERVAL;
pub use error::PortError;
pub use loopback::LoopbackPort;
pub use sync_port::SyncSerialPort;
pub use traits::{LineStatus, Parity, PortBackend, SerialPortAdapter, StopBits};

/// The operating system's serial port type for this build target.
pub type NativePort = SyncSerialPort;

/// Normalize `config` and open the native serial port it names.
///
/// # Example
/// ```no_run
/// use serial_stream::port::{open_port, PortConfig, SerialPortAdapter};
///
/// let port = open_port(PortConfig::new("COM5", 115200))?;
/// port.write_bytes(b"test")?;
///
/// let mut buf = [0u8; 128];
/// let n = port.read_bytes(&mut buf)?;
/// println!("{:?}", &buf[..n]);
/// # Ok::<(), serial_stream::port::PortError>(())
/// ```
pub fn open_port(config: PortConfig) -> Result<NativePort, PortError> {
    NativePort::open(config)
}

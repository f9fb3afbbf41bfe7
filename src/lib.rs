//! Blocking serial port streams with one contract on every platform.
//!
//! Open a named port with a [`PortConfig`], then read and write bytes on it.
//! Reads block until at least one byte arrives, optionally bounded by a read
//! deadline. Writes block until every byte has been accepted. A port may be
//! read on one thread while another thread writes to it; closing it from any
//! thread wakes both.
//!
//! ```no_run
//! use serial_stream::{open_port, PortConfig, SerialPortAdapter};
//!
//! let port = open_port(PortConfig::new("COM5", 115200))?;
//! port.write_bytes(b"test")?;
//!
//! let mut buf = [0u8; 128];
//! let n = port.read_bytes(&mut buf)?;
//! println!("{:?}", &buf[..n]);
//! # Ok::<(), serial_stream::PortError>(())
//! ```
//!
//! # Modules
//!
//! - `port`: the port contract, configuration normalizer and backends
//! - `config`: TOML settings with environment overrides
//! - `logging`: tracing subscriber installation
//! - `error`: unified error for settings-driven opens

pub mod config;
pub mod error;
pub mod logging;
pub mod port;

pub use error::Error;
pub use port::{
    open_port, LineStatus, LoopbackPort, NativePort, Parity, PortBackend, PortConfig, PortError,
    ResolvedPortConfig, SerialPortAdapter, StopBits, SyncSerialPort,
};

pub use config::{ConfigError, ConfigLoader, ConfigResult, Settings};

/// Open the port described by `settings` with backend `B`.
///
/// The `[port]` section supplies the configuration; its read deadline, if
/// any, is applied once the port is open.
pub fn open_with_settings<B: PortBackend>(settings: &Settings) -> Result<B, Error> {
    let config = settings.port.to_port_config()?;
    let port = B::open(config)?;
    if let Some(deadline) = settings.port.read_deadline() {
        port.set_read_deadline(deadline)?;
    }
    Ok(port)
}

/// Open the native port described by `settings`.
pub fn open_from_settings(settings: &Settings) -> Result<NativePort, Error> {
    open_with_settings(settings)
}

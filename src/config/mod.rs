//! Settings for host programs.
//!
//! Lets a program name its serial port in a TOML file or the environment
//! instead of in code.
//!
//! # Resolution
//!
//! Settings are loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_STREAM_CONFIG` environment variable (explicit path)
//! 2. `./serial-stream.toml` (current directory)
//! 3. `serial-stream/serial-stream.toml` under the platform config directory
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `SERIAL_STREAM_<SECTION>_<KEY>`:
//! - `SERIAL_STREAM_PORT_NAME=/dev/ttyUSB0`
//! - `SERIAL_STREAM_PORT_BAUD=115200`
//! - `SERIAL_STREAM_LOG_FORMAT=json`
//!
//! The hardware-test variables `TEST_PORT`, `TEST_BAUD`, `TEST_TIMEOUT` and
//! `TEST_LOOPBACK` are also supported.
//!
//! # Example
//!
//! ```toml
//! [port]
//! name = "arduino"
//! baud = 115200
//! read_deadline_ms = 500
//!
//! [port.aliases]
//! arduino = "/dev/ttyACM0"
//!
//! [logging]
//! level = "serial_stream=debug"
//! format = "compact"
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{LogFormat, LoggingConfig, PortSection, Settings, TestingConfig};

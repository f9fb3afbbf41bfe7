//! Core traits for serial port abstraction.
//!
//! [`SerialPortAdapter`] is the capability set every backend provides, and
//! [`PortBackend`] is how a backend is opened from a configuration. Both the
//! native hardware port and the virtual loopback port implement them, so
//! callers can be written once against the trait.
//!
//! All operations take `&self`. A conforming port is `Send + Sync` and must
//! allow one thread to sit in [`read_bytes`](SerialPortAdapter::read_bytes)
//! while another thread is in [`write_bytes`](SerialPortAdapter::write_bytes)
//! without any locking by the caller. Two concurrent readers (or writers) are
//! not supported; the bytes they see are unspecified.

use super::config::{PortConfig, ResolvedPortConfig};
use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::ops::{BitOr, BitOrAssign};
use std::time::Duration;

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
    /// Parity bit always set. Not every backend can express this.
    Mark,
    /// Parity bit always clear. Not every backend can express this.
    Space,
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parity::None => "none",
            Parity::Odd => "odd",
            Parity::Even => "even",
            Parity::Mark => "mark",
            Parity::Space => "space",
        };
        f.write_str(name)
    }
}

impl TryFrom<Parity> for serialport::Parity {
    type Error = PortError;

    fn try_from(parity: Parity) -> Result<Self, Self::Error> {
        match parity {
            Parity::None => Ok(serialport::Parity::None),
            Parity::Odd => Ok(serialport::Parity::Odd),
            Parity::Even => Ok(serialport::Parity::Even),
            Parity::Mark | Parity::Space => Err(PortError::UnsupportedParity(parity)),
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    One,
    OnePointFive,
    Two,
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StopBits::One => "1",
            StopBits::OnePointFive => "1.5",
            StopBits::Two => "2",
        };
        f.write_str(name)
    }
}

impl TryFrom<StopBits> for serialport::StopBits {
    type Error = PortError;

    fn try_from(bits: StopBits) -> Result<Self, Self::Error> {
        match bits {
            StopBits::One => Ok(serialport::StopBits::One),
            StopBits::Two => Ok(serialport::StopBits::Two),
            StopBits::OnePointFive => Err(PortError::UnsupportedStopBits(bits)),
        }
    }
}

/// Modem line state reported by [`SerialPortAdapter::status`].
///
/// The bit values follow the usual modem-control layout; treat the mask as
/// opaque apart from the named constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LineStatus(u32);

impl LineStatus {
    pub const CLEAR_TO_SEND: Self = Self(0x020);
    pub const CARRIER_DETECT: Self = Self(0x040);
    pub const RING_INDICATOR: Self = Self(0x080);
    pub const DATA_SET_READY: Self = Self(0x100);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn set(&mut self, flag: Self, on: bool) {
        if on {
            self.0 |= flag.0;
        } else {
            self.0 &= !flag.0;
        }
    }
}

impl BitOr for LineStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LineStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Trait for serial port I/O operations.
///
/// Capabilities a backend may lack have default implementations that fail
/// with [`PortError::NotSupported`] (or [`PortError::UnsupportedParity`] for
/// [`set_parity`](Self::set_parity)).
pub trait SerialPortAdapter: Send + Sync + fmt::Debug {
    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Blocks until at least one byte is available and returns how many were
    /// copied. `Ok(0)` is only returned for an empty buffer. Fails with
    /// [`PortError::DeadlineExceeded`] when a read deadline elapses first,
    /// which leaves the port usable, and with [`PortError::Closed`] or
    /// [`PortError::Disconnected`] once the port can carry no more data.
    fn read_bytes(&self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Write all of `data` to the serial port.
    ///
    /// Blocks until every byte has been accepted. A failure after a partial
    /// write is reported as [`PortError::Incomplete`].
    fn write_bytes(&self, data: &[u8]) -> Result<usize, PortError>;

    /// Release the device.
    ///
    /// A read or write blocked in another thread returns
    /// [`PortError::Closed`] shortly afterwards. Closing twice is harmless.
    fn close(&self) -> Result<(), PortError>;

    /// Bound how long each subsequent read may block.
    ///
    /// The limit applies to every later read, measured from the start of
    /// that read, until it is changed. `Duration::ZERO` restores unlimited
    /// blocking.
    fn set_read_deadline(&self, _deadline: Duration) -> Result<(), PortError> {
        Err(PortError::not_supported("set_read_deadline"))
    }

    /// Clear both input and output buffers.
    ///
    /// This discards any unread data in the receive buffer and any unsent
    /// data in the transmit buffer.
    fn clear_buffers(&self) -> Result<(), PortError>;

    /// Current modem line state.
    fn status(&self) -> Result<LineStatus, PortError> {
        Err(PortError::not_supported("status"))
    }

    /// Drive the Data-Terminal-Ready line.
    fn set_dtr(&self, _level: bool) -> Result<(), PortError> {
        Err(PortError::not_supported("set_dtr"))
    }

    /// Drive the Request-To-Send line.
    fn set_rts(&self, _level: bool) -> Result<(), PortError> {
        Err(PortError::not_supported("set_rts"))
    }

    /// Change parity on the open port without reopening it.
    fn set_parity(&self, parity: Parity) -> Result<(), PortError> {
        Err(PortError::UnsupportedParity(parity))
    }

    /// Get the current bytes available to read (if supported).
    ///
    /// Returns `None` if the operation is not supported or cannot be determined.
    fn bytes_to_read(&self) -> Option<usize> {
        None
    }

    /// Get the current bytes waiting to be written (if supported).
    ///
    /// Returns `None` if the operation is not supported or cannot be determined.
    fn bytes_to_write(&self) -> Option<usize> {
        None
    }
}

/// A port type that can be opened from a configuration.
pub trait PortBackend: SerialPortAdapter + Sized {
    /// Open a port from an already-normalized configuration.
    ///
    /// Settings are validated before the device is touched, so an
    /// unsupported size, stop-bit or parity value is reported even when the
    /// device does not exist.
    fn open_resolved(config: ResolvedPortConfig) -> Result<Self, PortError>;

    /// Normalize `config` and open it.
    fn open(config: PortConfig) -> Result<Self, PortError> {
        Self::open_resolved(config.normalize())
    }
}

/// `std::io::Read` on top of [`SerialPortAdapter::read_bytes`].
///
/// A closed or hung-up port reads as end-of-stream (`Ok(0)`).
pub(crate) fn io_read<P: SerialPortAdapter + ?Sized>(port: &P, buf: &mut [u8]) -> io::Result<usize> {
    match port.read_bytes(buf) {
        Ok(n) => Ok(n),
        Err(e) if e.is_end_of_stream() => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// `std::io::Write` on top of [`SerialPortAdapter::write_bytes`].
///
/// A partial write reports the accepted count and drops the error that
/// stopped it. Only a lasting condition such as a closed or hung-up port is
/// seen again by the next call.
pub(crate) fn io_write<P: SerialPortAdapter + ?Sized>(port: &P, buf: &[u8]) -> io::Result<usize> {
    match port.write_bytes(buf) {
        Ok(n) => Ok(n),
        Err(PortError::Incomplete { written, .. }) => Ok(written),
        Err(e) => Err(e.into()),
    }
}

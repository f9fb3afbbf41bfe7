//! Port configuration and normalization.
//!
//! A [`PortConfig`] is what callers fill in: the device name, the baud rate
//! and, optionally, the frame layout. [`PortConfig::normalize`] turns it into
//! a [`ResolvedPortConfig`] with every optional field replaced by its
//! default, which is the only form backends ever see.

use super::error::PortError;
use super::traits::{Parity, StopBits};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of data bits per frame.
pub const DEFAULT_DATA_SIZE: u8 = 8;

/// Default parity.
pub const DEFAULT_PARITY: Parity = Parity::None;

/// Default stop bits.
pub const DEFAULT_STOP_BITS: StopBits = StopBits::One;

/// Read timeout meaning "block until data arrives".
pub const MAX_TIMEOUT: Duration = Duration::MAX;

/// Configuration for opening a serial port.
///
/// `name` and `baud` are required and passed to the backend untouched.
/// The remaining fields fall back to 8 data bits, no parity and one stop bit
/// when left as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    /// Platform device identifier, e.g. `/dev/ttyUSB0` or `COM3`.
    pub name: String,
    /// Baud rate (bits per second). Zero is rejected at open.
    pub baud: u32,
    /// Data bits per frame.
    #[serde(default)]
    pub size: Option<u8>,
    #[serde(default)]
    pub parity: Option<Parity>,
    #[serde(default)]
    pub stop_bits: Option<StopBits>,
}

impl PortConfig {
    /// Create a configuration with only the required fields set.
    pub fn new(name: impl Into<String>, baud: u32) -> Self {
        Self {
            name: name.into(),
            baud,
            size: None,
            parity: None,
            stop_bits: None,
        }
    }

    pub fn with_size(mut self, size: u8) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = Some(parity);
        self
    }

    pub fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = Some(stop_bits);
        self
    }

    /// Fill in defaults for every unset field.
    ///
    /// Performs no I/O and cannot fail. Explicit values are kept as given,
    /// even if no backend supports them; that check belongs to open.
    pub fn normalize(self) -> ResolvedPortConfig {
        ResolvedPortConfig {
            name: self.name,
            baud: self.baud,
            size: self.size.unwrap_or(DEFAULT_DATA_SIZE),
            parity: self.parity.unwrap_or(DEFAULT_PARITY),
            stop_bits: self.stop_bits.unwrap_or(DEFAULT_STOP_BITS),
            read_timeout: MAX_TIMEOUT,
        }
    }
}

/// A fully populated configuration, ready for a backend.
///
/// Only obtainable through [`PortConfig::normalize`], so the frame fields
/// always hold concrete values and the read timeout is always the
/// block-forever sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPortConfig {
    name: String,
    baud: u32,
    size: u8,
    parity: Parity,
    stop_bits: StopBits,
    read_timeout: Duration,
}

impl ResolvedPortConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn baud(&self) -> u32 {
        self.baud
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    pub fn stop_bits(&self) -> StopBits {
        self.stop_bits
    }

    /// Initial read timeout; [`MAX_TIMEOUT`] until a deadline is set on the
    /// open port.
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub(crate) fn set_parity(&mut self, parity: Parity) {
        self.parity = parity;
    }

    /// Reject an empty device name or a zero baud rate.
    pub fn check_required(&self) -> Result<(), PortError> {
        if self.name.trim().is_empty() {
            return Err(PortError::invalid_argument("port name must not be empty"));
        }
        if self.baud == 0 {
            return Err(PortError::invalid_argument(format!(
                "baud rate for {} must be non-zero",
                self.name
            )));
        }
        Ok(())
    }

    /// Reject data sizes outside 5..=8.
    pub fn check_size(&self) -> Result<(), PortError> {
        match self.size {
            5..=8 => Ok(()),
            other => Err(PortError::UnsupportedSize(other)),
        }
    }
}

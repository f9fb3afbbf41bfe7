//! Port-specific error types.
//!
//! Every failure a port operation can report lives here. Configuration errors
//! (`Unsupported*`, `InvalidArgument`) and capability errors (`NotSupported`)
//! are final. `DeadlineExceeded` is the one non-fatal outcome: the port stays
//! usable and the caller may simply read again.

use super::traits::{Parity, StopBits};
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested number of data bits is not supported by the backend.
    #[error("unsupported serial data size: {0}")]
    UnsupportedSize(u8),

    /// The requested stop-bit setting is not supported by the backend.
    #[error("unsupported stop bit setting: {0}")]
    UnsupportedStopBits(StopBits),

    /// The requested parity is not supported by the backend.
    #[error("unsupported parity setting: {0}")]
    UnsupportedParity(Parity),

    /// A configuration value is malformed (empty name, zero baud, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend cannot perform this operation at all.
    #[error("operation not supported: {0}")]
    NotSupported(&'static str),

    /// A read deadline elapsed before any byte arrived.
    #[error("read deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// The port was closed, possibly from another thread.
    #[error("port is closed")]
    Closed,

    /// The device went away (hang-up, removal, closed peer).
    #[error("device disconnected")]
    Disconnected,

    /// The specified serial port was not found on the system.
    #[error("serial port not found: {0}")]
    NotFound(String),

    /// A write failed after part of the buffer had been accepted.
    #[error("write failed after {written} byte(s): {source}")]
    Incomplete {
        written: usize,
        #[source]
        source: Box<PortError>,
    },

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A serialport-specific error occurred.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create an InvalidArgument error from a message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a NotSupported error naming the missing operation.
    pub fn not_supported(operation: &'static str) -> Self {
        Self::NotSupported(operation)
    }

    /// Wrap `source` with the count of bytes already written.
    ///
    /// When nothing was written the source error is returned unchanged, so
    /// `Incomplete` always means a genuine partial write.
    pub fn incomplete(written: usize, source: PortError) -> Self {
        if written == 0 {
            source
        } else {
            Self::Incomplete {
                written,
                source: Box::new(source),
            }
        }
    }

    /// True when a read gave up because its deadline elapsed.
    ///
    /// Callers should treat this as "no data yet" and may read again; every
    /// other read error is terminal for the port.
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded(_))
    }

    /// True when the port can no longer carry data.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::Closed | Self::Disconnected)
    }
}

impl From<PortError> for io::Error {
    fn from(err: PortError) -> Self {
        let err = match err {
            PortError::Io(inner) => return inner,
            other => other,
        };
        let kind = match &err {
            PortError::DeadlineExceeded(_) => io::ErrorKind::TimedOut,
            PortError::Closed => io::ErrorKind::NotConnected,
            PortError::Disconnected => io::ErrorKind::BrokenPipe,
            PortError::NotFound(_) => io::ErrorKind::NotFound,
            PortError::NotSupported(_) => io::ErrorKind::Unsupported,
            PortError::UnsupportedSize(_)
            | PortError::UnsupportedStopBits(_)
            | PortError::UnsupportedParity(_)
            | PortError::InvalidArgument(_) => io::ErrorKind::InvalidInput,
            PortError::Io(_) | PortError::Incomplete { .. } | PortError::Serial(_) => {
                io::ErrorKind::Other
            }
        };
        io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::not_found("/dev/ttyUSB0");
        assert_eq!(err.to_string(), "serial port not found: /dev/ttyUSB0");

        let err = PortError::UnsupportedSize(9);
        assert_eq!(err.to_string(), "unsupported serial data size: 9");

        let err = PortError::UnsupportedParity(Parity::Mark);
        assert_eq!(err.to_string(), "unsupported parity setting: mark");

        let err = PortError::Closed;
        assert_eq!(err.to_string(), "port is closed");
    }

    #[test]
    fn test_deadline_error() {
        let err = PortError::DeadlineExceeded(Duration::from_millis(500));
        assert!(err.to_string().contains("500ms"));
        assert!(err.is_deadline_exceeded());
        assert!(!err.is_end_of_stream());
    }

    #[test]
    fn test_incomplete_without_progress_is_source() {
        let err = PortError::incomplete(0, PortError::Closed);
        assert!(matches!(err, PortError::Closed));

        let err = PortError::incomplete(3, PortError::Closed);
        match err {
            PortError::Incomplete { written, source } => {
                assert_eq!(written, 3);
                assert!(matches!(*source, PortError::Closed));
            }
            other => panic!("expected Incomplete, got {other:?}"),
        }
    }

    #[test]
    fn test_io_error_kinds() {
        let io_err: io::Error = PortError::DeadlineExceeded(Duration::from_millis(10)).into();
        assert_eq!(io_err.kind(), io::ErrorKind::TimedOut);

        let io_err: io::Error = PortError::not_supported("status").into();
        assert_eq!(io_err.kind(), io::ErrorKind::Unsupported);

        let io_err: io::Error = PortError::UnsupportedStopBits(StopBits::OnePointFive).into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidInput);

        let original = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let io_err: io::Error = PortError::Io(original).into();
        assert_eq!(io_err.kind(), io::ErrorKind::PermissionDenied);
    }
}

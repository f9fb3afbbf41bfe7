//! Native serial port backend.
//!
//! Wraps the `serialport` crate's platform port type: `TTYPort` on unix,
//! `COMPort` on windows, chosen at build time. One device is opened and its
//! handle cloned three times (reader, writer, control), each behind its own
//! lock, so a read blocked in one thread never holds up a write in another.
//!
//! Reads and writes block in slices of [`POLL_INTERVAL`]. Between slices they
//! re-check the read deadline and whether the port was closed.

use super::config::ResolvedPortConfig;
use super::deadline::{ReadDeadline, POLL_INTERVAL};
use super::error::PortError;
use super::traits::{io_read, io_write, LineStatus, Parity, PortBackend, SerialPortAdapter};
use parking_lot::{Mutex, RwLock};
use serialport::SerialPort as _;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

#[cfg(unix)]
type NativeHandle = serialport::TTYPort;

#[cfg(windows)]
type NativeHandle = serialport::COMPort;

/// Serial port backed by an operating-system device.
///
/// On windows the reader and writer share one file object, so the driver may
/// still serialize a read slice against a write; the write then waits at
/// most one [`POLL_INTERVAL`].
pub struct SyncSerialPort {
    name: String,
    config: RwLock<ResolvedPortConfig>,
    reader: Mutex<Option<NativeHandle>>,
    writer: Mutex<Option<NativeHandle>>,
    control: Mutex<Option<NativeHandle>>,
    deadline: ReadDeadline,
    closed: AtomicBool,
}

impl SyncSerialPort {
    /// Configuration the port is currently running with.
    pub fn config(&self) -> ResolvedPortConfig {
        self.config.read().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), PortError> {
        if self.is_closed() {
            Err(PortError::Closed)
        } else {
            Ok(())
        }
    }

    fn with_control<T>(
        &self,
        op: impl FnOnce(&mut NativeHandle) -> serialport::Result<T>,
    ) -> Result<T, PortError> {
        let mut guard = self.control.lock();
        let handle = guard.as_mut().ok_or(PortError::Closed)?;
        op(handle).map_err(PortError::Serial)
    }
}

fn data_bits(size: u8) -> Result<serialport::DataBits, PortError> {
    match size {
        5 => Ok(serialport::DataBits::Five),
        6 => Ok(serialport::DataBits::Six),
        7 => Ok(serialport::DataBits::Seven),
        8 => Ok(serialport::DataBits::Eight),
        other => Err(PortError::UnsupportedSize(other)),
    }
}

fn open_error(port_name: &str, err: serialport::Error) -> PortError {
    match err.kind() {
        serialport::ErrorKind::NoDevice => PortError::not_found(port_name),
        serialport::ErrorKind::InvalidInput => PortError::invalid_argument(err.to_string()),
        _ => PortError::Serial(err),
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

/// Map a device I/O failure, reporting hang-ups as `Disconnected`.
fn device_error(err: io::Error) -> PortError {
    match err.kind() {
        io::ErrorKind::BrokenPipe
        | io::ErrorKind::NotConnected
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::UnexpectedEof => PortError::Disconnected,
        _ => PortError::Io(err),
    }
}

fn clone_handle(port_name: &str, handle: &NativeHandle) -> Result<NativeHandle, PortError> {
    handle.try_clone_native().map_err(|e| {
        warn!(port = %port_name, error = %e, "failed to clone serial handle");
        PortError::Serial(e)
    })
}

impl PortBackend for SyncSerialPort {
    /// Open a serial port with the given configuration.
    ///
    /// # Example
    /// ```no_run
    /// use serial_stream::port::{PortBackend, PortConfig, SerialPortAdapter, SyncSerialPort};
    ///
    /// let port = SyncSerialPort::open(PortConfig::new("/dev/ttyUSB0", 115200))?;
    /// port.write_bytes(b"test")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn open_resolved(config: ResolvedPortConfig) -> Result<Self, PortError> {
        config.check_required()?;
        let data_bits = data_bits(config.size())?;
        let stop_bits = serialport::StopBits::try_from(config.stop_bits())?;
        let parity = serialport::Parity::try_from(config.parity())?;
        let name = config.name().to_string();

        let control = serialport::new(&name, config.baud())
            .data_bits(data_bits)
            .flow_control(serialport::FlowControl::None)
            .parity(parity)
            .stop_bits(stop_bits)
            .timeout(POLL_INTERVAL)
            .open_native()
            .map_err(|e| open_error(&name, e))?;
        let reader = clone_handle(&name, &control)?;
        let writer = clone_handle(&name, &control)?;

        info!(
            port = %name,
            baud = config.baud(),
            size = config.size(),
            parity = %config.parity(),
            stop_bits = %config.stop_bits(),
            "opened serial port"
        );

        Ok(Self {
            deadline: ReadDeadline::from_timeout(config.read_timeout()),
            name,
            config: RwLock::new(config),
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(writer)),
            control: Mutex::new(Some(control)),
            closed: AtomicBool::new(false),
        })
    }
}

impl SerialPortAdapter for SyncSerialPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_bytes(&self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.ensure_open()?;
        if buffer.is_empty() {
            return Ok(0);
        }

        let mut guard = self.reader.lock();
        let timer = self.deadline.start();
        loop {
            self.ensure_open()?;
            let handle = guard.as_mut().ok_or(PortError::Closed)?;
            let Some(slice) = timer.slice(POLL_INTERVAL) else {
                trace!(port = %self.name, "read deadline expired");
                return Err(timer.expired());
            };
            handle.set_timeout(slice)?;
            match handle.read(buffer) {
                Ok(0) => return Err(PortError::Disconnected),
                Ok(n) => return Ok(n),
                Err(e) if is_transient(&e) => continue,
                Err(e) => return Err(device_error(e)),
            }
        }
    }

    fn write_bytes(&self, data: &[u8]) -> Result<usize, PortError> {
        self.ensure_open()?;

        let mut guard = self.writer.lock();
        let mut written = 0;
        while written < data.len() {
            if self.is_closed() {
                return Err(PortError::incomplete(written, PortError::Closed));
            }
            let Some(handle) = guard.as_mut() else {
                return Err(PortError::incomplete(written, PortError::Closed));
            };
            match handle.write(&data[written..]) {
                Ok(0) => return Err(PortError::incomplete(written, PortError::Disconnected)),
                Ok(n) => written += n,
                Err(e) if is_transient(&e) => continue,
                Err(e) => return Err(PortError::incomplete(written, device_error(e))),
            }
        }
        Ok(written)
    }

    fn close(&self) -> Result<(), PortError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            debug!(port = %self.name, "port already closed");
            return Ok(());
        }
        // Blocked readers and writers see the flag within one poll slice and
        // let go of their handle locks.
        let reader = self.reader.lock().take();
        let writer = self.writer.lock().take();
        let control = self.control.lock().take();
        drop((reader, writer, control));
        info!(port = %self.name, "closed serial port");
        Ok(())
    }

    fn set_read_deadline(&self, deadline: Duration) -> Result<(), PortError> {
        self.ensure_open()?;
        let limit = self.deadline.set(deadline);
        debug!(port = %self.name, ?limit, "read deadline updated");
        Ok(())
    }

    fn clear_buffers(&self) -> Result<(), PortError> {
        self.with_control(|h| h.clear(serialport::ClearBuffer::All))?;
        trace!(port = %self.name, "cleared buffers");
        Ok(())
    }

    fn status(&self) -> Result<LineStatus, PortError> {
        self.with_control(|h| {
            let mut status = LineStatus::empty();
            status.set(LineStatus::CLEAR_TO_SEND, h.read_clear_to_send()?);
            status.set(LineStatus::DATA_SET_READY, h.read_data_set_ready()?);
            status.set(LineStatus::RING_INDICATOR, h.read_ring_indicator()?);
            status.set(LineStatus::CARRIER_DETECT, h.read_carrier_detect()?);
            Ok(status)
        })
    }

    fn set_dtr(&self, level: bool) -> Result<(), PortError> {
        self.with_control(|h| h.write_data_terminal_ready(level))?;
        debug!(port = %self.name, level, "DTR set");
        Ok(())
    }

    fn set_rts(&self, level: bool) -> Result<(), PortError> {
        self.with_control(|h| h.write_request_to_send(level))?;
        debug!(port = %self.name, level, "RTS set");
        Ok(())
    }

    fn set_parity(&self, parity: Parity) -> Result<(), PortError> {
        let native = serialport::Parity::try_from(parity)?;
        self.with_control(|h| h.set_parity(native))?;
        self.config.write().set_parity(parity);
        debug!(port = %self.name, %parity, "parity changed");
        Ok(())
    }

    fn bytes_to_read(&self) -> Option<usize> {
        let guard = self.control.lock();
        guard.as_ref()?.bytes_to_read().ok().map(|n| n as usize)
    }

    fn bytes_to_write(&self) -> Option<usize> {
        let guard = self.control.lock();
        guard.as_ref()?.bytes_to_write().ok().map(|n| n as usize)
    }
}

impl Read for &SyncSerialPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io_read(*self, buf)
    }
}

impl Read for SyncSerialPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io_read(self, buf)
    }
}

impl Write for &SyncSerialPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io_write(*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Write for SyncSerialPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io_write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.config.read().baud())
            .field("closed", &self.is_closed())
            .finish()
    }
}

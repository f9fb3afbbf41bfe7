//! Virtual serial ports for testing without hardware.
//!
//! [`LoopbackPort::open`] behaves like a device with a loopback plug fitted:
//! TX is wired to RX, RTS to CTS, and DTR to DSR and DCD. [`LoopbackPort::pair`]
//! gives two ports joined by a null-modem cable, each one's TX feeding the
//! other's RX and its control outputs driving the other's inputs.
//!
//! Both satisfy the full port contract, including blocking reads, read
//! deadlines and close-from-another-thread. Writes never block; the virtual
//! wire buffers without limit.
//!
//! # Example
//! ```
//! use serial_stream::port::{LoopbackPort, PortBackend, PortConfig, SerialPortAdapter};
//!
//! let port = LoopbackPort::open(PortConfig::new("loop0", 9600)).unwrap();
//! port.write_bytes(b"hello").unwrap();
//!
//! let mut buffer = [0u8; 128];
//! let n = port.read_bytes(&mut buffer).unwrap();
//! assert_eq!(&buffer[..n], b"hello");
//! ```

use super::config::{PortConfig, ResolvedPortConfig};
use super::deadline::{ReadDeadline, Wait};
use super::error::PortError;
use super::traits::{io_read, io_write, LineStatus, Parity, PortBackend, SerialPortAdapter};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct WireState {
    queue: VecDeque<u8>,
    /// The receiving end was closed.
    receiver_closed: bool,
    /// The sending end was closed; the receiver drains then sees a hang-up.
    sender_closed: bool,
}

/// One direction of a virtual cable.
#[derive(Debug, Default)]
struct Wire {
    state: Mutex<WireState>,
    ready: Condvar,
}

impl Wire {
    fn update(&self, f: impl FnOnce(&mut WireState)) {
        f(&mut self.state.lock());
        self.ready.notify_all();
    }
}

/// Control outputs driven by one end of the cable.
#[derive(Debug, Default)]
struct Signals {
    dtr: AtomicBool,
    rts: AtomicBool,
}

/// In-process serial port backed by a virtual cable.
pub struct LoopbackPort {
    name: String,
    config: Mutex<ResolvedPortConfig>,
    rx: Arc<Wire>,
    tx: Arc<Wire>,
    local: Arc<Signals>,
    remote: Arc<Signals>,
    deadline: ReadDeadline,
    closed: AtomicBool,
}

impl LoopbackPort {
    /// Open two ports connected by a null-modem cable.
    pub fn pair(a: PortConfig, b: PortConfig) -> Result<(Self, Self), PortError> {
        let a = validate(a.normalize())?;
        let b = validate(b.normalize())?;

        let a_to_b = Arc::new(Wire::default());
        let b_to_a = Arc::new(Wire::default());
        let a_signals = Arc::new(Signals::default());
        let b_signals = Arc::new(Signals::default());

        debug!(a = %a.name(), b = %b.name(), "opened loopback pair");
        let first = Self::wired(a, b_to_a.clone(), a_to_b.clone(), a_signals.clone(), b_signals.clone());
        let second = Self::wired(b, a_to_b, b_to_a, b_signals, a_signals);
        Ok((first, second))
    }

    fn wired(
        config: ResolvedPortConfig,
        rx: Arc<Wire>,
        tx: Arc<Wire>,
        local: Arc<Signals>,
        remote: Arc<Signals>,
    ) -> Self {
        Self {
            name: config.name().to_string(),
            deadline: ReadDeadline::from_timeout(config.read_timeout()),
            config: Mutex::new(config),
            rx,
            tx,
            local,
            remote,
            closed: AtomicBool::new(false),
        }
    }

    /// Configuration the port is currently running with.
    pub fn config(&self) -> ResolvedPortConfig {
        self.config.lock().clone()
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

    /// Bits of each byte that survive the configured frame size.
    fn frame_mask(&self) -> u8 {
        u8::MAX >> (8 - self.config.lock().size())
    }
}

fn validate(config: ResolvedPortConfig) -> Result<ResolvedPortConfig, PortError> {
    config.check_required()?;
    config.check_size()?;
    Ok(config)
}

impl PortBackend for LoopbackPort {
    /// Open a port whose output is wired straight back to its input.
    fn open_resolved(config: ResolvedPortConfig) -> Result<Self, PortError> {
        let config = validate(config)?;
        let wire = Arc::new(Wire::default());
        let signals = Arc::new(Signals::default());
        debug!(port = %config.name(), baud = config.baud(), "opened loopback port");
        Ok(Self::wired(config, wire.clone(), wire, signals.clone(), signals))
    }
}

impl SerialPortAdapter for LoopbackPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_bytes(&self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.ensure_open()?;
        if buffer.is_empty() {
            return Ok(0);
        }

        let timer = self.deadline.start();
        let mut state = self.rx.state.lock();
        loop {
            if state.receiver_closed {
                return Err(PortError::Closed);
            }
            if !state.queue.is_empty() {
                let n = buffer.len().min(state.queue.len());
                for (slot, byte) in buffer.iter_mut().zip(state.queue.drain(..n)) {
                    *slot = byte;
                }
                return Ok(n);
            }
            if state.sender_closed {
                return Err(PortError::Disconnected);
            }
            match timer.wait() {
                Wait::Forever => self.rx.ready.wait(&mut state),
                Wait::For(remaining) => {
                    let _ = self.rx.ready.wait_for(&mut state, remaining);
                }
                Wait::Expired => {
                    trace!(port = %self.name, "read deadline expired");
                    return Err(timer.expired());
                }
            }
        }
    }

    fn write_bytes(&self, data: &[u8]) -> Result<usize, PortError> {
        self.ensure_open()?;
        let mask = self.frame_mask();

        let mut state = self.tx.state.lock();
        if self.is_closed() {
            return Err(PortError::Closed);
        }
        if state.receiver_closed {
            return Err(PortError::Disconnected);
        }
        state.queue.extend(data.iter().map(|byte| byte & mask));
        drop(state);

        self.tx.ready.notify_all();
        Ok(data.len())
    }

    fn close(&self) -> Result<(), PortError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.rx.update(|state| state.receiver_closed = true);
        self.tx.update(|state| state.sender_closed = true);
        self.local.dtr.store(false, Ordering::Release);
        self.local.rts.store(false, Ordering::Release);
        debug!(port = %self.name, "closed loopback port");
        Ok(())
    }

    fn set_read_deadline(&self, deadline: Duration) -> Result<(), PortError> {
        self.ensure_open()?;
        let limit = self.deadline.set(deadline);
        debug!(port = %self.name, ?limit, "read deadline updated");
        Ok(())
    }

    fn clear_buffers(&self) -> Result<(), PortError> {
        self.ensure_open()?;
        self.rx.state.lock().queue.clear();
        trace!(port = %self.name, "cleared buffers");
        Ok(())
    }

    fn status(&self) -> Result<LineStatus, PortError> {
        self.ensure_open()?;
        let dtr = self.remote.dtr.load(Ordering::Acquire);
        let rts = self.remote.rts.load(Ordering::Acquire);

        let mut status = LineStatus::empty();
        status.set(LineStatus::CLEAR_TO_SEND, rts);
        status.set(LineStatus::DATA_SET_READY, dtr);
        status.set(LineStatus::CARRIER_DETECT, dtr);
        Ok(status)
    }

    fn set_dtr(&self, level: bool) -> Result<(), PortError> {
        self.ensure_open()?;
        self.local.dtr.store(level, Ordering::Release);
        debug!(port = %self.name, level, "DTR set");
        Ok(())
    }

    fn set_rts(&self, level: bool) -> Result<(), PortError> {
        self.ensure_open()?;
        self.local.rts.store(level, Ordering::Release);
        debug!(port = %self.name, level, "RTS set");
        Ok(())
    }

    fn set_parity(&self, parity: Parity) -> Result<(), PortError> {
        self.ensure_open()?;
        self.config.lock().set_parity(parity);
        debug!(port = %self.name, %parity, "parity changed");
        Ok(())
    }

    fn bytes_to_read(&self) -> Option<usize> {
        Some(self.rx.state.lock().queue.len())
    }

    fn bytes_to_write(&self) -> Option<usize> {
        // Bytes land on the far side as soon as they are written.
        Some(0)
    }
}

impl Drop for LoopbackPort {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl Read for &LoopbackPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io_read(*self, buf)
    }
}

impl Read for LoopbackPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io_read(self, buf)
    }
}

impl Write for &LoopbackPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io_write(*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Write for LoopbackPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io_write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for LoopbackPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackPort")
            .field("name", &self.name)
            .field("available_bytes", &self.bytes_to_read())
            .field("closed", &self.is_closed())
            .finish()
    }
}

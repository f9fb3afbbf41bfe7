//! Read-deadline bookkeeping shared by the backends.
//!
//! A port stores one [`ReadDeadline`]; each read starts a [`ReadTimer`] from
//! it and asks the timer how long it may still block.

use super::config::MAX_TIMEOUT;
use super::error::PortError;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Longest single blocking wait inside a read or write.
///
/// Blocked calls re-check for `close()` at least this often, which bounds
/// how long a read or write in another thread can outlive a close.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Per-port read deadline setting. `None` blocks forever.
#[derive(Debug, Default)]
pub(crate) struct ReadDeadline {
    limit: Mutex<Option<Duration>>,
}

impl ReadDeadline {
    pub(crate) fn from_timeout(timeout: Duration) -> Self {
        Self {
            limit: Mutex::new(limit_for(timeout)),
        }
    }

    /// Store a new limit and return what was stored.
    pub(crate) fn set(&self, timeout: Duration) -> Option<Duration> {
        let limit = limit_for(timeout);
        *self.limit.lock() = limit;
        limit
    }

    pub(crate) fn get(&self) -> Option<Duration> {
        *self.limit.lock()
    }

    /// Begin timing one read.
    pub(crate) fn start(&self) -> ReadTimer {
        ReadTimer {
            limit: self.get(),
            started: Instant::now(),
        }
    }
}

fn limit_for(timeout: Duration) -> Option<Duration> {
    if timeout.is_zero() || timeout == MAX_TIMEOUT {
        None
    } else {
        Some(timeout)
    }
}

/// How long a read may still block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wait {
    Forever,
    For(Duration),
    Expired,
}

/// Tracks the deadline of a single read call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReadTimer {
    limit: Option<Duration>,
    started: Instant,
}

impl ReadTimer {
    pub(crate) fn wait(&self) -> Wait {
        match self.limit {
            None => Wait::Forever,
            Some(limit) => {
                let elapsed = self.started.elapsed();
                if elapsed >= limit {
                    Wait::Expired
                } else {
                    Wait::For(limit - elapsed)
                }
            }
        }
    }

    /// Next blocking slice, capped at `max`. `None` once the deadline passed.
    pub(crate) fn slice(&self, max: Duration) -> Option<Duration> {
        match self.wait() {
            Wait::Forever => Some(max),
            Wait::For(remaining) => Some(remaining.min(max)),
            Wait::Expired => None,
        }
    }

    pub(crate) fn expired(&self) -> PortError {
        PortError::DeadlineExceeded(self.limit.unwrap_or(MAX_TIMEOUT))
    }
}

use crate::config::ConfigError;
use crate::port::PortError;
use std::fmt;

/// Unified error for opening a port from settings.
///
/// Port operations on their own return [`PortError`]; this type only adds
/// the settings failures that can happen before a port exists.
#[derive(Debug)]
pub enum Error {
    Config(ConfigError),
    Port(PortError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "settings error: {e}"),
            Self::Port(e) => write!(f, "serial port error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Port(e) => Some(e),
        }
    }
}

// Implement `From` conversions to allow the `?` operator to work seamlessly.
impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<PortError> for Error {
    fn from(err: PortError) -> Self {
        Error::Port(err)
    }
}

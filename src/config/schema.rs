//! Settings schema definitions.
//!
//! This module defines the structure of the settings file using serde.
//! Every section has defaults, so an empty file (or no file) is valid.

use super::error::{ConfigError, ConfigResult};
use crate::port::{Parity, PortConfig, StopBits};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root settings structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Port to open
    pub port: PortSection,
    /// Hardware testing configuration
    pub testing: TestingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// `[port]` section: what a host program should open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortSection {
    /// Device name or alias
    pub name: Option<String>,
    /// Baud rate
    pub baud: u32,
    /// Data bits per frame (backend default when unset)
    pub size: Option<u8>,
    pub parity: Option<Parity>,
    pub stop_bits: Option<StopBits>,
    /// Read deadline to apply after opening, in milliseconds
    pub read_deadline_ms: Option<u64>,
    /// Friendly names for devices, e.g. `arduino = "/dev/ttyACM0"`
    pub aliases: HashMap<String, String>,
}

impl Default for PortSection {
    fn default() -> Self {
        Self {
            name: None,
            baud: 9600,
            size: None,
            parity: None,
            stop_bits: None,
            read_deadline_ms: None,
            aliases: HashMap::new(),
        }
    }
}

impl PortSection {
    /// Resolve a port name through aliases
    pub fn resolve_name(&self, name: &str) -> String {
        self.aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Read deadline as Duration, if one is configured
    pub fn read_deadline(&self) -> Option<Duration> {
        self.read_deadline_ms.map(Duration::from_millis)
    }

    /// Build the port configuration this section describes.
    pub fn to_port_config(&self) -> ConfigResult<PortConfig> {
        let name = self
            .name
            .as_deref()
            .ok_or_else(|| ConfigError::MissingRequired("port.name".to_string()))?;
        if self.baud == 0 {
            return Err(ConfigError::validation("port.baud", "must be non-zero"));
        }

        Ok(PortConfig {
            name: self.resolve_name(name),
            baud: self.baud,
            size: self.size,
            parity: self.parity,
            stop_bits: self.stop_bits,
        })
    }
}

/// Hardware testing configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestingConfig {
    /// Test port name
    pub port: Option<String>,
    /// Test baud rate
    pub baud: u32,
    /// Whether a loopback plug is fitted on the test port
    pub loopback_enabled: bool,
    /// Test timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: 9600,
            loopback_enabled: false,
            timeout_ms: 2000,
        }
    }
}

impl TestingConfig {
    /// Get the test timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Port configuration for the test device, if one is named.
    pub fn port_config(&self) -> Option<PortConfig> {
        self.port
            .as_ref()
            .map(|name| PortConfig::new(name.clone(), self.baud))
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. "info" or
    /// "serial_stream=debug"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(ConfigError::validation(
                "logging.format",
                format!("unknown format '{other}'"),
            )),
        }
    }
}

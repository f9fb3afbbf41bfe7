//! Utility functions for hardware testing.
//!
//! Provides the test-port fixture, skip macros and timing helpers.

use serial_stream::config::{ConfigLoader, TestingConfig};
use serial_stream::port::{open_port, NativePort, PortConfig, SerialPortAdapter};
use std::time::{Duration, Instant};

/// Test port settings, from `[testing]` or `TEST_PORT` and friends.
pub struct TestPortConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub loopback_enabled: bool,
    pub timeout: Duration,
}

impl TestPortConfig {
    /// Resolve the test port, or `None` when no device is named.
    pub fn from_env() -> Option<Self> {
        Self::from_testing(&ConfigLoader::with_defaults().settings().testing)
    }

    pub fn from_testing(testing: &TestingConfig) -> Option<Self> {
        let port_name = testing.port.clone()?;
        Some(TestPortConfig {
            port_name,
            baud_rate: testing.baud,
            loopback_enabled: testing.loopback_enabled,
            timeout: testing.timeout(),
        })
    }

    pub fn to_port_config(&self) -> PortConfig {
        PortConfig::new(self.port_name.clone(), self.baud_rate)
    }
}

/// Timing helper for measuring operation duration.
pub struct TimingHelper {
    start: Instant,
    name: String,
}

impl TimingHelper {
    pub fn new(name: &str) -> Self {
        println!("⏱️  Starting: {}", name);
        TimingHelper {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        println!("✅ Completed: {} in {:?}", self.name, elapsed);
        elapsed
    }
}

/// Test fixture wrapping an open native port.
pub struct PortTestFixture {
    pub port: NativePort,
    config: TestPortConfig,
}

impl PortTestFixture {
    /// Open the configured test port with empty buffers.
    pub fn setup() -> Option<Self> {
        let config = TestPortConfig::from_env()?;

        println!(
            "Setting up test fixture for {} at {} baud",
            config.port_name, config.baud_rate
        );

        let port = match open_port(config.to_port_config()) {
            Ok(p) => p,
            Err(e) => {
                println!("Failed to open port: {}", e);
                return None;
            }
        };
        if let Err(e) = port.clear_buffers() {
            println!("Failed to clear buffers: {}", e);
        }

        Some(PortTestFixture { port, config })
    }

    pub fn port(&self) -> &NativePort {
        &self.port
    }

    pub fn is_loopback(&self) -> bool {
        self.config.loopback_enabled
    }

    pub fn port_name(&self) -> &str {
        &self.config.port_name
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }
}

impl Drop for PortTestFixture {
    fn drop(&mut self) {
        println!("Tearing down test fixture for {}", self.config.port_name);
        let _ = self.port.close();
    }
}

/// Skip test with a clear message if hardware is not available.
#[macro_export]
macro_rules! skip_without_hardware {
    () => {
        match $crate::hardware::utils::PortTestFixture::setup() {
            Some(fixture) => fixture,
            None => {
                println!("⏭️  Skipping: TEST_PORT environment variable not set or port unavailable");
                println!("   Set TEST_PORT=COM3 (or /dev/ttyUSB0) to run hardware tests");
                return;
            }
        }
    };
}

/// Skip test with a clear message if loopback is not enabled.
#[macro_export]
macro_rules! skip_without_loopback {
    () => {{
        let fixture = $crate::skip_without_hardware!();
        if !fixture.is_loopback() {
            println!("⏭️  Skipping: TEST_LOOPBACK not set to 1");
            println!("   This test requires a loopback adapter (TX connected to RX)");
            return;
        }
        fixture
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_testing_requires_port() {
        assert!(TestPortConfig::from_testing(&TestingConfig::default()).is_none());

        let testing = TestingConfig {
            port: Some("COM3".to_string()),
            baud: 115200,
            ..TestingConfig::default()
        };
        let config = TestPortConfig::from_testing(&testing).unwrap();
        assert_eq!(config.to_port_config(), PortConfig::new("COM3", 115200));
        assert_eq!(config.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_timing_helper() {
        let timer = TimingHelper::new("test operation");
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = timer.finish();
        assert!(elapsed >= Duration::from_millis(10));
    }
}

//! Settings loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Settings;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_STREAM";

/// Settings file name
const CONFIG_FILE_NAME: &str = "serial-stream.toml";

/// Environment variable for explicit settings path
const CONFIG_PATH_ENV: &str = "SERIAL_STREAM_CONFIG";

/// Settings loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved settings file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded settings
    pub settings: Settings,
}

impl ConfigLoader {
    /// Load settings using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SERIAL_STREAM_CONFIG` environment variable (explicit path)
    /// 2. `./serial-stream.toml` (current directory)
    /// 3. `<platform config dir>/serial-stream/serial-stream.toml`
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables can override any file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut settings = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Settings::default()
        };

        apply_env_overrides(&mut settings)?;

        Ok(Self {
            config_path,
            settings,
        })
    }

    /// Load settings from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let mut settings = load_from_file(&path)?;
        apply_env_overrides(&mut settings)?;

        Ok(Self {
            config_path: Some(path),
            settings,
        })
    }

    /// Create a loader with default settings (no file).
    ///
    /// Environment overrides that fail to parse are ignored here.
    pub fn with_defaults() -> Self {
        let mut settings = Settings::default();
        let _ = apply_env_overrides(&mut settings);

        Self {
            config_path: None,
            settings,
        }
    }

    /// Get the loaded settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a mutable reference to the settings.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Consume the loader and return the settings.
    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Save the current settings to file.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self
            .config_path
            .as_ref()
            .ok_or_else(|| ConfigError::MissingRequired("No config file path set".to_string()))?;

        save_to_file(&self.settings, path)
    }

    /// Save the current settings to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.settings, path.as_ref())
    }

    /// Reload settings from file (if path is set).
    pub fn reload(&mut self) -> ConfigResult<()> {
        if let Some(ref path) = self.config_path {
            self.settings = load_from_file(path)?;
            apply_env_overrides(&mut self.settings)?;
        }
        Ok(())
    }
}

/// Resolve the settings file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Get the default config directory for creating new settings files.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "serial-stream").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default settings file path for creating new settings files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

fn save_to_file(settings: &Settings, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// First set variable among `names`, with the name that supplied it.
fn env_first(names: &[&str]) -> Option<(String, String)> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok().map(|val| (name.to_string(), val)))
}

fn env_parse<T: FromStr>(names: &[&str], message: &str) -> ConfigResult<Option<T>> {
    match env_first(names) {
        Some((var, val)) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_parse(var, message)),
        None => Ok(None),
    }
}

/// Apply environment variable overrides to the settings.
///
/// Environment variables follow the pattern `SERIAL_STREAM_<SECTION>_<KEY>`,
/// for example `SERIAL_STREAM_PORT_BAUD=115200`. The hardware-test variables
/// `TEST_PORT`, `TEST_BAUD`, `TEST_TIMEOUT` and `TEST_LOOPBACK` are also
/// honored.
fn apply_env_overrides(settings: &mut Settings) -> ConfigResult<()> {
    let port_name = format!("{ENV_PREFIX}_PORT_NAME");
    let port_baud = format!("{ENV_PREFIX}_PORT_BAUD");
    let port_deadline = format!("{ENV_PREFIX}_PORT_READ_DEADLINE_MS");
    let testing_port = format!("{ENV_PREFIX}_TESTING_PORT");
    let testing_baud = format!("{ENV_PREFIX}_TESTING_BAUD");
    let testing_timeout = format!("{ENV_PREFIX}_TESTING_TIMEOUT_MS");
    let log_level = format!("{ENV_PREFIX}_LOG_LEVEL");
    let log_format = format!("{ENV_PREFIX}_LOG_FORMAT");

    // Port overrides
    if let Some((_, val)) = env_first(&[port_name.as_str()]) {
        settings.port.name = Some(val);
    }
    if let Some(baud) = env_parse(&[port_baud.as_str()], "Invalid baud rate")? {
        settings.port.baud = baud;
    }
    if let Some(ms) = env_parse(&[port_deadline.as_str()], "Invalid read deadline")? {
        settings.port.read_deadline_ms = Some(ms);
    }

    // Testing overrides (also support legacy TEST_PORT etc.)
    if let Some((_, val)) = env_first(&[testing_port.as_str(), "TEST_PORT"]) {
        settings.testing.port = Some(val);
    }
    if let Some(baud) = env_parse(&[testing_baud.as_str(), "TEST_BAUD"], "Invalid baud rate")? {
        settings.testing.baud = baud;
    }
    if let Some(ms) = env_parse(&[testing_timeout.as_str(), "TEST_TIMEOUT"], "Invalid timeout")? {
        settings.testing.timeout_ms = ms;
    }
    if let Some((_, val)) = env_first(&["TEST_LOOPBACK", "LOOPBACK_ENABLED"]) {
        settings.testing.loopback_enabled = val.eq_ignore_ascii_case("true") || val == "1";
    }

    // Logging overrides
    if let Some((_, val)) = env_first(&[log_level.as_str()]) {
        settings.logging.level = val;
    }
    if let Some((_, val)) = env_first(&[log_format.as_str()]) {
        settings.logging.format = val.parse()?;
    }

    Ok(())
}

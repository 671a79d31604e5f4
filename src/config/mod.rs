//! Configuration module
//!
//! Holds the static lookup table that drives switching: which HID device to
//! watch, which monitor input to select for each presence state, and the VCP
//! values of the known inputs. The defaults are the built-in constants; a TOML
//! file may override them but is only ever read, never written.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Product name of the keyboard whose presence selects the input
pub const DEFAULT_TARGET_NAME: &str = "Corsair K70R Gaming Keyboard";

/// Input selected while the target device is attached
pub const DEFAULT_PLUGGED_IN: &str = "DP2";

/// Input selected while the target device is absent
pub const DEFAULT_UNPLUGGED: &str = "DP1";

/// Poll interval of the switch loop
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Standard MCCS input source values (VCP feature 0x60)
pub const DEFAULT_INPUT_CODES: [(&str, u32); 4] = [
    ("DP1", 0x0F),
    ("DP2", 0x10),
    ("HDMI1", 0x11),
    ("HDMI2", 0x12),
];

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Watched device
    #[serde(default)]
    pub device: DeviceConfig,

    /// Presence to input mapping
    #[serde(default)]
    pub switching: SwitchingConfig,

    /// Symbolic input name to VCP value
    #[serde(default)]
    pub inputs: InputTable,
}

/// General configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,
    /// Image used for the tray icon (built-in glyph if not set)
    pub icon: Option<PathBuf>,
}

/// Device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// HID product name, matched exactly
    #[serde(default = "default_target_name")]
    pub name: String,
}

fn default_target_name() -> String {
    DEFAULT_TARGET_NAME.to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_target_name(),
        }
    }
}

/// Switching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchingConfig {
    /// Input to select when the device is attached
    #[serde(default = "default_plugged_in")]
    pub plugged_in: String,
    /// Input to select when the device is removed
    #[serde(default = "default_unplugged")]
    pub unplugged: String,
    /// Poll interval in ms
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_plugged_in() -> String {
    DEFAULT_PLUGGED_IN.to_string()
}

fn default_unplugged() -> String {
    DEFAULT_UNPLUGGED.to_string()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for SwitchingConfig {
    fn default() -> Self {
        Self {
            plugged_in: default_plugged_in(),
            unplugged: default_unplugged(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl SwitchingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Immutable table of symbolic input names and their VCP values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputTable(BTreeMap<String, u32>);

impl Default for InputTable {
    fn default() -> Self {
        Self(
            DEFAULT_INPUT_CODES
                .iter()
                .map(|(name, code)| (name.to_string(), *code))
                .collect(),
        )
    }
}

impl InputTable {
    /// Resolve a symbolic name to its VCP value
    pub fn resolve(&self, name: &str) -> Option<u32> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(name, code)| (name.as_str(), *code))
    }
}

impl FromIterator<(String, u32)> for InputTable {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// File to read: the explicit path if given, else the first search path
    /// that exists. `None` means run on the defaults.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => first_existing(Self::search_paths()),
        }
    }

    /// Locations checked by [`Config::locate`], in order
    pub fn search_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("hidswitch/config.toml")),
            Some(PathBuf::from("./hidswitch.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Reject settings the switch loop cannot run with.
    ///
    /// Called after logging is up so the warnings for unmapped inputs are seen.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.switching.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "switching.poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.device.name.trim().is_empty() {
            return Err(ConfigError::Invalid("device.name must not be empty".to_string()));
        }

        // Unknown inputs are silently ignored when switching, so only warn here.
        for input in [&self.switching.plugged_in, &self.switching.unplugged] {
            if !self.inputs.contains(input) {
                tracing::warn!("Input '{}' is not in the input table and will be ignored", input);
            }
        }

        Ok(())
    }
}

fn first_existing(paths: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    paths.into_iter().find(|path| path.exists())
}

/// Generate a sample configuration file
pub fn generate_sample_config() -> ConfigResult<String> {
    let config = Config {
        device: DeviceConfig {
            name: "My USB Keyboard".to_string(),
        },
        switching: SwitchingConfig {
            plugged_in: "HDMI1".to_string(),
            unplugged: "DP1".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    Ok(toml::to_string_pretty(&config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.device.name, "Corsair K70R Gaming Keyboard");
        assert_eq!(config.switching.plugged_in, "DP2");
        assert_eq!(config.switching.unplugged, "DP1");
        assert_eq!(config.switching.poll_interval(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_input_codes() {
        let inputs = InputTable::default();
        assert_eq!(inputs.resolve("DP1"), Some(0x0F));
        assert_eq!(inputs.resolve("DP2"), Some(0x10));
        assert_eq!(inputs.resolve("HDMI1"), Some(0x11));
        assert_eq!(inputs.resolve("HDMI2"), Some(0x12));
        assert_eq!(inputs.resolve("NOT_A_REAL_INPUT"), None);
        assert_eq!(inputs.iter().count(), 4);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[device]\nname = \"Test Keyboard\"").unwrap();

        let loaded = Config::load(file.path()).unwrap();
        assert_eq!(loaded.device.name, "Test Keyboard");
        assert_eq!(loaded.switching.plugged_in, DEFAULT_PLUGGED_IN);
        assert_eq!(loaded.inputs, InputTable::default());
    }

    #[test]
    fn test_custom_input_table() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[switching]\nplugged_in = \"USBC\"\n\n[inputs]\nUSBC = 27\nDP1 = 15"
        )
        .unwrap();

        let loaded = Config::load(file.path()).unwrap();
        assert_eq!(loaded.inputs.resolve("USBC"), Some(27));
        assert_eq!(loaded.inputs.resolve("HDMI2"), None);
        assert_eq!(loaded.switching.plugged_in, "USBC");
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[switching]\npoll_interval_ms = 0").unwrap();

        let loaded = Config::load(file.path()).unwrap();
        assert!(matches!(loaded.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let explicit = Path::new("/definitely/not/here/hidswitch.toml");
        assert_eq!(Config::locate(Some(explicit)), Some(explicit.to_path_buf()));
    }

    #[test]
    fn test_first_existing_search_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let user = dir.path().join("config.toml");
        let local = dir.path().join("hidswitch.toml");
        std::fs::write(&local, "").unwrap();

        assert_eq!(
            first_existing([user.clone(), local.clone()]),
            Some(local.clone())
        );

        std::fs::write(&user, "").unwrap();
        assert_eq!(first_existing([user.clone(), local]), Some(user));
        assert_eq!(first_existing([dir.path().join("nope.toml")]), None);
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load(Path::new("/definitely/not/here/hidswitch.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_sample_config() {
        let sample = generate_sample_config().unwrap();
        let parsed: Config = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.device.name, "My USB Keyboard");
        assert_eq!(parsed.switching.plugged_in, "HDMI1");
        assert_eq!(parsed.inputs.resolve("HDMI1"), Some(0x11));
    }
}

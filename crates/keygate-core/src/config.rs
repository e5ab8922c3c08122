//! Application configuration.
//!
//! Loaded from TOML. Every section and field is optional; missing values fall
//! back to the defaults in [`crate::constants`]. Lookup order used by
//! [`AppConfig::load`]:
//!
//! 1. an explicit path (fails if the file is missing),
//! 2. `./keygate.toml` in the working directory,
//! 3. built-in defaults.
//!
//! The `KEYGATE_POLL_INTERVAL_MS` environment variable overrides the engine
//! poll interval after the file is read.
//!
//! ```
//! use keygate_core::AppConfig;
//!
//! let config = AppConfig::from_toml_str(r#"
//!     [engine]
//!     poll_interval_ms = 50
//!
//!     [[users]]
//!     name = "Matt"
//!     passcode = "1234"
//!     role = "admin"
//! "#).unwrap();
//!
//! assert_eq!(config.engine.poll_interval().as_millis(), 50);
//! assert_eq!(config.users.len(), 1);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::*;
use crate::{Error, InMemoryCredentialStore, Result, Role, User};

/// Timing knobs of the state engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub poll_interval_ms: u64,

    pub debounce_ms: u64,

    pub history_size: usize,

    /// Log every transition at `info` instead of `debug`.
    pub debug: bool,
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            history_size: DEFAULT_HISTORY_SIZE,
            debug: false,
        }
    }
}

/// Behaviour of the gate controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub passcode_length: usize,

    pub open_angle: u16,

    pub closed_angle: u16,

    pub close_countdown_secs: u32,

    pub message_secs: u64,
}

impl GateConfig {
    pub fn message_duration(&self) -> Duration {
        Duration::from_secs(self.message_secs)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            passcode_length: DEFAULT_PASSCODE_LENGTH,
            open_angle: DEFAULT_OPEN_ANGLE,
            closed_angle: DEFAULT_CLOSED_ANGLE,
            close_countdown_secs: DEFAULT_CLOSE_COUNTDOWN_SECS,
            message_secs: DEFAULT_MESSAGE_SECS,
        }
    }
}

/// Geometry of the character display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub lines: usize,

    pub columns: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            lines: DEFAULT_DISPLAY_LINES,
            columns: DEFAULT_DISPLAY_COLUMNS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,

    pub gate: GateConfig,

    pub display: DisplayConfig,

    pub users: Vec<User>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            gate: GateConfig::default(),
            display: DisplayConfig::default(),
            users: default_users(),
        }
    }
}

/// Demonstration users shipped when no configuration provides any.
fn default_users() -> Vec<User> {
    [
        ("Matt", "1234", Role::Admin),
        ("Alex", "4321", Role::User),
        ("Shalini", "1111", Role::User),
        ("Manny", "2222", Role::User),
        ("Zach", "3333", Role::User),
    ]
    .into_iter()
    .filter_map(|(name, code, role)| User::new(name, code, role).ok())
    .collect()
}

impl AppConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration following the documented lookup order.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let local = Path::new(DEFAULT_CONFIG_FILE);

        let mut config = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_toml_str(&std::fs::read_to_string(path)?)?
            }
            None if local.exists() => {
                info!("Loading configuration from {}", local.display());
                Self::from_toml_str(&std::fs::read_to_string(local)?)?
            }
            None => {
                debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var(ENV_POLL_INTERVAL_MS) {
            match v.trim().parse::<u64>() {
                Ok(ms) => self.engine.poll_interval_ms = ms,
                Err(_) => warn!("Ignoring invalid {}={}", ENV_POLL_INTERVAL_MS, v),
            }
        }
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.engine.poll_interval_ms == 0 {
            return Err(Error::Config("engine.poll_interval_ms must be > 0".into()));
        }
        if self.engine.history_size == 0 {
            return Err(Error::Config("engine.history_size must be > 0".into()));
        }
        if !(MIN_PASSCODE_LENGTH..=MAX_PASSCODE_LENGTH).contains(&self.gate.passcode_length) {
            return Err(Error::Config(format!(
                "gate.passcode_length must be {MIN_PASSCODE_LENGTH}-{MAX_PASSCODE_LENGTH}, got {}",
                self.gate.passcode_length
            )));
        }
        for (field, angle) in [
            ("gate.open_angle", self.gate.open_angle),
            ("gate.closed_angle", self.gate.closed_angle),
        ] {
            if angle > MAX_SERVO_ANGLE {
                return Err(Error::Config(format!(
                    "{field} must be 0-{MAX_SERVO_ANGLE}, got {angle}"
                )));
            }
        }
        if self.gate.close_countdown_secs == 0 {
            return Err(Error::Config("gate.close_countdown_secs must be > 0".into()));
        }
        if self.gate.message_secs == 0 {
            return Err(Error::Config("gate.message_secs must be > 0".into()));
        }
        if self.display.lines == 0 || self.display.columns == 0 {
            return Err(Error::Config("display size must be non-zero".into()));
        }
        if let Some(user) = self
            .users
            .iter()
            .find(|u| u.passcode.len() != self.gate.passcode_length)
        {
            return Err(Error::Config(format!(
                "passcode of {} does not have {} digits",
                user.name, self.gate.passcode_length
            )));
        }
        Ok(())
    }

    /// Build the credential store for the configured users.
    pub fn credential_store(&self) -> Result<InMemoryCredentialStore> {
        InMemoryCredentialStore::from_users(self.users.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CredentialStore;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.users.len(), 5);
        assert_eq!(config.engine.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_default_users_verify() {
        let store = AppConfig::default().credential_store().unwrap();
        assert_eq!(store.verify("1111").unwrap().name, "Shalini");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml_str(
            r#"
            [gate]
            close_countdown_secs = 3

            [display]
            columns = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.gate.close_countdown_secs, 3);
        assert_eq!(config.gate.open_angle, DEFAULT_OPEN_ANGLE);
        assert_eq!(config.display.columns, 20);
        assert_eq!(config.display.lines, DEFAULT_DISPLAY_LINES);
    }

    #[test]
    fn test_users_section_replaces_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [[users]]
            name = "Ana"
            passcode = "5555"

            [[users]]
            name = "Bo"
            passcode = "6666"
            role = "admin"
            active = false
            "#,
        )
        .unwrap();
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users[0].role, Role::User);
        assert!(config.users[0].active);
        assert!(config.users[1].is_admin());
        assert!(!config.users[1].active);
    }

    #[test]
    fn test_invalid_passcode_rejected() {
        let result = AppConfig::from_toml_str(
            r#"
            [[users]]
            name = "Ana"
            passcode = "12ab"
            "#,
        );
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_passcode_length_mismatch_rejected() {
        let result = AppConfig::from_toml_str(
            r#"
            [[users]]
            name = "Ana"
            passcode = "123456"
            "#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let result = AppConfig::from_toml_str("[engine]\npoll_interval_ms = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_angle_out_of_range_rejected() {
        let result = AppConfig::from_toml_str("[gate]\nopen_angle = 270\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gate.toml");
        std::fs::write(&path, "[gate]\nclose_countdown_secs = 3\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.gate.close_countdown_secs, 3);
        assert_eq!(config.users.len(), 5);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/keygate.toml")));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_example_file_parses() {
        let config =
            AppConfig::from_toml_str(include_str!("../../../keygate.example.toml")).unwrap();
        assert_eq!(
            config,
            AppConfig {
                users: config.users.clone(),
                ..AppConfig::default()
            }
        );
        assert_eq!(config.users.len(), 3);
        assert!(config.users[2].valid_until.is_some());
    }
}

//! Runtime configuration
//!
//! Read from `$PADBRIDGE_CONFIG` or `<config dir>/padbridge/config.toml`. A
//! missing file means defaults; `PADBRIDGE_HOST` and `PADBRIDGE_PORT` override
//! the endpoint afterwards.
//!
//! ```toml
//! log_level = "debug"
//!
//! [endpoint]
//! host = "192.168.1.20"
//! port = 51914
//!
//! [session]
//! send_interval_ms = 30
//! resend_idle = false
//! ```

use crate::controller::InputSettings;
use crate::protocol;
use crate::session::{SessionSettings, POLL_INTERVAL, SEND_INTERVAL};
use crate::transport::{TransportSettings, HANDSHAKE_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, Level};

const CONFIG_ENV: &str = "PADBRIDGE_CONFIG";
const HOST_ENV: &str = "PADBRIDGE_HOST";
const PORT_ENV: &str = "PADBRIDGE_PORT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub endpoint: EndpointConfig,
    pub session: SessionConfig,
    pub controller: ControllerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            endpoint: EndpointConfig::default(),
            session: SessionConfig::default(),
            controller: ControllerConfig::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: protocol::DEFAULT_HOST.to_string(),
            port: protocol::DEFAULT_PORT,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub send_interval_ms: u64,
    pub poll_interval_ms: u64,
    pub handshake_timeout_ms: u64,
    pub resend_idle: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            send_interval_ms: SEND_INTERVAL.as_millis() as u64,
            poll_interval_ms: POLL_INTERVAL.as_millis() as u64,
            handshake_timeout_ms: HANDSHAKE_TIMEOUT.as_millis() as u64,
            resend_idle: true,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    pub joystick_deadzone: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            joystick_deadzone: InputSettings::default().joystick_deadzone,
        }
    }
}

impl Config {
    /// Loads the configuration from its default location plus env overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!("No config file at {}, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading config from {}", path.display());
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Applies endpoint overrides looked up through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV) {
            debug!("Endpoint host overridden to {}", host);
            self.endpoint.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.endpoint.port = port.trim().parse().map_err(|e| ConfigError::InvalidValue {
                field: PORT_ENV,
                reason: format!("{port:?}: {e}"),
            })?;
            debug!("Endpoint port overridden to {}", self.endpoint.port);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| -> Result<(), ConfigError> {
            Err(ConfigError::InvalidValue {
                field,
                reason: reason.to_string(),
            })
        };

        if self.endpoint.host.trim().is_empty() {
            return invalid("endpoint.host", "must not be empty");
        }
        if self.endpoint.port == 0 {
            return invalid("endpoint.port", "must not be 0");
        }
        if self.session.send_interval_ms == 0 {
            return invalid("session.send_interval_ms", "must be positive");
        }
        if self.session.poll_interval_ms == 0 {
            return invalid("session.poll_interval_ms", "must be positive");
        }
        if self.session.handshake_timeout_ms == 0 {
            return invalid("session.handshake_timeout_ms", "must be positive");
        }
        if !(0.0..1.0).contains(&self.controller.joystick_deadzone) {
            return invalid("controller.joystick_deadzone", "must be in [0, 1)");
        }
        if self.log_level.parse::<Level>().is_err() {
            return invalid("log_level", "expected trace, debug, info, warn or error");
        }
        Ok(())
    }

    pub fn log_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            host: self.endpoint.host.clone(),
            port: self.endpoint.port,
            handshake_timeout: Duration::from_millis(self.session.handshake_timeout_ms),
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            send_interval: Duration::from_millis(self.session.send_interval_ms),
            poll_interval: Duration::from_millis(self.session.poll_interval_ms),
            resend_idle: self.session.resend_idle,
        }
    }

    pub fn input_settings(&self) -> InputSettings {
        InputSettings {
            joystick_deadzone: self.controller.joystick_deadzone,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("padbridge").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_protocol_constants() {
        let config = Config::default();
        assert_eq!(config.endpoint.host, "127.0.0.1");
        assert_eq!(config.endpoint.port, 51914);
        assert_eq!(config.session.send_interval_ms, 30);
        assert_eq!(config.session.handshake_timeout_ms, 1000);
        assert!(config.session.resend_idle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            log_level = "debug"

            [endpoint]
            port = 6000

            [session]
            resend_idle = false
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint.host, "127.0.0.1");
        assert_eq!(config.endpoint.port, 6000);
        assert!(!config.session.resend_idle);
        assert_eq!(config.session.send_interval_ms, 30);
        assert_eq!(config.log_level(), Level::DEBUG);
    }

    #[test]
    fn malformed_toml_is_rejected() {
        assert!(Config::from_toml("[endpoint]\nport = \"not a port\"").is_err());
    }

    #[test]
    fn env_overrides_endpoint() {
        let env: HashMap<&str, &str> =
            HashMap::from([(HOST_ENV, "10.0.0.7"), (PORT_ENV, "7000")]);
        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.endpoint.host, "10.0.0.7");
        assert_eq!(config.endpoint.port, 7000);
        let transport = config.transport_settings();
        assert_eq!(transport.port, 7000);
        assert_eq!(transport.handshake_timeout, Duration::from_secs(1));
    }

    #[test]
    fn bad_port_override_is_an_error() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| (key == PORT_ENV).then(|| "99999".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn validation_rejects_nonsense() {
        let mut config = Config::default();
        config.session.send_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.controller.joystick_deadzone = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.endpoint.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("padbridge-test-{}.toml", std::process::id()));
        fs::write(&path, "[endpoint]\nhost = \"gimx.local\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.endpoint.host, "gimx.local");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = Config::from_file(Path::new("/nonexistent/padbridge.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}

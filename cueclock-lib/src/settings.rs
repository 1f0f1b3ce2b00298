//! Persisted client settings.
//!
//! Stored as a small JSON document; every field has a default so an
//! empty or partial file still loads.

use std::fmt::{Display, Formatter};
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

/// User configuration consumed by the client.
///
/// The sync engine only reads `auto_reload_on_error` and `debug`;
/// `host` and `port` belong to the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Reconnect and reload automatically on decode or transport
    /// failure. When false the client halts and waits for manual
    /// intervention.
    #[serde(default = "default_auto_reload")]
    pub auto_reload_on_error: bool,
    /// Forward every raw frame and decoded snapshot to the diagnostic
    /// log. No effect on sync behavior.
    #[serde(default)]
    pub debug: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    800
}

fn default_auto_reload() -> bool {
    true
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auto_reload_on_error: default_auto_reload(),
            debug: false,
        }
    }
}

/// Error type for settings IO and parsing.
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "settings io error: {}", err),
            Self::Parse(err) => write!(f, "settings parse error: {}", err),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl ClientSettings {
    /// Load settings from a JSON file, falling back to defaults when
    /// the file does not exist.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            info!("no settings file at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write settings to a JSON file.
    ///
    /// # Errors
    /// Returns an error when the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_loads_defaults() {
        let settings: ClientSettings = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(settings, ClientSettings::default());
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.port, 800);
        assert!(settings.auto_reload_on_error);
        assert!(!settings.debug);
    }

    #[test]
    fn partial_document_keeps_remaining_defaults() {
        let settings: ClientSettings =
            serde_json::from_str(r#"{"host":"stage-rack","debug":true}"#).expect("deserialize");
        assert_eq!(settings.host, "stage-rack");
        assert_eq!(settings.port, 800);
        assert!(settings.debug);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");

        let settings = ClientSettings {
            host: "10.0.0.5".to_string(),
            port: 9001,
            auto_reload_on_error: false,
            debug: true,
        };
        settings.save(&path).expect("save");
        assert_eq!(ClientSettings::load(&path).expect("load"), settings);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = ClientSettings::load(&dir.path().join("absent.json")).expect("load");
        assert_eq!(settings, ClientSettings::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").expect("write");
        assert!(matches!(
            ClientSettings::load(&path),
            Err(SettingsError::Parse(_))
        ));
    }
}

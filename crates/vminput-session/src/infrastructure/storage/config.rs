//! TOML-based configuration persistence for the input session.
//!
//! Reads and writes `SessionConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\VmInput\config.toml`
//! - Linux:    `~/.config/vminput/config.toml`
//! - macOS:    `~/Library/Application Support/VmInput/config.toml`
//!
//! # Serde default values (for beginners)
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return
//! value of `some_fn()` when the field is absent from the TOML file.  This
//! lets the session start correctly on first run (before a config file
//! exists) and when upgrading from an older file missing newer fields.
//!
//! ```toml
//! [input]
//! host_combo = ["RightCtrl"]
//! auto_capture = true
//! capture_delay_ms = 300
//!
//! [led]
//! sync_enabled = true
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use vminput_core::scancode::{KeyFlags, ScanCode};

use crate::application::combo::HostComboKeySet;
use crate::application::handler::SessionOptions;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level session configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub led: LedConfig,
}

/// Keyboard capture behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    /// Host combo key names (see [`parse_combo_key`] for the vocabulary).
    #[serde(default = "default_host_combo")]
    pub host_combo: Vec<String>,
    /// Capture the keyboard automatically when a view gains focus.
    #[serde(default = "default_true")]
    pub auto_capture: bool,
    /// Forward Ctrl+Alt+Del to the guest instead of force-releasing.
    #[serde(default)]
    pub pass_ctrl_alt_del: bool,
    /// Deferral in milliseconds between a capture request and the grab.
    #[serde(default = "default_capture_delay_ms")]
    pub capture_delay_ms: u64,
    /// Guest uses absolute pointer integration (no mouse grab needed).
    #[serde(default = "default_true")]
    pub absolute_pointer: bool,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// LED synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedConfig {
    /// Mirror guest lock state onto the host keyboard LEDs.
    #[serde(default = "default_true")]
    pub sync_enabled: bool,
    /// Synthetic lock-toggle budget per session.
    #[serde(default = "default_adaption_budget")]
    pub adaption_budget: u8,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host_combo() -> Vec<String> {
    vec!["RightCtrl".to_string()]
}
fn default_true() -> bool {
    true
}
fn default_capture_delay_ms() -> u64 {
    300
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_adaption_budget() -> u8 {
    16
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            led: LedConfig::default(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            host_combo: default_host_combo(),
            auto_capture: default_true(),
            pass_ctrl_alt_del: false,
            capture_delay_ms: default_capture_delay_ms(),
            absolute_pointer: default_true(),
            log_level: default_log_level(),
        }
    }
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            sync_enabled: default_true(),
            adaption_budget: default_adaption_budget(),
        }
    }
}

// ── Combo key vocabulary ──────────────────────────────────────────────────────

/// Resolves a combo key name to its canonical scan code and flags.
///
/// Left and right Ctrl/Alt share a base scan code; the right-hand variants
/// are distinguished by the extended flag, which is why the vocabulary
/// names sides explicitly instead of accepting a bare `"Ctrl"`.
pub fn parse_combo_key(name: &str) -> Option<(ScanCode, KeyFlags)> {
    const MOD: u8 = KeyFlags::MODIFIER;
    const EXT_MOD: u8 = KeyFlags::EXTENDED | KeyFlags::MODIFIER;
    let (code, flags) = match name {
        "LeftCtrl" => (ScanCode::LEFT_CTRL, MOD),
        "RightCtrl" => (ScanCode::RIGHT_CTRL, EXT_MOD),
        "LeftShift" => (ScanCode::LEFT_SHIFT, MOD),
        "RightShift" => (ScanCode::RIGHT_SHIFT, MOD),
        "LeftAlt" => (ScanCode::LEFT_ALT, MOD),
        "RightAlt" => (ScanCode::RIGHT_ALT, EXT_MOD),
        "LeftMeta" => (ScanCode::LEFT_META, EXT_MOD),
        "RightMeta" => (ScanCode::RIGHT_META, EXT_MOD),
        _ => return None,
    };
    Some((code, KeyFlags(flags)))
}

impl SessionConfig {
    /// Builds the host combo set, skipping (and logging) unknown names.
    pub fn host_combo_set(&self) -> HostComboKeySet {
        HostComboKeySet::new(self.input.host_combo.iter().filter_map(|name| {
            let parsed = parse_combo_key(name);
            if parsed.is_none() {
                warn!(%name, "unknown host combo key name, ignored");
            }
            parsed
        }))
    }

    /// Resolves the handler options from the on-disk schema.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            auto_capture: self.input.auto_capture,
            pass_ctrl_alt_del: self.input.pass_ctrl_alt_del,
            capture_delay: Duration::from_millis(self.input.capture_delay_ms),
            led_sync: self.led.sync_enabled,
            absolute_pointer: self.input.absolute_pointer,
            adaption_budget: self.led.adaption_budget,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `SessionConfig` from disk, returning `SessionConfig::default()` if
/// the file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<SessionConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: SessionConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Persists `config` to disk.
///
/// Creates the config directory and file if they do not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &SessionConfig) -> Result<(), ConfigError> {
    let path = config_file_path()?;

    // Ensure directory exists before writing.
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("VmInput"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("vminput"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/VmInput
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("VmInput")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        // Fallback for unsupported platforms.
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_documented_defaults() {
        // Arrange / Act
        let cfg = SessionConfig::default();

        // Assert
        assert_eq!(cfg.input.host_combo, vec!["RightCtrl".to_string()]);
        assert!(cfg.input.auto_capture);
        assert!(!cfg.input.pass_ctrl_alt_del);
        assert_eq!(cfg.input.capture_delay_ms, 300);
        assert!(cfg.led.sync_enabled);
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        // Arrange / Act – every field falls back to its serde default
        let cfg: SessionConfig = toml::from_str("").unwrap();

        // Assert
        assert_eq!(cfg, SessionConfig::default());
    }

    #[test]
    fn test_partial_toml_fills_missing_fields() {
        // Arrange
        let text = r#"
            [input]
            host_combo = ["LeftAlt", "RightAlt"]
            pass_ctrl_alt_del = true
        "#;

        // Act
        let cfg: SessionConfig = toml::from_str(text).unwrap();

        // Assert – explicit fields honoured, the rest defaulted
        assert_eq!(cfg.input.host_combo.len(), 2);
        assert!(cfg.input.pass_ctrl_alt_del);
        assert_eq!(cfg.input.capture_delay_ms, 300);
        assert!(cfg.led.sync_enabled);
    }

    #[test]
    fn test_round_trip_through_toml() {
        // Arrange
        let mut cfg = SessionConfig::default();
        cfg.input.host_combo = vec!["LeftMeta".to_string()];
        cfg.led.adaption_budget = 3;

        // Act
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: SessionConfig = toml::from_str(&text).unwrap();

        // Assert
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn test_parse_combo_key_distinguishes_sides_by_extended_flag() {
        // Arrange / Act
        let (left, left_flags) = parse_combo_key("LeftCtrl").unwrap();
        let (right, right_flags) = parse_combo_key("RightCtrl").unwrap();

        // Assert – same base code, extended bit tells them apart
        assert_eq!(left, right);
        assert!(!left_flags.extended());
        assert!(right_flags.extended());
    }

    #[test]
    fn test_unknown_combo_names_are_skipped() {
        // Arrange
        let mut cfg = SessionConfig::default();
        cfg.input.host_combo = vec!["RightCtrl".to_string(), "HyperKey".to_string()];

        // Act
        let combo = cfg.host_combo_set();

        // Assert
        assert_eq!(combo.len(), 1);
        assert!(combo.contains(ScanCode::RIGHT_CTRL, true));
    }

    #[test]
    fn test_session_options_resolution() {
        // Arrange
        let mut cfg = SessionConfig::default();
        cfg.input.capture_delay_ms = 50;
        cfg.led.sync_enabled = false;

        // Act
        let options = cfg.session_options();

        // Assert
        assert_eq!(options.capture_delay, Duration::from_millis(50));
        assert!(!options.led_sync);
        assert!(options.auto_capture);
    }
}

//! TOML configuration for the host agent.
//!
//! Read from the platform config directory unless `--config` points
//! elsewhere:
//! - Windows:  `%APPDATA%\DeskRelay\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/deskrelay/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/DeskRelay/config.toml`
//!
//! Every field has a serde default, so an empty file, a partial file, or no
//! file at all all produce a working configuration:
//!
//! ```toml
//! [relay]
//! url = "wss://relay.example.com/relay"
//!
//! [host]
//! approval = "auto-accept"
//!
//! [recording]
//! output_dir = "/home/me/Videos"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use deskrelay_core::ScreenSize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::lifecycle::HandshakeSettings;
use crate::application::record_screen::RecordingSettings;
use crate::application::stream_screen::StreamSettings;
use crate::infrastructure::recorder::RecorderSettings;
use crate::infrastructure::relay::RelayConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    #[serde(default)]
    pub relay: RelaySection,
    #[serde(default)]
    pub host: HostSection,
    #[serde(default)]
    pub streaming: StreamingSection,
    #[serde(default)]
    pub recording: RecordingSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelaySection {
    #[serde(default = "default_relay_url")]
    pub url: String,
    #[serde(default = "default_reconnect_ms")]
    pub reconnect_interval_ms: u64,
}

/// How incoming connection requests are decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalPolicy {
    /// Ask on the terminal.
    #[default]
    Prompt,
    AutoAccept,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostSection {
    /// Overrides the machine hostname in `host-ready`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computer_name: Option<String>,
    #[serde(default = "default_true")]
    pub reannounce_on_reconnect: bool,
    #[serde(default = "default_handshake_retry_ms")]
    pub handshake_retry_ms: u64,
    #[serde(default = "default_heartbeat_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default)]
    pub approval: ApprovalPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamingSection {
    #[serde(default = "default_stream_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordingSection {
    #[serde(default = "default_chunk_ms")]
    pub chunk_ms: u64,
    #[serde(default = "default_progress_ms")]
    pub progress_interval_ms: u64,
    #[serde(default = "default_fps")]
    pub frames_per_second: u32,
    /// Where finished recordings are written.  Unset means recordings are
    /// discarded on stop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_relay_url() -> String {
    "ws://127.0.0.1:8080/relay".to_string()
}
fn default_reconnect_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_handshake_retry_ms() -> u64 {
    5000
}
fn default_heartbeat_ms() -> u64 {
    5000
}
fn default_stream_interval_ms() -> u64 {
    1000
}
fn default_max_width() -> u32 {
    960
}
fn default_max_height() -> u32 {
    720
}
fn default_jpeg_quality() -> u8 {
    30
}
fn default_chunk_ms() -> u64 {
    1000
}
fn default_progress_ms() -> u64 {
    2000
}
fn default_fps() -> u32 {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            url: default_relay_url(),
            reconnect_interval_ms: default_reconnect_ms(),
        }
    }
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            computer_name: None,
            reannounce_on_reconnect: default_true(),
            handshake_retry_ms: default_handshake_retry_ms(),
            heartbeat_interval_ms: default_heartbeat_ms(),
            approval: ApprovalPolicy::default(),
        }
    }
}

impl Default for StreamingSection {
    fn default() -> Self {
        Self {
            interval_ms: default_stream_interval_ms(),
            max_width: default_max_width(),
            max_height: default_max_height(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

impl Default for RecordingSection {
    fn default() -> Self {
        Self {
            chunk_ms: default_chunk_ms(),
            progress_interval_ms: default_progress_ms(),
            frames_per_second: default_fps(),
            output_dir: None,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ── Conversions into runtime settings ─────────────────────────────────────────

impl HostConfig {
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            url: self.relay.url.clone(),
            reconnect_interval: Duration::from_millis(self.relay.reconnect_interval_ms),
        }
    }

    pub fn handshake_settings(&self, computer_name: String, machine_id: String) -> HandshakeSettings {
        HandshakeSettings {
            computer_name,
            machine_id,
            retry_after: Duration::from_millis(self.host.handshake_retry_ms.max(1)),
            heartbeat_interval: Duration::from_millis(self.host.heartbeat_interval_ms.max(1)),
            reannounce_on_reconnect: self.host.reannounce_on_reconnect,
        }
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            interval: Duration::from_millis(self.streaming.interval_ms.max(1)),
            bounds: self.frame_bounds(),
            jpeg_quality: self.streaming.jpeg_quality,
        }
    }

    pub fn recording_settings(&self) -> RecordingSettings {
        RecordingSettings {
            chunk_duration: Duration::from_millis(self.recording.chunk_ms.max(1)),
            progress_interval: Duration::from_millis(self.recording.progress_interval_ms.max(1)),
        }
    }

    pub fn recorder_settings(&self) -> RecorderSettings {
        RecorderSettings {
            frames_per_second: self.recording.frames_per_second.max(1),
            bounds: self.frame_bounds(),
            jpeg_quality: self.streaming.jpeg_quality,
        }
    }

    fn frame_bounds(&self) -> ScreenSize {
        ScreenSize::new(self.streaming.max_width, self.streaming.max_height)
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// The platform directory holding `config.toml` and `machine-id`.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory
/// cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `HostConfig` from `path`, returning defaults if the file does not
/// exist.
///
/// # Errors
///
/// [`ConfigError::Io`] for file-system errors other than "not found", and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HostConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating the directory if needed.
pub fn save_config(path: &Path, config: &HostConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a default config to `path` when no file exists there yet, so the
/// operator has a file to edit.  Returns `true` if one was written.
///
/// # Errors
///
/// Whatever [`save_config`] returns.
pub fn write_defaults_if_missing(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }
    save_config(path, &HostConfig::default())?;
    Ok(true)
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("DeskRelay"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("deskrelay"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("DeskRelay")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("deskrelay_cfg_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_defaults_match_documented_values() {
        // Arrange / Act
        let cfg = HostConfig::default();

        // Assert
        assert_eq!(cfg.relay.url, "ws://127.0.0.1:8080/relay");
        assert_eq!(cfg.relay.reconnect_interval_ms, 1000);
        assert_eq!(cfg.host.approval, ApprovalPolicy::Prompt);
        assert!(cfg.host.reannounce_on_reconnect);
        assert_eq!((cfg.streaming.max_width, cfg.streaming.max_height), (960, 720));
        assert_eq!(cfg.streaming.jpeg_quality, 30);
        assert_eq!(cfg.recording.chunk_ms, 1000);
        assert_eq!(cfg.recording.progress_interval_ms, 2000);
        assert_eq!(cfg.recording.output_dir, None);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: HostConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        // Arrange
        let toml_str = r#"
[host]
approval = "auto-accept"
reannounce_on_reconnect = false

[recording]
output_dir = "/tmp/recordings"
"#;

        // Act
        let cfg: HostConfig = toml::from_str(toml_str).unwrap();

        // Assert
        assert_eq!(cfg.host.approval, ApprovalPolicy::AutoAccept);
        assert!(!cfg.host.reannounce_on_reconnect);
        assert_eq!(cfg.host.heartbeat_interval_ms, 5000);
        assert_eq!(cfg.recording.output_dir, Some(PathBuf::from("/tmp/recordings")));
        assert_eq!(cfg.recording.frames_per_second, 5);
    }

    #[test]
    fn test_unknown_approval_policy_is_a_parse_error() {
        let result: Result<HostConfig, _> = toml::from_str("[host]\napproval = \"maybe\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = temp_dir();

        let cfg = load_config(&dir.join("config.toml")).unwrap();

        assert_eq!(cfg, HostConfig::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let dir = temp_dir();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[[[ not toml").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("nested").join("config.toml");
        let mut cfg = HostConfig::default();
        cfg.relay.url = "wss://relay.example.com/relay".to_string();
        cfg.host.computer_name = Some("desk-01".to_string());

        // Act
        save_config(&path, &cfg).unwrap();
        let loaded = load_config(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_first_run_writes_loadable_defaults() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("fresh").join("config.toml");

        // Act
        let written = write_defaults_if_missing(&path).unwrap();

        // Assert
        assert!(written);
        assert_eq!(load_config(&path).unwrap(), HostConfig::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_existing_config_is_not_overwritten() {
        let dir = temp_dir();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        assert!(!write_defaults_if_missing(&path).unwrap());
        assert_eq!(load_config(&path).unwrap().logging.level, "debug");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_runtime_settings_follow_config() {
        let mut cfg = HostConfig::default();
        cfg.streaming.interval_ms = 250;
        cfg.recording.frames_per_second = 0;

        assert_eq!(cfg.stream_settings().interval, Duration::from_millis(250));
        assert_eq!(cfg.stream_settings().bounds, ScreenSize::new(960, 720));
        assert_eq!(cfg.recorder_settings().frames_per_second, 1);
        assert_eq!(
            cfg.relay_config().reconnect_interval,
            Duration::from_millis(1000)
        );
        let handshake = cfg.handshake_settings("desk".into(), "id".into());
        assert_eq!(handshake.retry_after, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_handshake_intervals_are_raised_to_one_millisecond() {
        // Arrange
        let toml_str = "[host]\nheartbeat_interval_ms = 0\nhandshake_retry_ms = 0\n";

        // Act
        let cfg: HostConfig = toml::from_str(toml_str).unwrap();
        let handshake = cfg.handshake_settings("desk".into(), "id".into());

        // Assert
        assert_eq!(handshake.heartbeat_interval, Duration::from_millis(1));
        assert_eq!(handshake.retry_after, Duration::from_millis(1));
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("config.toml"), "got {path:?}");
        }
    }
}

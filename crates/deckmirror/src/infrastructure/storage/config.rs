//! TOML-based configuration loading for the daemon.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\DeckMirror\config.toml`
//! - Linux:    `~/.config/deckmirror/config.toml`
//! - macOS:    `~/Library/Application Support/DeckMirror/config.toml`
//!
//! # What is TOML? (for beginners)
//!
//! TOML (Tom's Obvious Minimal Language) is a configuration file format
//! designed to be easy to read and write.  Example:
//!
//! ```toml
//! [mirror]
//! fps = 20.0
//! brightness = 80
//!
//! [pointer]
//! enabled = true
//! ```
//!
//! The `serde` library provides automatic deserialisation between Rust
//! structs and TOML text, and `#[serde(default = "some_fn")]` fills in
//! missing fields, so the daemon works on first run with no file at all.
//!
//! There is intentionally no `save_config`: the file is operator-owned,
//! and runtime rate changes made from the deck are ephemeral.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use deckmirror_core::DEFAULT_RATE;

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
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration read from disk.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub mirror: MirrorConfig,
    #[serde(default)]
    pub pointer: PointerConfig,
}

/// Mirroring behaviour settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MirrorConfig {
    /// Initial refresh rate in frames per second.
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// Deck display brightness percentage (0–100).
    #[serde(default = "default_brightness")]
    pub brightness: u8,
}

/// Pointer (click-on-key-press) settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PointerConfig {
    /// Whether key presses should click the corresponding screen region.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cursor glide/settle time before the click, in milliseconds.
    #[serde(default = "default_move_duration_ms")]
    pub move_duration_ms: u64,
    /// Extra pause between the move and the click, in milliseconds.
    #[serde(default = "default_pre_click_delay_ms")]
    pub pre_click_delay_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_fps() -> f64 {
    DEFAULT_RATE
}
fn default_brightness() -> u8 {
    80
}
fn default_true() -> bool {
    true
}
fn default_move_duration_ms() -> u64 {
    200
}
fn default_pre_click_delay_ms() -> u64 {
    100
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mirror: MirrorConfig::default(),
            pointer: PointerConfig::default(),
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            brightness: default_brightness(),
        }
    }
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            move_duration_ms: default_move_duration_ms(),
            pre_click_delay_ms: default_pre_click_delay_ms(),
        }
    }
}

impl MirrorConfig {
    /// The configured refresh rate, falling back to [`DEFAULT_RATE`]
    /// when the file holds a non-positive or non-finite value.
    pub fn effective_fps(&self) -> f64 {
        if self.fps.is_finite() && self.fps > 0.0 {
            self.fps
        } else {
            DEFAULT_RATE
        }
    }

    /// The configured brightness clamped to the device's 0–100 range.
    pub fn effective_brightness(&self) -> u8 {
        self.brightness.min(100)
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

/// Loads `AppConfig` from disk, returning `AppConfig::default()` if the file
/// does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("DeckMirror"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("deckmirror"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/DeckMirror
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("DeckMirror")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

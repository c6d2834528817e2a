//! Persistent configuration for the daemon.
//!
//! The configuration file is read once at startup and never written
//! back: runtime adjustments (e.g. cycling the refresh rate from the
//! deck itself) live only for the process lifetime.

pub mod config;

pub use config::{load_config, AppConfig, ConfigError, MirrorConfig, PointerConfig};

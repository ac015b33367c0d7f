//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`PINBALL_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use pinball_physics::PhysicsConfig;
use serde::{Serialize, Deserialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Physics scheduler and response tuning
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Table file selection
    #[serde(default)]
    pub table: TableConfig,
    /// Headless run parameters
    #[serde(default)]
    pub run: RunConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`PINBALL_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // PINBALL_PHYSICS__STEP_TIME_US=500 -> physics.step_time_us = 500
        figment = figment.merge(Env::prefixed("PINBALL_").split("__"));

        figment.extract().map_err(ConfigError::from)
    }
}

/// Table configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Path to the RON table file
    pub path: String,
    /// Refuse to run a table that fails validation
    pub strict: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            path: "tables/demo.ron".to_string(),
            strict: false,
        }
    }
}

/// Headless run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Simulated duration in milliseconds
    pub duration_ms: u64,
    /// Host frame length in microseconds
    pub frame_us: u64,
    /// Sleep between frames and follow the real clock
    pub realtime: bool,
    /// Interval between ball state reports in milliseconds
    pub report_interval_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration_ms: 5000,
            frame_us: 16_667,
            realtime: false,
            report_interval_ms: 1000,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace), overridden by `RUST_LOG`
    pub log_level: String,
    /// Log every ball snapshot at each report
    pub log_snapshots: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_snapshots: true,
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    message: String,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

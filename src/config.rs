use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::loader::Timing;
use crate::script::Script;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub timing: TimingConfig,
    pub ui: UiConfig,
    #[serde(default)]
    pub script: ScriptConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Step durations in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Total time each step stays active (default: 5000)
    #[serde(default = "default_step_duration")]
    pub step_duration_ms: u64,
    /// Delay after a step starts before its summary streams (default: 3000)
    #[serde(default = "default_streaming_start")]
    pub streaming_start_ms: u64,
    /// Pause between finishing a step and starting the next (default: 100)
    #[serde(default = "default_grace")]
    pub grace_ms: u64,
}

fn default_step_duration() -> u64 {
    5000
}

fn default_streaming_start() -> u64 {
    3000
}

fn default_grace() -> u64 {
    100
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            step_duration_ms: default_step_duration(),
            streaming_start_ms: default_streaming_start(),
            grace_ms: default_grace(),
        }
    }
}

impl TimingConfig {
    pub fn to_timing(&self) -> Result<Timing> {
        Timing::from_millis(
            self.step_duration_ms,
            self.streaming_start_ms,
            self.grace_ms,
        )
        .context("Invalid timing configuration")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Redraw interval
    pub frame_rate_ms: u64,
    /// Period of one pulse of the active-step marker
    #[serde(default = "default_pulse_period")]
    pub pulse_period_ms: u64,
    /// Fraction of the remaining distance the list scrolls per frame once
    /// animation is enabled (1.0 = jump)
    #[serde(default = "default_scroll_easing")]
    pub scroll_easing: f32,
    /// Quit this long after the last step completes (0 = stay open)
    #[serde(default)]
    pub exit_after_finish_ms: u64,
    /// Heading drawn above the timeline (empty = none)
    #[serde(default = "default_heading")]
    pub heading: String,
}

fn default_pulse_period() -> u64 {
    1200
}

fn default_scroll_easing() -> f32 {
    0.25
}

fn default_heading() -> String {
    "Researching".to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            frame_rate_ms: 50,
            pulse_period_ms: default_pulse_period(),
            scroll_easing: default_scroll_easing(),
            exit_after_finish_ms: 0,
            heading: default_heading(),
        }
    }
}

/// Where the step script comes from
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScriptConfig {
    /// Script file (.toml, .yaml, .json); the built-in script when unset
    #[serde(default)]
    pub path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file in TUI mode (false = stderr for debugging)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,

    /// Directory for TUI log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

fn default_log_dir() -> String {
    ".research-loader/logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
            dir: default_log_dir(),
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(".research-loader/config.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so the loader runs without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/research-loader/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("research-loader").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables, e.g. RESEARCH_LOADER__TIMING__STEP_DURATION_MS
        builder = builder.add_source(
            config::Environment::with_prefix("RESEARCH_LOADER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        let config: Config = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Reject misconfigured timing up front rather than at mount
        config.timing.to_timing()?;
        Ok(config)
    }

    /// Save config to the project-local config file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::local_config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(&config_path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Get absolute path to the logs directory
    pub fn logs_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.logging.dir);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Load the configured script, or the built-in one.
    /// `override_path` (from the command line) wins over the config file.
    pub fn load_script(&self, override_path: Option<&str>) -> Result<Script> {
        match override_path.or(self.script.path.as_deref()) {
            Some(path) => Script::load(&PathBuf::from(path)),
            None => Ok(Script::builtin()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            ui: UiConfig::default(),
            script: ScriptConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

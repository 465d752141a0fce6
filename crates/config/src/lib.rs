//! Configuration loading, validation, and management for chatsieve.
//!
//! Loads configuration from `~/.chatsieve/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.chatsieve/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Rule thresholds and toggles
    #[serde(default)]
    pub filter: FilterConfig,

    /// Queue and processing loop settings
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Thresholds for the rule chain.
///
/// Every value is read once when the classifier is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Skip replies entirely
    #[serde(default = "default_true")]
    pub ignore_replies: bool,

    #[serde(default = "default_max_emotes")]
    pub max_emotes: usize,

    /// Fraction of tokens that may be emotes before the message is flagged
    #[serde(default = "default_density_threshold")]
    pub emote_density_threshold: f64,

    #[serde(default = "default_max_same_emote_run")]
    pub max_same_emote_run: usize,

    #[serde(default = "default_true")]
    pub block_all_caps: bool,

    #[serde(default = "default_true")]
    pub block_char_repetition: bool,

    #[serde(default = "default_max_char_repetition")]
    pub max_char_repetition: usize,

    #[serde(default = "default_true")]
    pub block_ascii_art: bool,

    #[serde(default = "default_art_min_length")]
    pub art_min_length: usize,

    #[serde(default = "default_art_min_lines")]
    pub art_min_lines: usize,

    #[serde(default = "default_art_min_ratio")]
    pub art_min_ratio: f64,

    #[serde(default = "default_art_min_ratio_multiline")]
    pub art_min_ratio_multiline: f64,

    /// Per-sender repeat window
    #[serde(default = "default_per_user_window_secs")]
    pub per_user_window_secs: u64,

    /// Shortest cleaned text the repeat rules consider
    #[serde(default = "default_text_min_length")]
    pub text_min_length: usize,

    #[serde(default = "default_repeat_threshold")]
    pub exact_repeat_threshold: usize,

    #[serde(default = "default_repeat_threshold")]
    pub similar_repeat_threshold: usize,

    /// Dice score at which two cleaned texts count as the same message
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Raw length below which two messages are never similar
    #[serde(default = "default_similarity_min_length")]
    pub similarity_min_length: usize,

    /// Cross-sender duplicate window
    #[serde(default = "default_copy_paste_window_secs")]
    pub copy_paste_window_secs: u64,

    #[serde(default = "default_copy_paste_min_length")]
    pub copy_paste_min_length: usize,

    /// Cross-sender emote-signature window
    #[serde(default = "default_train_window_secs")]
    pub train_window_secs: u64,

    #[serde(default = "default_train_threshold")]
    pub train_threshold: usize,
}

fn default_true() -> bool {
    true
}
fn default_max_emotes() -> usize {
    6
}
fn default_density_threshold() -> f64 {
    0.6
}
fn default_max_same_emote_run() -> usize {
    3
}
fn default_max_char_repetition() -> usize {
    4
}
fn default_art_min_length() -> usize {
    20
}
fn default_art_min_lines() -> usize {
    2
}
fn default_art_min_ratio() -> f64 {
    0.35
}
fn default_art_min_ratio_multiline() -> f64 {
    0.2
}
fn default_per_user_window_secs() -> u64 {
    60
}
fn default_text_min_length() -> usize {
    6
}
fn default_repeat_threshold() -> usize {
    3
}
fn default_similarity_threshold() -> f64 {
    0.85
}
fn default_similarity_min_length() -> usize {
    6
}
fn default_copy_paste_window_secs() -> u64 {
    8
}
fn default_copy_paste_min_length() -> usize {
    6
}
fn default_train_window_secs() -> u64 {
    10
}
fn default_train_threshold() -> usize {
    3
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            ignore_replies: true,
            max_emotes: default_max_emotes(),
            emote_density_threshold: default_density_threshold(),
            max_same_emote_run: default_max_same_emote_run(),
            block_all_caps: true,
            block_char_repetition: true,
            max_char_repetition: default_max_char_repetition(),
            block_ascii_art: true,
            art_min_length: default_art_min_length(),
            art_min_lines: default_art_min_lines(),
            art_min_ratio: default_art_min_ratio(),
            art_min_ratio_multiline: default_art_min_ratio_multiline(),
            per_user_window_secs: default_per_user_window_secs(),
            text_min_length: default_text_min_length(),
            exact_repeat_threshold: default_repeat_threshold(),
            similar_repeat_threshold: default_repeat_threshold(),
            similarity_threshold: default_similarity_threshold(),
            similarity_min_length: default_similarity_min_length(),
            copy_paste_window_secs: default_copy_paste_window_secs(),
            copy_paste_min_length: default_copy_paste_min_length(),
            train_window_secs: default_train_window_secs(),
            train_threshold: default_train_threshold(),
        }
    }
}

impl FilterConfig {
    pub fn per_user_window(&self) -> Duration {
        Duration::from_secs(self.per_user_window_secs)
    }

    pub fn copy_paste_window(&self) -> Duration {
        Duration::from_secs(self.copy_paste_window_secs)
    }

    pub fn train_window(&self) -> Duration {
        Duration::from_secs(self.train_window_secs)
    }

    /// Validate thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratios = [
            ("emote_density_threshold", self.emote_density_threshold),
            ("art_min_ratio", self.art_min_ratio),
            ("art_min_ratio_multiline", self.art_min_ratio_multiline),
            ("similarity_threshold", self.similarity_threshold),
        ];
        for (name, value) in ratios {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::ValidationError(format!(
                    "filter.{name} must be in (0.0, 1.0], got {value}"
                )));
            }
        }

        let windows = [
            ("per_user_window_secs", self.per_user_window_secs),
            ("copy_paste_window_secs", self.copy_paste_window_secs),
            ("train_window_secs", self.train_window_secs),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "filter.{name} must be > 0"
                )));
            }
        }

        let counts = [
            ("exact_repeat_threshold", self.exact_repeat_threshold),
            ("similar_repeat_threshold", self.similar_repeat_threshold),
            ("train_threshold", self.train_threshold),
            ("art_min_lines", self.art_min_lines),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "filter.{name} must be > 0"
                )));
            }
        }

        Ok(())
    }
}

/// Settings for the batching processing loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Maximum events classified per scheduling tick
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between ticks while the queue is non-empty
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Buffer between event sources and the processing loop
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Sender IDs that are never classified, on top of host exemptions
    #[serde(default)]
    pub exempt_senders: Vec<String>,
}

fn default_batch_size() -> usize {
    25
}
fn default_tick_interval_ms() -> u64 {
    10
}
fn default_channel_capacity() -> usize {
    256
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            tick_interval_ms: default_tick_interval_ms(),
            channel_capacity: default_channel_capacity(),
            exempt_senders: vec![],
        }
    }
}

impl IngestConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.chatsieve/config.toml).
    ///
    /// Environment overrides:
    /// - `CHATSIEVE_BATCH_SIZE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(raw) = std::env::var("CHATSIEVE_BATCH_SIZE") {
            self.ingest.batch_size = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "CHATSIEVE_BATCH_SIZE must be a positive integer, got '{raw}'"
                ))
            })?;
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".chatsieve")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.filter.validate()?;

        if self.ingest.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.batch_size must be > 0".into(),
            ));
        }
        if self.ingest.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.channel_capacity must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

//! Configuration management.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `FEEDGC_*` environment variables, then CLI flags.

use crate::gc::{ContentGcConfig, DEFAULT_MAXIMUM_GC_ATTEMPTS, DISMISS_ACTION_JOURNAL};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "FEEDGC_DATA_DIR";

/// Environment variable overriding the deferral budget.
pub const MAXIMUM_GC_ATTEMPTS_ENV: &str = "FEEDGC_MAXIMUM_GC_ATTEMPTS";

/// Environment variable overriding shared-state retention.
pub const KEEP_SHARED_STATES_ENV: &str = "FEEDGC_KEEP_SHARED_STATES";

/// Main configuration for feedgc.
#[derive(Debug, Clone)]
pub struct FeedGcConfig {
    /// Directory holding `content.json` and `journals/`.
    pub data_dir: PathBuf,
    /// Garbage collection settings.
    pub gc: GcSettings,
    /// Logging settings from the config file.
    pub logging: Option<LoggingSettings>,
}

/// Garbage collection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcSettings {
    /// Deferrals tolerated before content GC is forced.
    pub maximum_gc_attempts: u32,
    /// Keep every shared-state entry.
    pub keep_shared_states: bool,
    /// Journal holding dismiss actions.
    pub dismiss_journal: String,
}

impl Default for GcSettings {
    fn default() -> Self {
        Self {
            maximum_gc_attempts: DEFAULT_MAXIMUM_GC_ATTEMPTS,
            keep_shared_states: false,
            dismiss_journal: DISMISS_ACTION_JOURNAL.to_string(),
        }
    }
}

/// Logging settings as written in the config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `feedgc=debug`.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<PathBuf>,
}

/// Configuration file structure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// `[gc]` section.
    pub gc: Option<ConfigFileGc>,
    /// `[logging]` section.
    pub logging: Option<LoggingSettings>,
}

/// `[gc]` section of the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFileGc {
    /// Deferral budget.
    pub maximum_gc_attempts: Option<u32>,
    /// Shared-state retention.
    pub keep_shared_states: Option<bool>,
    /// Dismiss journal name.
    pub dismiss_journal: Option<String>,
}

impl Default for FeedGcConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".feedgc"),
            gc: GcSettings::default(),
            logging: None,
        }
    }
}

impl FeedGcConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Self::from_toml_str(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for [`ConfigFile`].
    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir, then `~/.config/feedgc/config.toml`.
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("feedgc").join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config;
            }
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("feedgc")
            .join("config.toml");
        if xdg_config.exists() {
            if let Ok(config) = Self::load_from_file(&xdg_config) {
                return config;
            }
        }

        Self::default()
    }

    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = expand_tilde(&data_dir);
        }

        if let Some(gc) = file.gc {
            if let Some(attempts) = gc.maximum_gc_attempts {
                config.gc.maximum_gc_attempts = attempts;
            }
            if let Some(keep) = gc.keep_shared_states {
                config.gc.keep_shared_states = keep;
            }
            if let Some(journal) = gc.dismiss_journal {
                config.gc.dismiss_journal = journal;
            }
        }

        config.logging = file.logging;
        config
    }

    /// Applies `FEEDGC_*` environment overrides.
    ///
    /// Unparseable values are ignored with a warning.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides looked up by variable name.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(DATA_DIR_ENV) {
            self.data_dir = expand_tilde(&dir);
        }

        if let Some(value) = lookup(MAXIMUM_GC_ATTEMPTS_ENV) {
            match value.trim().parse::<u32>() {
                Ok(attempts) => self.gc.maximum_gc_attempts = attempts,
                Err(_) => tracing::warn!(
                    variable = MAXIMUM_GC_ATTEMPTS_ENV,
                    value = %value,
                    "Ignoring unparseable environment override"
                ),
            }
        }

        if let Some(value) = lookup(KEEP_SHARED_STATES_ENV) {
            match parse_bool(&value) {
                Some(keep) => self.gc.keep_shared_states = keep,
                None => tracing::warn!(
                    variable = KEEP_SHARED_STATES_ENV,
                    value = %value,
                    "Ignoring unparseable environment override"
                ),
            }
        }

        self
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the deferral budget.
    #[must_use]
    pub const fn with_maximum_gc_attempts(mut self, attempts: u32) -> Self {
        self.gc.maximum_gc_attempts = attempts;
        self
    }

    /// Sets shared-state retention.
    #[must_use]
    pub const fn with_keep_shared_states(mut self, keep: bool) -> Self {
        self.gc.keep_shared_states = keep;
        self
    }

    /// Returns the content GC configuration.
    #[must_use]
    pub fn content_gc_config(&self) -> ContentGcConfig {
        ContentGcConfig::new()
            .with_maximum_gc_attempts(self.gc.maximum_gc_attempts)
            .with_keep_shared_states(self.gc.keep_shared_states)
    }
}

/// Parses a boolean flag value.
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`, case-insensitive.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Expands a leading `~/` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(base_dirs) = directories::BaseDirs::new() {
            return base_dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

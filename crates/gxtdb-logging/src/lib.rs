//! Logging configuration and subscriber setup for gxtdb.
//!
//! Library crates emit `tracing` events. The binary calls [`init`] once with a
//! [`LoggingConfig`] assembled from the config file and `-v`/`-q` flags.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Log level for filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// `-q` wins over `-v`; neither keeps `configured`.
    pub fn from_flags(configured: LogLevel, verbose: bool, quiet: bool) -> LogLevel {
        if quiet {
            LogLevel::Error
        } else if verbose {
            LogLevel::Debug
        } else {
            configured
        }
    }

    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level to output
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// Enable colors (for terminal output)
    #[serde(default = "default_true")]
    pub colors: bool,
    /// Per-target overrides, keyed by tracing target (e.g. `gxtdb_store`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub component_levels: BTreeMap<String, LogLevel>,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Plain,
            timestamps: true,
            colors: true,
            component_levels: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_component_level(mut self, component: impl Into<String>, level: LogLevel) -> Self {
        self.component_levels.insert(component.into(), level);
        self
    }

    /// The target filter this configuration describes.
    pub fn targets(&self) -> Targets {
        self.component_levels.iter().fold(
            Targets::new().with_default(self.level.to_filter()),
            |targets, (component, level)| targets.with_target(component.clone(), level.to_filter()),
        )
    }
}

/// Install a stderr subscriber for `config`.
///
/// Fails if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let targets = config.targets();
    let base = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.colors)
        .with_target(false);

    let layer = match (config.format, config.timestamps) {
        (LogFormat::Json, _) => base.json().with_filter(targets).boxed(),
        (LogFormat::Compact, true) => base.compact().with_filter(targets).boxed(),
        (LogFormat::Compact, false) => base.compact().without_time().with_filter(targets).boxed(),
        (LogFormat::Plain, true) => base.with_filter(targets).boxed(),
        (LogFormat::Plain, false) => base.without_time().with_filter(targets).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}

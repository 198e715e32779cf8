//! Layered configuration.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. `.env` in the working directory, if present
//! 4. Environment variables such as `FINEPRINT__DETECTION__CONTEXT_LINES=5`
//!
//! The loaded value is validated before it is returned.

use config::{Config, Environment, File};
use fineprint_core::errors::FinePrintError;
use fineprint_core::snapshot::MAX_GRACE_DAYS;
use fineprint_core::strip::{WAYBACK_BEGIN_MARKER, WAYBACK_END_MARKER};
use fineprint_core_types::Sensitive;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "FINEPRINT";
/// Separator between the prefix and nested keys
pub const ENV_SEPARATOR: &str = "__";

type Result<T> = std::result::Result<T, FinePrintError>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FinePrintConfig {
    pub detection: DetectionConfig,
    pub archive: ArchiveConfig,
    pub directory: DirectoryConfig,
    pub http: HttpConfig,
    pub limits: LimitsConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum age of a capture, relative to the notice date
    pub grace_period_days: i64,
    /// Unchanged lines shown around each change
    pub context_lines: usize,
    pub strip_begin_marker: String,
    pub strip_end_marker: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            grace_period_days: fineprint_core::snapshot::DEFAULT_GRACE_DAYS,
            context_lines: 20,
            strip_begin_marker: WAYBACK_BEGIN_MARKER.to_string(),
            strip_end_marker: WAYBACK_END_MARKER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub base_url: String,
    /// Negative values ask for the most recent `|n|` captures
    pub listing_limit: i32,
    pub access_key: Sensitive<String>,
    pub secret_key: Sensitive<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://web.archive.org".to_string(),
            listing_limit: -10,
            access_key: Sensitive::default(),
            secret_key: Sensitive::default(),
        }
    }
}

/// Policy directory consulted when a notice carries no usable URL
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub enabled: bool,
    pub base_url: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.tosdr.org".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            user_agent: format!("fineprint/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// A `(limit, window)` budget for one class of limiter keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateBudget {
    pub limit: usize,
    pub window_secs: u64,
}

impl RateBudget {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub per_user: RateBudget,
    pub global: RateBudget,
    pub sweep_interval_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            per_user: RateBudget {
                limit: 10,
                window_secs: 3600,
            },
            global: RateBudget {
                limit: 500,
                window_secs: 3600,
            },
            sweep_interval_secs: 300,
        }
    }
}

impl LimitsConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub max_input_bytes: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: fineprint_core::truncate::DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl FinePrintConfig {
    /// Load from `.env` and the process environment only
    ///
    /// # Errors
    ///
    /// `Config` if a value cannot be parsed or fails validation.
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Reject values that would make the pipeline misbehave
    ///
    /// # Errors
    ///
    /// `Config` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(FinePrintError::Config {
                reason: reason.to_string(),
            })
        };

        if self.detection.grace_period_days < 0 {
            return invalid("detection.grace_period_days must not be negative");
        }
        if self.detection.grace_period_days > MAX_GRACE_DAYS {
            return Err(FinePrintError::Config {
                reason: format!("detection.grace_period_days must not exceed {MAX_GRACE_DAYS}"),
            });
        }
        if self.detection.strip_begin_marker.is_empty() || self.detection.strip_end_marker.is_empty() {
            return invalid("detection strip markers must not be empty");
        }
        if url::Url::parse(&self.archive.base_url).is_err() {
            return invalid("archive.base_url is not a valid URL");
        }
        if self.directory.enabled && url::Url::parse(&self.directory.base_url).is_err() {
            return invalid("directory.base_url is not a valid URL");
        }
        if self.archive.listing_limit == 0 {
            return invalid("archive.listing_limit must not be zero");
        }
        if self.http.timeout_secs == 0 {
            return invalid("http.timeout_secs must be positive");
        }
        for (name, budget) in [("limits.per_user", self.limits.per_user), ("limits.global", self.limits.global)] {
            if budget.limit == 0 || budget.window_secs == 0 {
                return Err(FinePrintError::Config {
                    reason: format!("{name} needs a positive limit and window"),
                });
            }
        }
        if self.limits.sweep_interval_secs == 0 {
            return invalid("limits.sweep_interval_secs must be positive");
        }
        if self.analysis.max_input_bytes == 0 {
            return invalid("analysis.max_input_bytes must be positive");
        }
        Ok(())
    }
}

/// Builder over the configuration sources
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_override: Option<HashMap<String, String>>,
    skip_dotenv: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this TOML file between the defaults and the environment
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use `vars` instead of the process environment, and skip `.env`
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env_override = Some(vars);
        self.skip_dotenv = true;
        self
    }

    /// # Errors
    ///
    /// `Config` if the file is missing or unreadable, a value has the wrong
    /// type, or validation fails.
    pub fn load(&self) -> Result<FinePrintConfig> {
        if !self.skip_dotenv {
            // A missing .env is the normal case.
            let _ = dotenvy::dotenv();
        }

        let mut builder = budget_defaults(Config::builder()).map_err(config_error)?;

        if let Some(path) = &self.config_path {
            builder = builder.add_source(File::from(path.as_path()).required(true));
            tracing::debug!(path = %path.display(), "loading configuration file");
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(self.env_override.clone()),
        );

        let config: FinePrintConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(config_error)?;

        config.validate()?;
        Ok(config)
    }
}

/// Budgets are nested tables; seed each field so a partial override such as
/// `limits.global.limit` keeps the default window.
fn budget_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> std::result::Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    let defaults = LimitsConfig::default();
    builder
        .set_default("limits.per_user.limit", defaults.per_user.limit as u64)?
        .set_default("limits.per_user.window_secs", defaults.per_user.window_secs)?
        .set_default("limits.global.limit", defaults.global.limit as u64)?
        .set_default("limits.global.window_secs", defaults.global.window_secs)
}

fn config_error(e: config::ConfigError) -> FinePrintError {
    FinePrintError::Config {
        reason: e.to_string(),
    }
}

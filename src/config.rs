use crate::core::MatcherSettings;
use crate::models::MatchingWeights;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
            max_concurrency: default_max_concurrency(),
            default_limit: default_limit(),
        }
    }
}

fn default_call_timeout_ms() -> u64 { 2000 }
fn default_max_concurrency() -> usize { 8 }
fn default_limit() -> usize { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_capacity")]
    pub capacity: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            capacity: default_cache_capacity(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_cache_enabled() -> bool { true }
fn default_cache_capacity() -> u64 { 10_000 }
fn default_cache_ttl_secs() -> u64 { 300 }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    /// Fixed weights for every client; the contextual presets apply when unset
    #[serde(default)]
    pub weights: Option<WeightsConfig>,
}

/// Weight override as written in config files
///
/// Field names are snake_case because config keys are case-insensitive.
/// Missing fields fall back to the default preset.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WeightsConfig {
    pub condition_match: Option<f64>,
    pub approach_compatibility: Option<f64>,
    pub experience_and_success: Option<f64>,
    pub reviews_and_ratings: Option<f64>,
    pub availability_and_logistics: Option<f64>,
    pub engagement_compatibility: Option<f64>,
    pub performance_match: Option<f64>,
    pub preference_match: Option<f64>,
}

impl From<WeightsConfig> for MatchingWeights {
    fn from(config: WeightsConfig) -> Self {
        let defaults = MatchingWeights::default();
        Self {
            condition_match: config.condition_match.unwrap_or(defaults.condition_match),
            approach_compatibility: config
                .approach_compatibility
                .unwrap_or(defaults.approach_compatibility),
            experience_and_success: config
                .experience_and_success
                .unwrap_or(defaults.experience_and_success),
            reviews_and_ratings: config.reviews_and_ratings.unwrap_or(defaults.reviews_and_ratings),
            availability_and_logistics: config
                .availability_and_logistics
                .unwrap_or(defaults.availability_and_logistics),
            engagement_compatibility: config
                .engagement_compatibility
                .unwrap_or(defaults.engagement_compatibility),
            performance_match: config.performance_match.unwrap_or(defaults.performance_match),
            preference_match: config.preference_match.unwrap_or(defaults.preference_match),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with TMATCH)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., TMATCH__MATCHING__CALL_TIMEOUT_MS -> matching.call_timeout_ms
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Runtime settings for the matcher
    pub fn matcher_settings(&self) -> MatcherSettings {
        MatcherSettings {
            call_timeout: Duration::from_millis(self.matching.call_timeout_ms),
            max_concurrency: self.matching.max_concurrency.max(1),
            default_limit: self.matching.default_limit,
            weights: self.scoring.weights.map(MatchingWeights::from),
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix("TMATCH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

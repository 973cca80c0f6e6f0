//! Configuration management for the RegPortal Engine
//!
//! Provides strongly-typed configuration with validation, environment variable parsing,
//! and sensible defaults.
//!
//! # Example
//! ```no_run
//! use regportal::Config;
//! let config = Config::from_env().expect("failed to load config");
//! println!("Data dir: {}", config.data.dir.display());
//! ```

use crate::error::{Error, Result};
use crate::recommendation::{DecayPolicy, ScoringWeights};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Longest trending cache lifetime accepted (one week)
const MAX_TRENDING_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,
    /// Snapshot source configuration
    pub data: DataConfig,
    /// Recommendation scoring configuration
    pub recommendation: RecommendationConfig,
    /// Trending ranker configuration
    pub trending: TrendingConfig,
    /// Prometheus exporter port (only used with the `prometheus` feature)
    pub metrics_port: u16,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Port to listen on
    pub port: u16,
    /// Host to bind to
    pub host: String,
    /// Request timeout
    pub request_timeout: Duration,
    /// Enable CORS
    pub cors_enabled: bool,
    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

/// Where the event and registration snapshot is read from
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub events_file: String,
    pub registrations_file: String,
    /// How often the snapshot is reloaded
    pub refresh_interval: Duration,
}

/// Recommendation scoring configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationConfig {
    pub sport_match_bonus: f64,
    pub max_affinity_bonus: f64,
    pub category_bonus: f64,
    pub upcoming_bonus: f64,
}

/// Trending ranker configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TrendingConfig {
    /// Registrations this recent count fully
    pub window_days: i64,
    /// Registrations this old count for nothing
    pub cutoff_days: i64,
    /// How long computed trending lists are served from cache
    pub cache_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Prefer loading env from a directory of files (FFOLDER) for platforms that mount
        // secrets as files. Each file name is the env var name and its contents the value.
        if let Ok(folder) = std::env::var("FFOLDER") {
            load_env_folder(&folder);
        } else {
            // Try to load .env file (ignore if not found)
            dotenvy::dotenv().ok();
        }

        let config = Self {
            api: ApiConfig::from_env()?,
            data: DataConfig::from_env()?,
            recommendation: RecommendationConfig::from_env()?,
            trending: TrendingConfig::from_env()?,
            metrics_port: get_env_parsed_or("METRICS_PORT", 9000)?,
        };

        config.validate()?;
        config.log_summary();

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.recommendation.validate()?;
        self.trending.decay_policy()?;

        if self.trending.cache_ttl > MAX_TRENDING_CACHE_TTL {
            return Err(Error::InvalidConfig {
                key: "TRENDING_CACHE_TTL_SECS",
                message: format!(
                    "cache TTL must be at most {} seconds",
                    MAX_TRENDING_CACHE_TTL.as_secs()
                )
                .into(),
            });
        }

        if self.data.refresh_interval.is_zero() {
            return Err(Error::InvalidConfig {
                key: "DATA_REFRESH_SECS",
                message: "refresh interval must be positive".into(),
            });
        }

        if self.api.cors_enabled && self.api.cors_origins.is_empty() {
            return Err(Error::InvalidConfig {
                key: "API_CORS_ORIGINS",
                message: "CORS is enabled but no origins are allowed".into(),
            });
        }

        Ok(())
    }

    /// Log configuration summary
    fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  API:");
        info!("    Listening on: {}:{}", self.api.host, self.api.port);
        info!("    CORS: {}", self.api.cors_enabled);
        info!("  Data:");
        info!("    Directory: {}", self.data.dir.display());
        info!("    Refresh Interval: {:?}", self.data.refresh_interval);
        info!("  Recommendation:");
        info!(
            "    Sport Bonus: {} (cap {}), Category Bonus: {}, Upcoming Bonus: {}",
            self.recommendation.sport_match_bonus,
            self.recommendation.max_affinity_bonus,
            self.recommendation.category_bonus,
            self.recommendation.upcoming_bonus
        );
        info!("  Trending:");
        info!(
            "    Window: {}d, Cutoff: {}d, Cache TTL: {:?}",
            self.trending.window_days, self.trending.cutoff_days, self.trending.cache_ttl
        );
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            port: get_env_parsed_or("API_PORT", 8080)?,
            host: get_env_or("API_HOST", "0.0.0.0"),
            request_timeout: Duration::from_secs(get_env_parsed_or(
                "API_REQUEST_TIMEOUT_SECS",
                30,
            )?),
            cors_enabled: get_env_parsed_or("API_CORS_ENABLED", true)?,
            cors_origins: get_env_or("API_CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            request_timeout: Duration::from_secs(30),
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl DataConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            dir: PathBuf::from(get_env_or("DATA_DIR", "./data")),
            events_file: get_env_or("EVENTS_FILE", "events.json"),
            registrations_file: get_env_or("REGISTRATIONS_FILE", "registrations.json"),
            refresh_interval: Duration::from_secs(get_env_parsed_or("DATA_REFRESH_SECS", 300)?),
        })
    }

    /// Data directory with default file names
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            events_file: "events.json".to_string(),
            registrations_file: "registrations.json".to_string(),
            refresh_interval: Duration::from_secs(300),
        }
    }

    pub fn events_path(&self) -> PathBuf {
        self.dir.join(&self.events_file)
    }

    pub fn registrations_path(&self) -> PathBuf {
        self.dir.join(&self.registrations_file)
    }
}

impl RecommendationConfig {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            sport_match_bonus: get_env_parsed_or("REC_SPORT_MATCH_BONUS", defaults.sport_match_bonus)?,
            max_affinity_bonus: get_env_parsed_or(
                "REC_MAX_AFFINITY_BONUS",
                defaults.max_affinity_bonus,
            )?,
            category_bonus: get_env_parsed_or("REC_CATEGORY_BONUS", defaults.category_bonus)?,
            upcoming_bonus: get_env_parsed_or("REC_UPCOMING_BONUS", defaults.upcoming_bonus)?,
        })
    }

    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("REC_SPORT_MATCH_BONUS", self.sport_match_bonus),
            ("REC_MAX_AFFINITY_BONUS", self.max_affinity_bonus),
            ("REC_CATEGORY_BONUS", self.category_bonus),
            ("REC_UPCOMING_BONUS", self.upcoming_bonus),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig {
                    key,
                    message: format!("bonus must be a non-negative number, got {}", value).into(),
                });
            }
        }

        if self.max_affinity_bonus < self.sport_match_bonus {
            return Err(Error::InvalidConfig {
                key: "REC_MAX_AFFINITY_BONUS",
                message: "cap must be at least one sport match bonus".into(),
            });
        }

        Ok(())
    }

    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights {
            baseline: 0.0,
            sport_match: self.sport_match_bonus,
            max_affinity: self.max_affinity_bonus,
            category_match: self.category_bonus,
            upcoming: self.upcoming_bonus,
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        let weights = ScoringWeights::default();
        Self {
            sport_match_bonus: weights.sport_match,
            max_affinity_bonus: weights.max_affinity,
            category_bonus: weights.category_match,
            upcoming_bonus: weights.upcoming,
        }
    }
}

impl TrendingConfig {
    fn from_env() -> Result<Self> {
        Ok(Self {
            window_days: get_env_parsed_or("TRENDING_WINDOW_DAYS", 30)?,
            cutoff_days: get_env_parsed_or("TRENDING_CUTOFF_DAYS", 60)?,
            cache_ttl: Duration::from_secs(get_env_parsed_or("TRENDING_CACHE_TTL_SECS", 3600)?),
        })
    }

    pub fn decay_policy(&self) -> Result<DecayPolicy> {
        DecayPolicy::from_days(self.window_days, self.cutoff_days)
    }

    /// Advisory cache directive echoed to trending clients
    pub fn cache_control(&self) -> String {
        format!("max-age={}", self.cache_ttl.as_secs())
    }
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            cutoff_days: 60,
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Export every file in `folder` as an env var unless it is already set
fn load_env_folder(folder: &str) {
    let path = std::path::Path::new(folder);
    if !path.is_dir() {
        warn!("FFOLDER {} is not a directory", folder);
        return;
    }

    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Failed to read FFOLDER {}: {}", folder, err);
            return;
        }
    };

    for entry in entries.flatten() {
        let file_path = entry.path();
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !file_path.is_file() || std::env::var(&name).is_ok() {
            continue;
        }
        if let Ok(contents) = std::fs::read_to_string(&file_path) {
            std::env::set_var(&name, contents.trim());
        }
    }
    info!("Loaded configuration from FFOLDER={}", folder);
}

/// Get environment variable with default
fn get_env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
/// A set but unparsable value is a configuration error, not a silent default.
fn get_env_parsed_or<T>(key: &'static str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e: T::Err| Error::InvalidConfig {
            key,
            message: format!("Invalid value '{}': {}", value, e).into(),
        }),
        Err(_) => Ok(default),
    }
}
